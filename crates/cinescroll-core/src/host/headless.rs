//! In-memory host for tests, simulations and server-side use
//!
//! Keeps a flat element table with parent links, counts live listeners and
//! capability loads, and records inline styles so callers can observe what
//! the animation triggers wrote.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use super::{
    Capability, ElementId, Host, ListenerId, ListenerKind, Rect, ScrollPosition, Size, StyleWrite,
};
use crate::{Error, Result};

/// Inline style state of one element
#[derive(Debug, Clone, PartialEq)]
pub struct ElementStyle {
    pub translate_x: f64,
    pub translate_y: f64,
    pub opacity: f64,
    pub properties: BTreeMap<String, f64>,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            opacity: 1.0,
            properties: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    parent: Option<ElementId>,
    rect: Rect,
}

#[derive(Debug, Default)]
struct HeadlessState {
    viewport: Size,
    content: Size,
    reduced_motion: bool,
    coarse_pointer: bool,
    nodes: HashMap<ElementId, Node>,
    next_element: u64,
    listeners: HashMap<ListenerId, ListenerKind>,
    next_listener: u64,
    styles: HashMap<ElementId, ElementStyle>,
    scroll: ScrollPosition,
    loads: HashMap<Capability, u32>,
    unavailable: HashSet<Capability>,
}

/// A document that lives entirely in memory
#[derive(Debug)]
pub struct HeadlessHost {
    state: Mutex<HeadlessState>,
    /// `true` while capability loads may complete
    gate: watch::Sender<bool>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new(Size::new(1280.0, 800.0), Size::new(1280.0, 4000.0))
    }
}

impl HeadlessHost {
    /// Create a host with a viewport and a scrollable content size
    pub fn new(viewport: Size, content: Size) -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            state: Mutex::new(HeadlessState {
                viewport,
                content,
                ..Default::default()
            }),
            gate,
        }
    }

    /// Report a reduced-motion preference
    pub fn with_reduced_motion(self, reduced: bool) -> Self {
        self.lock().reduced_motion = reduced;
        self
    }

    /// Report a coarse (touch) primary pointer
    pub fn with_coarse_pointer(self, coarse: bool) -> Self {
        self.lock().coarse_pointer = coarse;
        self
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an element under `parent` (or at the root)
    pub fn add_element(&self, parent: Option<ElementId>, rect: Rect) -> ElementId {
        let mut state = self.lock();
        state.next_element += 1;
        let id = ElementId(state.next_element);
        state.nodes.insert(id, Node { parent, rect });
        id
    }

    /// Move or resize an element
    pub fn set_element_rect(&self, element: ElementId, rect: Rect) {
        if let Some(node) = self.lock().nodes.get_mut(&element) {
            node.rect = rect;
        }
    }

    /// Resize the viewport
    pub fn set_viewport(&self, viewport: Size) {
        self.lock().viewport = viewport;
    }

    /// Resize the scrollable content
    pub fn set_content_size(&self, content: Size) {
        self.lock().content = content;
    }

    /// Make every future load of `capability` fail
    pub fn make_unavailable(&self, capability: Capability) {
        self.lock().unavailable.insert(capability);
    }

    /// Suspend capability loads until [`HeadlessHost::release_loads`]
    pub fn hold_loads(&self) {
        self.gate.send_replace(false);
    }

    /// Let suspended capability loads complete
    pub fn release_loads(&self) {
        self.gate.send_replace(true);
    }

    /// How many times a capability load was started
    pub fn capability_loads(&self, capability: Capability) -> u32 {
        self.lock().loads.get(&capability).copied().unwrap_or(0)
    }

    /// Number of currently attached listeners
    pub fn live_listeners(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Inline style of an element (defaults when nothing was written)
    pub fn style(&self, element: ElementId) -> ElementStyle {
        self.lock().styles.get(&element).cloned().unwrap_or_default()
    }

    /// Whether the core has written any inline style to an element
    pub fn has_inline_style(&self, element: ElementId) -> bool {
        self.lock().styles.contains_key(&element)
    }
}

#[async_trait::async_trait]
impl Host for HeadlessHost {
    fn prefers_reduced_motion(&self) -> bool {
        self.lock().reduced_motion
    }

    fn coarse_pointer(&self) -> bool {
        self.lock().coarse_pointer
    }

    fn viewport(&self) -> Size {
        self.lock().viewport
    }

    fn content_size(&self) -> Size {
        self.lock().content
    }

    fn parent_of(&self, element: ElementId) -> Option<ElementId> {
        self.lock().nodes.get(&element).and_then(|n| n.parent)
    }

    fn element_rect(&self, element: ElementId) -> Option<Rect> {
        self.lock().nodes.get(&element).map(|n| n.rect)
    }

    fn attach_listener(&self, kind: ListenerKind) -> ListenerId {
        let mut state = self.lock();
        state.next_listener += 1;
        let id = ListenerId(state.next_listener);
        state.listeners.insert(id, kind);
        id
    }

    fn detach_listener(&self, id: ListenerId) {
        self.lock().listeners.remove(&id);
    }

    fn write_style(&self, element: ElementId, write: StyleWrite) {
        let mut state = self.lock();
        let style = state.styles.entry(element).or_default();
        match write {
            StyleWrite::Translate { x, y } => {
                style.translate_x = x;
                style.translate_y = y;
            }
            StyleWrite::Opacity(opacity) => style.opacity = opacity,
            StyleWrite::Property { name, value } => {
                style.properties.insert(name, value);
            }
        }
    }

    fn reset_style(&self, element: ElementId) {
        self.lock().styles.remove(&element);
    }

    fn scroll_position(&self) -> ScrollPosition {
        self.lock().scroll
    }

    fn set_scroll_position(&self, position: ScrollPosition) {
        self.lock().scroll = position;
    }

    async fn load_capability(&self, capability: Capability) -> Result<()> {
        *self.lock().loads.entry(capability).or_insert(0) += 1;

        let mut gate = self.gate.subscribe();
        gate.wait_for(|open| *open)
            .await
            .map_err(|e| Error::Other(format!("Capability gate closed: {}", e)))?;

        if self.lock().unavailable.contains(&capability) {
            return Err(Error::CapabilityUnavailable(capability));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_ancestry() {
        let host = HeadlessHost::default();
        let root = host.add_element(None, Rect::new(0.0, 0.0, 1280.0, 4000.0));
        let panel = host.add_element(Some(root), Rect::new(0.0, 100.0, 400.0, 300.0));
        assert_eq!(host.parent_of(panel), Some(root));
        assert_eq!(host.parent_of(root), None);
        assert_eq!(host.parent_of(ElementId(999)), None);
    }

    #[test]
    fn test_listener_bookkeeping() {
        let host = HeadlessHost::default();
        let a = host.attach_listener(ListenerKind::Wheel);
        let b = host.attach_listener(ListenerKind::Resize);
        assert_eq!(host.live_listeners(), 2);
        host.detach_listener(a);
        host.detach_listener(a);
        assert_eq!(host.live_listeners(), 1);
        host.detach_listener(b);
        assert_eq!(host.live_listeners(), 0);
    }

    #[test]
    fn test_style_writes_and_reset() {
        let host = HeadlessHost::default();
        let el = host.add_element(None, Rect::default());
        host.write_style(el, StyleWrite::Opacity(0.25));
        host.write_style(el, StyleWrite::Translate { x: 0.0, y: 12.0 });
        let style = host.style(el);
        assert_eq!(style.opacity, 0.25);
        assert_eq!(style.translate_y, 12.0);
        host.reset_style(el);
        assert!(!host.has_inline_style(el));
        assert_eq!(host.style(el), ElementStyle::default());
    }

    #[tokio::test]
    async fn test_unavailable_capability_fails_load() {
        let host = HeadlessHost::default();
        host.make_unavailable(Capability::ScrollTrigger);
        assert!(host.load_capability(Capability::SmoothScroll).await.is_ok());
        assert!(matches!(
            host.load_capability(Capability::ScrollTrigger).await,
            Err(Error::CapabilityUnavailable(Capability::ScrollTrigger))
        ));
        assert_eq!(host.capability_loads(Capability::ScrollTrigger), 1);
    }

    #[tokio::test]
    async fn test_held_loads_wait_for_release() {
        let host = std::sync::Arc::new(HeadlessHost::default());
        host.hold_loads();

        let pending = {
            let host = host.clone();
            tokio::spawn(async move { host.load_capability(Capability::SmoothScroll).await })
        };
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        host.release_loads();
        assert!(pending.await.unwrap().is_ok());
    }
}
