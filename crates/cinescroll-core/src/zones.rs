//! Nested scroll zones
//!
//! Regions registered here keep native scrolling on the listed axes; the
//! smooth-scroll engine asks [`ZoneRegistry::suspends`] for every input event.

use std::collections::HashMap;

use crate::config::Orientation;
use crate::host::{Axis, ElementId, Host};

/// Guard against malformed (cyclic) ancestry chains
const MAX_ANCESTRY_DEPTH: usize = 1024;

/// Identity of a registered zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(pub u64);

/// A region that scrolls natively along `directions`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone {
    pub element: ElementId,
    pub directions: Orientation,
}

/// Per-element reference counts, so overlapping zones form a union
#[derive(Debug, Clone, Copy, Default)]
struct AxisCounts {
    vertical: u32,
    horizontal: u32,
}

impl AxisCounts {
    fn add(&mut self, directions: Orientation) {
        if directions.covers(Axis::Vertical) {
            self.vertical += 1;
        }
        if directions.covers(Axis::Horizontal) {
            self.horizontal += 1;
        }
    }

    fn remove(&mut self, directions: Orientation) {
        if directions.covers(Axis::Vertical) {
            self.vertical = self.vertical.saturating_sub(1);
        }
        if directions.covers(Axis::Horizontal) {
            self.horizontal = self.horizontal.saturating_sub(1);
        }
    }

    fn covers(&self, axis: Axis) -> bool {
        match axis {
            Axis::Vertical => self.vertical > 0,
            Axis::Horizontal => self.horizontal > 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.vertical == 0 && self.horizontal == 0
    }
}

/// Registry of nested zones
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    zones: HashMap<ZoneId, Zone>,
    by_element: HashMap<ElementId, AxisCounts>,
    /// Never reset, so stale ids cannot alias zones of a later session
    next_id: u64,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zone and return its id
    pub fn register(&mut self, element: ElementId, directions: Orientation) -> ZoneId {
        self.next_id += 1;
        let id = ZoneId(self.next_id);
        self.zones.insert(
            id,
            Zone {
                element,
                directions,
            },
        );
        self.by_element.entry(element).or_default().add(directions);
        id
    }

    /// Remove a zone; returns false if it was not registered
    pub fn unregister(&mut self, id: ZoneId) -> bool {
        let Some(zone) = self.zones.remove(&id) else {
            return false;
        };
        if let Some(counts) = self.by_element.get_mut(&zone.element) {
            counts.remove(zone.directions);
            if counts.is_empty() {
                self.by_element.remove(&zone.element);
            }
        }
        true
    }

    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(&id)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Drop every zone
    pub fn clear(&mut self) {
        self.zones.clear();
        self.by_element.clear();
    }

    /// Whether `target` or one of its ancestors suspends smoothing on `axis`
    pub fn suspends(&self, target: ElementId, axis: Axis, host: &dyn Host) -> bool {
        if self.by_element.is_empty() {
            return false;
        }

        let mut current = Some(target);
        let mut depth = 0;
        while let Some(element) = current {
            if self
                .by_element
                .get(&element)
                .is_some_and(|counts| counts.covers(axis))
            {
                return true;
            }
            depth += 1;
            if depth >= MAX_ANCESTRY_DEPTH {
                tracing::warn!(?target, "Ancestry walk exceeded maximum depth");
                return false;
            }
            current = host.parent_of(element);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HeadlessHost, Rect};

    fn tree() -> (HeadlessHost, ElementId, ElementId, ElementId) {
        let host = HeadlessHost::default();
        let body = host.add_element(None, Rect::new(0.0, 0.0, 1280.0, 4000.0));
        let panel = host.add_element(Some(body), Rect::new(0.0, 200.0, 400.0, 300.0));
        let item = host.add_element(Some(panel), Rect::new(0.0, 220.0, 400.0, 40.0));
        (host, body, panel, item)
    }

    #[test]
    fn test_descendants_are_suspended() {
        let (host, body, panel, item) = tree();
        let mut zones = ZoneRegistry::new();
        zones.register(panel, Orientation::Vertical);

        assert!(zones.suspends(item, Axis::Vertical, &host));
        assert!(zones.suspends(panel, Axis::Vertical, &host));
        assert!(!zones.suspends(item, Axis::Horizontal, &host));
        assert!(!zones.suspends(body, Axis::Vertical, &host));
    }

    #[test]
    fn test_overlapping_zones_form_a_union() {
        let (host, _body, panel, item) = tree();
        let mut zones = ZoneRegistry::new();
        let vertical = zones.register(panel, Orientation::Vertical);
        let horizontal = zones.register(item, Orientation::Horizontal);

        assert!(zones.suspends(item, Axis::Vertical, &host));
        assert!(zones.suspends(item, Axis::Horizontal, &host));

        assert!(zones.unregister(vertical));
        assert!(!zones.suspends(item, Axis::Vertical, &host));
        assert!(zones.suspends(item, Axis::Horizontal, &host));

        assert!(zones.unregister(horizontal));
        assert!(!zones.unregister(horizontal));
        assert!(zones.is_empty());
    }

    #[test]
    fn test_duplicate_zone_on_same_element() {
        let (host, _body, panel, item) = tree();
        let mut zones = ZoneRegistry::new();
        let a = zones.register(panel, Orientation::Both);
        let b = zones.register(panel, Orientation::Vertical);
        assert_eq!(
            zones.get(b),
            Some(&Zone {
                element: panel,
                directions: Orientation::Vertical,
            })
        );

        zones.unregister(a);
        assert!(zones.get(a).is_none());
        // The remaining vertical zone still covers the panel
        assert!(zones.suspends(item, Axis::Vertical, &host));
        assert!(!zones.suspends(item, Axis::Horizontal, &host));
    }

    #[test]
    fn test_ids_are_not_reused_after_clear() {
        let (_host, body, _panel, _item) = tree();
        let mut zones = ZoneRegistry::new();
        let first = zones.register(body, Orientation::Both);
        zones.clear();
        let second = zones.register(body, Orientation::Both);
        assert_ne!(first, second);
        assert!(!zones.unregister(first));
        assert_eq!(zones.len(), 1);
    }
}
