//! The environment the orchestration core drives
//!
//! A [`Host`] is whatever owns the document: it answers the platform probes
//! read once by the resolver, reports element geometry and ancestry, takes
//! listener registrations and style writes, and may load engine capabilities
//! asynchronously. [`HeadlessHost`] is a complete in-memory implementation.

mod headless;

use std::fmt;

use crate::Result;

pub use headless::{ElementStyle, HeadlessHost};

/// Opaque identity of a document element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// Identity of an attached listener, used to detach it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Width/height pair in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Element box in document coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Scroll offset of the document
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollPosition {
    pub x: f64,
    pub y: f64,
}

/// A scroll axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Vertical,
    Horizontal,
}

/// Capabilities an engine needs loaded before it can be constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    SmoothScroll,
    ScrollTrigger,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::SmoothScroll => f.write_str("smooth-scroll"),
            Capability::ScrollTrigger => f.write_str("scroll-trigger"),
        }
    }
}

/// Global listeners the engines attach to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Wheel,
    Touch,
    Scroll,
    Resize,
}

/// A single inline style mutation produced by an animation trigger
#[derive(Debug, Clone, PartialEq)]
pub enum StyleWrite {
    Translate { x: f64, y: f64 },
    Opacity(f64),
    Property { name: String, value: f64 },
}

/// The document and platform the core is attached to
///
/// Implementations must not call back into the coordinator from these
/// methods; they are invoked while orchestration state is locked.
#[async_trait::async_trait]
pub trait Host: Send + Sync {
    /// Platform reduced-motion preference
    fn prefers_reduced_motion(&self) -> bool;

    /// Whether the primary pointer is coarse (touch screens)
    fn coarse_pointer(&self) -> bool;

    /// Current viewport size
    fn viewport(&self) -> Size;

    /// Full scrollable content size
    fn content_size(&self) -> Size;

    /// Parent of an element, `None` at the root or for unknown elements
    fn parent_of(&self, element: ElementId) -> Option<ElementId>;

    /// Document-space box of an element
    fn element_rect(&self, element: ElementId) -> Option<Rect>;

    /// Attach a global listener
    fn attach_listener(&self, kind: ListenerKind) -> ListenerId;

    /// Detach a listener previously returned by [`Host::attach_listener`]
    fn detach_listener(&self, id: ListenerId);

    /// Apply an inline style mutation to an element
    fn write_style(&self, element: ElementId, write: StyleWrite);

    /// Clear every inline style the core wrote to an element
    fn reset_style(&self, element: ElementId);

    /// Current document scroll offset
    fn scroll_position(&self) -> ScrollPosition;

    /// Move the document to a scroll offset
    fn set_scroll_position(&self, position: ScrollPosition);

    /// Make a capability available, possibly asynchronously
    async fn load_capability(&self, capability: Capability) -> Result<()>;
}
