pub mod config;
pub mod coordinator;
pub mod easing;
pub mod error;
pub mod host;
pub mod session;
pub mod smooth;
pub mod timing;
pub mod triggers;
pub mod zones;

pub use config::{resolve, Config, Options, Orientation, ReducedMotion, SmoothOptions};
pub use coordinator::{Coordinator, LifecycleState};
pub use easing::Easing;
pub use error::{Error, Result};
pub use host::{ElementId, HeadlessHost, Host, Rect, ScrollPosition, Size};
pub use session::{Diagnostics, EngineHandle, Session, TriggerHandle, ZoneHandle};
pub use smooth::{InputDisposition, ScrollInput};
pub use triggers::{FadeInOptions, LinkedValueOptions, ParallaxOptions, TriggerSpec};
