use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::host::{ElementId, Host, Rect, Size, StyleWrite};
use crate::timing::lerp;

use super::Bounds;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedValueOptions {
    #[serde(default)]
    pub start_value: f64,
    #[serde(default = "default_end_value")]
    pub end_value: f64,
    /// Name resolved against the easing registry
    #[serde(default = "default_easing")]
    pub easing: String,
    /// Style property the value is written to
    #[serde(default = "default_property")]
    pub property: String,
}

impl Default for LinkedValueOptions {
    fn default() -> Self {
        Self {
            start_value: 0.0,
            end_value: default_end_value(),
            easing: default_easing(),
            property: default_property(),
        }
    }
}

fn default_end_value() -> f64 {
    1.0
}

fn default_easing() -> String {
    "linear".to_string()
}

fn default_property() -> String {
    "--scroll-value".to_string()
}

#[derive(Debug, Clone)]
pub(super) struct LinkedValue {
    options: LinkedValueOptions,
    easing: Easing,
    easing_fallback: bool,
    value: f64,
}

impl LinkedValue {
    pub(super) fn new(options: LinkedValueOptions) -> Self {
        let (easing, easing_fallback) = Easing::from_name_or_linear(&options.easing);
        let value = options.start_value;
        Self {
            options,
            easing,
            easing_fallback,
            value,
        }
    }

    /// Tracks the element's whole pass through the viewport
    pub(super) fn bounds(rect: Rect, viewport: Size) -> Bounds {
        Bounds {
            start: rect.y - viewport.height,
            end: rect.bottom(),
        }
    }

    pub(super) fn value(&self) -> f64 {
        self.value
    }

    pub(super) fn easing(&self) -> Easing {
        self.easing
    }

    pub(super) fn easing_fallback(&self) -> bool {
        self.easing_fallback
    }

    pub(super) fn on_scroll(&mut self, progress: f64, element: ElementId, host: &dyn Host) {
        let eased = self.easing.apply(progress);
        self.value = lerp(self.options.start_value, self.options.end_value, eased);
        self.write(element, host);
    }

    pub(super) fn write(&self, element: ElementId, host: &dyn Host) {
        host.write_style(
            element,
            StyleWrite::Property {
                name: self.options.property.clone(),
                value: self.value,
            },
        );
    }
}
