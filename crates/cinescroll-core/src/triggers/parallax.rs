use serde::{Deserialize, Serialize};

use crate::host::{ElementId, Host, Rect, Size, StyleWrite};
use crate::timing::damp;

use super::Bounds;

/// Which way the element drifts as the page scrolls down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParallaxDirection {
    #[default]
    Up,
    Down,
}

impl ParallaxDirection {
    fn sign(&self) -> f64 {
        match self {
            ParallaxDirection::Up => -1.0,
            ParallaxDirection::Down => 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallaxOptions {
    /// Fraction of the viewport height travelled over the whole pass
    #[serde(default = "default_strength")]
    pub strength: f64,
    #[serde(default)]
    pub direction: ParallaxDirection,
    /// Seconds the offset lags behind the scroll position (0 = locked)
    #[serde(default)]
    pub smoothing: f64,
}

impl Default for ParallaxOptions {
    fn default() -> Self {
        Self {
            strength: default_strength(),
            direction: ParallaxDirection::default(),
            smoothing: 0.0,
        }
    }
}

fn default_strength() -> f64 {
    0.5
}

#[derive(Debug, Clone)]
pub(super) struct Parallax {
    options: ParallaxOptions,
    /// Effective lag after the reduced-motion time scale
    smoothing: f64,
    max_offset: f64,
    target: f64,
    current: f64,
}

impl Parallax {
    pub(super) fn new(options: ParallaxOptions, time_scale: f64, viewport: Size) -> Self {
        let strength = if options.strength.is_finite() {
            options.strength.max(0.0)
        } else {
            default_strength()
        };
        let smoothing = if options.smoothing.is_finite() {
            options.smoothing.max(0.0) * time_scale
        } else {
            0.0
        };
        Self {
            options: ParallaxOptions {
                strength,
                ..options
            },
            smoothing,
            max_offset: strength * viewport.height,
            target: 0.0,
            current: 0.0,
        }
    }

    /// Active from the element's top entering until its bottom leaves
    pub(super) fn bounds(rect: Rect, viewport: Size) -> Bounds {
        Bounds {
            start: rect.y - viewport.height,
            end: rect.bottom(),
        }
    }

    pub(super) fn resize(&mut self, viewport: Size) {
        self.max_offset = self.options.strength * viewport.height;
    }

    pub(super) fn offset(&self) -> f64 {
        self.current
    }

    pub(super) fn on_scroll(&mut self, progress: f64, element: ElementId, host: &dyn Host) {
        self.target = progress * self.max_offset * self.options.direction.sign();
        if self.smoothing == 0.0 {
            self.current = self.target;
            self.write(element, host);
        }
    }

    pub(super) fn tick(&mut self, dt_secs: f64, element: ElementId, host: &dyn Host) {
        if self.smoothing == 0.0 || self.current == self.target {
            return;
        }
        self.current = damp(self.current, self.target, 1.0 / self.smoothing, dt_secs);
        if (self.target - self.current).abs() < 0.01 {
            self.current = self.target;
        }
        self.write(element, host);
    }

    pub(super) fn is_animating(&self) -> bool {
        self.current != self.target
    }

    pub(super) fn write(&self, element: ElementId, host: &dyn Host) {
        host.write_style(
            element,
            StyleWrite::Translate {
                x: 0.0,
                y: self.current,
            },
        );
    }
}
