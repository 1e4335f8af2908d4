use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::host::{ElementId, Host, Rect, Size, StyleWrite};
use crate::timing::{is_complete, lerp, progress};

use super::Bounds;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FadeInOptions {
    /// Vertical distance (px) the element rises while fading in
    #[serde(default = "default_distance")]
    pub distance: f64,
    /// Seconds
    #[serde(default = "default_duration")]
    pub duration: f64,
    /// Seconds before the fade starts after entry
    #[serde(default)]
    pub delay: f64,
    #[serde(default = "default_easing")]
    pub easing: String,
    /// Viewport fraction (from the top) the element's top must reach
    #[serde(default = "default_start")]
    pub start: f64,
    /// Play once per page view instead of reversing on leave-back
    #[serde(default = "default_true")]
    pub once: bool,
}

impl Default for FadeInOptions {
    fn default() -> Self {
        Self {
            distance: default_distance(),
            duration: default_duration(),
            delay: 0.0,
            easing: default_easing(),
            start: default_start(),
            once: true,
        }
    }
}

fn default_distance() -> f64 {
    50.0
}

fn default_duration() -> f64 {
    1.0
}

fn default_easing() -> String {
    "power2.out".to_string()
}

fn default_start() -> f64 {
    0.85
}

fn default_true() -> bool {
    true
}

/// In-flight interpolation of the reveal amount
#[derive(Debug, Clone)]
struct Tween {
    /// Set on the first frame after the tween was requested
    start_ms: Option<f64>,
    delay_ms: f64,
    duration_ms: f64,
    from: f64,
    to: f64,
}

#[derive(Debug, Clone)]
pub(super) struct FadeIn {
    options: FadeInOptions,
    easing: Easing,
    time_scale: f64,
    /// 0 = hidden, 1 = fully revealed
    reveal: f64,
    entered: bool,
    completed: bool,
    tween: Option<Tween>,
}

impl FadeIn {
    pub(super) fn new(options: FadeInOptions, time_scale: f64) -> Self {
        let (easing, _) = Easing::from_name_or_linear(&options.easing);
        Self {
            options,
            easing,
            time_scale,
            reveal: 0.0,
            entered: false,
            completed: false,
            tween: None,
        }
    }

    /// Starts when the element's top crosses `start` of the viewport
    pub(super) fn bounds(rect: Rect, viewport: Size, options: &FadeInOptions) -> Bounds {
        let start_fraction = if options.start.is_finite() {
            options.start.clamp(0.0, 1.0)
        } else {
            default_start()
        };
        Bounds {
            start: rect.y - viewport.height * start_fraction,
            end: rect.bottom(),
        }
    }

    pub(super) fn options(&self) -> &FadeInOptions {
        &self.options
    }

    pub(super) fn opacity(&self) -> f64 {
        self.easing.apply(self.reveal)
    }

    pub(super) fn translate_y(&self) -> f64 {
        self.options.distance * (1.0 - self.easing.apply(self.reveal))
    }

    pub(super) fn is_complete(&self) -> bool {
        self.completed
    }

    pub(super) fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    /// Write the hidden starting state
    pub(super) fn prepare(&self, element: ElementId, host: &dyn Host) {
        self.write(element, host);
    }

    pub(super) fn on_scroll(&mut self, scroll_y: f64, bounds: Bounds, element: ElementId, host: &dyn Host) {
        if self.completed {
            return;
        }
        let inside = scroll_y >= bounds.start;
        if inside == self.entered {
            return;
        }
        self.entered = inside;

        if inside {
            let delay = self.options.delay.max(0.0) * self.time_scale;
            self.play_to(1.0, delay, element, host);
        } else if !self.options.once {
            self.play_to(0.0, 0.0, element, host);
        }
    }

    fn play_to(&mut self, to: f64, delay_secs: f64, element: ElementId, host: &dyn Host) {
        let duration_ms = self.options.duration.max(0.0) * 1000.0 * self.time_scale;
        let delay_ms = delay_secs * 1000.0;
        if duration_ms == 0.0 && delay_ms == 0.0 {
            // Snap to the endpoint on the triggering scroll update
            self.tween = None;
            self.finish(to, element, host);
            return;
        }
        self.tween = Some(Tween {
            start_ms: None,
            delay_ms,
            duration_ms,
            from: self.reveal,
            to,
        });
    }

    pub(super) fn tick(&mut self, now_ms: f64, element: ElementId, host: &dyn Host) {
        let Some(tween) = self.tween.as_mut() else {
            return;
        };
        let start = *tween.start_ms.get_or_insert(now_ms) + tween.delay_ms;
        if now_ms < start {
            return;
        }
        if is_complete(start, now_ms, tween.duration_ms) {
            let to = tween.to;
            self.tween = None;
            self.finish(to, element, host);
        } else {
            let t = progress(start, now_ms, tween.duration_ms);
            self.reveal = lerp(tween.from, tween.to, t);
            self.write(element, host);
        }
    }

    fn finish(&mut self, reveal: f64, element: ElementId, host: &dyn Host) {
        self.reveal = reveal;
        if reveal >= 1.0 && self.options.once {
            self.completed = true;
        }
        self.write(element, host);
    }

    /// Stop any in-flight tween where it is
    pub(super) fn halt(&mut self) {
        self.tween = None;
    }

    pub(super) fn write(&self, element: ElementId, host: &dyn Host) {
        host.write_style(element, StyleWrite::Opacity(self.opacity()));
        host.write_style(
            element,
            StyleWrite::Translate {
                x: 0.0,
                y: self.translate_y(),
            },
        );
    }
}
