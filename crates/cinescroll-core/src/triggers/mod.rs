//! Scroll-triggered animation engine
//!
//! Keeps a registry of triggers, each binding one element to one behavior.
//! Scroll updates drive progress-bound behaviors directly; time-based tweens
//! advance on [`TriggerEngine::tick`].

mod fade;
mod linked;
mod parallax;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{Config, PerformanceConfig};
use crate::easing::Easing;
use crate::host::{ElementId, Host, ListenerId, ListenerKind, Size};
use crate::timing::normalize;

pub use fade::FadeInOptions;
pub use linked::LinkedValueOptions;
pub use parallax::{ParallaxDirection, ParallaxOptions};

use fade::FadeIn;
use linked::LinkedValue;
use parallax::Parallax;

/// Identity of a registered trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerId(pub u64);

/// Scroll range (document offsets) a trigger responds to
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub start: f64,
    pub end: f64,
}

impl Bounds {
    #[inline]
    pub fn progress(&self, scroll_y: f64) -> f64 {
        normalize(scroll_y, self.start, self.end)
    }
}

/// Animation category, used for the per-category performance toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Parallax,
    FadeIn,
    LinkedValue,
}

/// What a trigger should do, as requested by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerSpec {
    Parallax(ParallaxOptions),
    FadeIn(FadeInOptions),
    LinkedValue(LinkedValueOptions),
}

impl TriggerSpec {
    pub fn kind(&self) -> TriggerKind {
        match self {
            TriggerSpec::Parallax(_) => TriggerKind::Parallax,
            TriggerSpec::FadeIn(_) => TriggerKind::FadeIn,
            TriggerSpec::LinkedValue(_) => TriggerKind::LinkedValue,
        }
    }
}

/// Observable output of a trigger
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutput {
    Parallax {
        offset: f64,
    },
    FadeIn {
        opacity: f64,
        translate_y: f64,
        complete: bool,
    },
    LinkedValue {
        value: f64,
        easing: Easing,
        easing_fallback: bool,
    },
}

/// Point-in-time view of one trigger
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerState {
    pub id: TriggerId,
    pub element: ElementId,
    pub kind: TriggerKind,
    pub bounds: Bounds,
    pub progress: f64,
    pub output: TriggerOutput,
}

#[derive(Debug, Clone)]
enum Behavior {
    Parallax(Parallax),
    FadeIn(FadeIn),
    LinkedValue(LinkedValue),
}

#[derive(Debug, Clone)]
struct Entry {
    element: ElementId,
    bounds: Bounds,
    progress: f64,
    behavior: Behavior,
}

impl Entry {
    fn recompute_bounds(&mut self, viewport: Size, host: &dyn Host) {
        // Elements that vanished keep their last known range
        let Some(rect) = host.element_rect(self.element) else {
            return;
        };
        self.bounds = match &mut self.behavior {
            Behavior::Parallax(p) => {
                p.resize(viewport);
                Parallax::bounds(rect, viewport)
            }
            Behavior::FadeIn(f) => FadeIn::bounds(rect, viewport, f.options()),
            Behavior::LinkedValue(_) => LinkedValue::bounds(rect, viewport),
        };
    }

    fn on_scroll(&mut self, scroll_y: f64, host: &dyn Host) {
        self.progress = self.bounds.progress(scroll_y);
        match &mut self.behavior {
            Behavior::Parallax(p) => p.on_scroll(self.progress, self.element, host),
            Behavior::FadeIn(f) => f.on_scroll(scroll_y, self.bounds, self.element, host),
            Behavior::LinkedValue(l) => l.on_scroll(self.progress, self.element, host),
        }
    }

    fn tick(&mut self, now_ms: f64, dt_secs: f64, host: &dyn Host) {
        match &mut self.behavior {
            Behavior::Parallax(p) => p.tick(dt_secs, self.element, host),
            Behavior::FadeIn(f) => f.tick(now_ms, self.element, host),
            Behavior::LinkedValue(_) => {}
        }
    }

    /// Write the current output again
    fn restore(&self, host: &dyn Host) {
        match &self.behavior {
            Behavior::Parallax(p) => p.write(self.element, host),
            Behavior::FadeIn(f) => f.write(self.element, host),
            Behavior::LinkedValue(l) => l.write(self.element, host),
        }
    }

    fn is_animating(&self) -> bool {
        match &self.behavior {
            Behavior::Parallax(p) => p.is_animating(),
            Behavior::FadeIn(f) => f.is_animating(),
            Behavior::LinkedValue(_) => false,
        }
    }

    fn state(&self, id: TriggerId) -> TriggerState {
        let (kind, output) = match &self.behavior {
            Behavior::Parallax(p) => (
                TriggerKind::Parallax,
                TriggerOutput::Parallax { offset: p.offset() },
            ),
            Behavior::FadeIn(f) => (
                TriggerKind::FadeIn,
                TriggerOutput::FadeIn {
                    opacity: f.opacity(),
                    translate_y: f.translate_y(),
                    complete: f.is_complete(),
                },
            ),
            Behavior::LinkedValue(l) => (
                TriggerKind::LinkedValue,
                TriggerOutput::LinkedValue {
                    value: l.value(),
                    easing: l.easing(),
                    easing_fallback: l.easing_fallback(),
                },
            ),
        };
        TriggerState {
            id,
            element: self.element,
            kind,
            bounds: self.bounds,
            progress: self.progress,
            output,
        }
    }
}

/// Scroll-triggered animation engine instance
#[derive(Debug)]
pub struct TriggerEngine {
    entries: BTreeMap<TriggerId, Entry>,
    performance: PerformanceConfig,
    /// 0 under reduced motion: every duration and delay collapses
    time_scale: f64,
    debug: bool,
    viewport: Size,
    scroll_y: f64,
    last_tick_ms: Option<f64>,
    listeners: Vec<ListenerId>,
}

impl TriggerEngine {
    /// Construct the engine and attach its scroll/resize listeners
    pub fn new(config: &Config, host: &dyn Host) -> Self {
        let listeners = vec![
            host.attach_listener(ListenerKind::Scroll),
            host.attach_listener(ListenerKind::Resize),
        ];
        debug!(
            time_scale = config.time_scale(),
            "Scroll-trigger engine constructed"
        );
        Self {
            entries: BTreeMap::new(),
            performance: config.performance,
            time_scale: config.time_scale(),
            debug: config.debug,
            viewport: host.viewport(),
            scroll_y: host.scroll_position().y,
            last_tick_ms: None,
            listeners,
        }
    }

    /// Whether a category is enabled by the performance toggles
    pub fn category_enabled(&self, kind: TriggerKind) -> bool {
        self.performance.allows(kind)
    }

    /// Register a trigger under a caller-reserved id and apply it at the
    /// current scroll position. Returns false if its category is disabled.
    pub fn add(&mut self, id: TriggerId, element: ElementId, spec: TriggerSpec, host: &dyn Host) -> bool {
        if !self.category_enabled(spec.kind()) {
            debug!(?id, kind = ?spec.kind(), "Trigger category disabled, skipping");
            return false;
        }

        let behavior = match spec {
            TriggerSpec::Parallax(options) => {
                Behavior::Parallax(Parallax::new(options, self.time_scale, self.viewport))
            }
            TriggerSpec::FadeIn(options) => {
                let fade = FadeIn::new(options, self.time_scale);
                fade.prepare(element, host);
                Behavior::FadeIn(fade)
            }
            TriggerSpec::LinkedValue(options) => Behavior::LinkedValue(LinkedValue::new(options)),
        };

        let mut entry = Entry {
            element,
            bounds: Bounds::default(),
            progress: 0.0,
            behavior,
        };
        entry.recompute_bounds(self.viewport, host);
        entry.on_scroll(self.scroll_y, host);
        self.entries.insert(id, entry);
        debug!(?id, ?element, "Trigger registered");
        true
    }

    /// Halt and unregister a trigger, clearing the styles it wrote
    ///
    /// Other triggers on the same element write their output again.
    pub fn remove(&mut self, id: TriggerId, host: &dyn Host) -> bool {
        let Some(mut entry) = self.entries.remove(&id) else {
            return false;
        };
        if let Behavior::FadeIn(f) = &mut entry.behavior {
            f.halt();
        }
        host.reset_style(entry.element);
        for other in self.entries.values().filter(|e| e.element == entry.element) {
            other.restore(host);
        }
        debug!(?id, "Trigger removed");
        true
    }

    /// Feed a new scroll offset to every trigger
    pub fn update(&mut self, scroll_y: f64, host: &dyn Host) {
        self.scroll_y = scroll_y;
        for entry in self.entries.values_mut() {
            entry.on_scroll(scroll_y, host);
        }
        if self.debug {
            trace!(scroll_y, triggers = self.entries.len(), "Triggers updated");
        }
    }

    /// Advance time-based tweens to `now_ms`
    pub fn tick(&mut self, now_ms: f64, host: &dyn Host) {
        let dt_secs = match self.last_tick_ms {
            Some(last) => (now_ms - last).max(0.0) / 1000.0,
            None => 0.0,
        };
        self.last_tick_ms = Some(now_ms);
        for entry in self.entries.values_mut() {
            entry.tick(now_ms, dt_secs, host);
        }
    }

    /// Recompute every trigger's range from current geometry
    pub fn refresh(&mut self, host: &dyn Host) {
        self.viewport = host.viewport();
        self.scroll_y = host.scroll_position().y;
        for entry in self.entries.values_mut() {
            entry.recompute_bounds(self.viewport, host);
            entry.on_scroll(self.scroll_y, host);
        }
        debug!(triggers = self.entries.len(), "Trigger boundaries refreshed");
    }

    pub fn state(&self, id: TriggerId) -> Option<TriggerState> {
        self.entries.get(&id).map(|e| e.state(id))
    }

    pub fn states(&self) -> Vec<TriggerState> {
        self.entries.iter().map(|(id, e)| e.state(*id)).collect()
    }

    pub fn contains(&self, id: TriggerId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any tween or smoothed offset is still moving
    pub fn is_animating(&self) -> bool {
        self.entries.values().any(Entry::is_animating)
    }

    /// Kill every trigger and detach listeners
    pub fn destroy(&mut self, host: &dyn Host) {
        for (_, mut entry) in std::mem::take(&mut self.entries) {
            if let Behavior::FadeIn(f) = &mut entry.behavior {
                f.halt();
            }
            host.reset_style(entry.element);
        }
        for id in self.listeners.drain(..) {
            host.detach_listener(id);
        }
        debug!("Scroll-trigger engine destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, Options, PerformanceOptions, ReducedMotion};
    use crate::host::{HeadlessHost, Rect};

    fn setup(options: Options) -> (HeadlessHost, TriggerEngine, ElementId) {
        let host = HeadlessHost::new(Size::new(1000.0, 800.0), Size::new(1000.0, 5000.0));
        let el = host.add_element(None, Rect::new(0.0, 2000.0, 1000.0, 400.0));
        let config = resolve(&options, &host);
        let engine = TriggerEngine::new(&config, &host);
        (host, engine, el)
    }

    #[test]
    fn test_parallax_offset_is_monotonic_and_bounded() {
        let (host, mut engine, el) = setup(Options::default());
        let id = TriggerId(1);
        assert!(engine.add(
            id,
            el,
            TriggerSpec::Parallax(ParallaxOptions {
                strength: 0.5,
                ..Default::default()
            }),
            &host
        ));

        let bounds = engine.state(id).unwrap().bounds;
        assert_eq!(bounds, Bounds { start: 1200.0, end: 2400.0 });

        let mut prev = 0.0_f64;
        for step in 0..=100 {
            let scroll = bounds.start + (bounds.end - bounds.start) * step as f64 / 100.0;
            engine.update(scroll, &host);
            let TriggerOutput::Parallax { offset } = engine.state(id).unwrap().output else {
                panic!("expected parallax output");
            };
            // Direction up: offsets grow more negative as progress grows
            assert!(offset.abs() >= prev.abs());
            assert!(offset.abs() <= 0.5 * 800.0 + 1e-9);
            assert_eq!(host.style(el).translate_y, offset);
            prev = offset;
        }
        assert_eq!(prev, -400.0);
    }

    #[test]
    fn test_fade_in_tweens_after_entry() {
        let (host, mut engine, el) = setup(Options::default());
        let id = TriggerId(1);
        engine.add(
            id,
            el,
            TriggerSpec::FadeIn(FadeInOptions {
                easing: "linear".to_string(),
                ..Default::default()
            }),
            &host,
        );
        assert_eq!(host.style(el).opacity, 0.0);
        assert_eq!(host.style(el).translate_y, 50.0);

        // Trigger point: 2000 - 0.85 * 800 = 1320
        engine.update(1320.0, &host);
        engine.tick(0.0, &host);
        assert_eq!(host.style(el).opacity, 0.0);
        engine.tick(500.0, &host);
        assert!((host.style(el).opacity - 0.5).abs() < 1e-9);
        engine.tick(1000.0, &host);
        assert_eq!(host.style(el).opacity, 1.0);
        assert_eq!(host.style(el).translate_y, 0.0);
        assert!(matches!(
            engine.state(id).unwrap().output,
            TriggerOutput::FadeIn { complete: true, .. }
        ));

        // Played once: leaving back keeps it visible
        engine.update(0.0, &host);
        engine.tick(2000.0, &host);
        assert_eq!(host.style(el).opacity, 1.0);
    }

    #[test]
    fn test_fade_in_reverses_when_not_once() {
        let options = Options {
            reduced_motion: Some(ReducedMotion::On),
            ..Default::default()
        };
        let (host, mut engine, el) = setup(options);
        let id = TriggerId(1);
        engine.add(
            id,
            el,
            TriggerSpec::FadeIn(FadeInOptions {
                once: false,
                ..Default::default()
            }),
            &host,
        );
        engine.update(1500.0, &host);
        assert_eq!(host.style(el).opacity, 1.0);
        engine.update(100.0, &host);
        assert_eq!(host.style(el).opacity, 0.0);
        assert_eq!(host.style(el).translate_y, 50.0);
    }

    #[test]
    fn test_reduced_motion_fade_snaps_on_triggering_update() {
        let options = Options {
            reduced_motion: Some(ReducedMotion::On),
            ..Default::default()
        };
        let (host, mut engine, el) = setup(options);
        let id = TriggerId(7);
        engine.add(
            id,
            el,
            TriggerSpec::FadeIn(FadeInOptions {
                duration: 2.0,
                delay: 1.0,
                ..Default::default()
            }),
            &host,
        );
        assert_eq!(host.style(el).opacity, 0.0);

        engine.update(1400.0, &host);
        // No tick needed: the end state is reached on the scroll update itself
        let style = host.style(el);
        assert_eq!(style.opacity, 1.0);
        assert_eq!(style.translate_y, 0.0);
        assert!(!engine.is_animating());
    }

    #[test]
    fn test_linked_value_interpolates_with_easing() {
        let (host, mut engine, el) = setup(Options::default());
        let id = TriggerId(3);
        engine.add(
            id,
            el,
            TriggerSpec::LinkedValue(LinkedValueOptions {
                start_value: 10.0,
                end_value: 20.0,
                easing: "power1.in".to_string(),
                property: "--hue".to_string(),
            }),
            &host,
        );
        engine.update(1800.0, &host);
        let state = engine.state(id).unwrap();
        assert!((state.progress - 0.5).abs() < 1e-9);
        let TriggerOutput::LinkedValue { value, easing_fallback, .. } = state.output else {
            panic!("expected linked value output");
        };
        assert!((value - 12.5).abs() < 1e-9);
        assert!(!easing_fallback);
        assert_eq!(host.style(el).properties.get("--hue"), Some(&value));
    }

    #[test]
    fn test_unknown_easing_uses_linear() {
        let (host, mut engine, el) = setup(Options::default());
        let id = TriggerId(4);
        engine.add(
            id,
            el,
            TriggerSpec::LinkedValue(LinkedValueOptions {
                easing: "bogus".to_string(),
                ..Default::default()
            }),
            &host,
        );
        engine.update(1500.0, &host);
        let TriggerOutput::LinkedValue { value, easing, easing_fallback } =
            engine.state(id).unwrap().output
        else {
            panic!("expected linked value output");
        };
        assert_eq!(easing, Easing::Linear);
        assert!(easing_fallback);
        assert!((value - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_disabled_category_is_skipped() {
        let options = Options {
            performance: Some(PerformanceOptions {
                parallax: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };
        let (host, mut engine, el) = setup(options);
        assert!(!engine.add(TriggerId(1), el, TriggerSpec::Parallax(ParallaxOptions::default()), &host));
        assert!(engine.is_empty());
        assert!(!host.has_inline_style(el));
    }

    #[test]
    fn test_remove_halts_tween_and_resets_style() {
        let (host, mut engine, el) = setup(Options::default());
        let id = TriggerId(1);
        engine.add(id, el, TriggerSpec::FadeIn(FadeInOptions::default()), &host);
        engine.update(1500.0, &host);
        engine.tick(0.0, &host);
        engine.tick(100.0, &host);
        assert!(engine.is_animating());

        assert!(engine.remove(id, &host));
        assert!(!engine.contains(id));
        assert!(!host.has_inline_style(el));
        engine.tick(2000.0, &host);
        assert!(!host.has_inline_style(el));
        assert!(!engine.remove(id, &host));
    }

    #[test]
    fn test_remove_keeps_other_triggers_on_same_element() {
        let (host, mut engine, el) = setup(Options::default());
        let parallax = TriggerId(1);
        let linked = TriggerId(2);
        engine.add(parallax, el, TriggerSpec::Parallax(ParallaxOptions::default()), &host);
        engine.add(
            linked,
            el,
            TriggerSpec::LinkedValue(LinkedValueOptions::default()),
            &host,
        );
        engine.update(1800.0, &host);

        let states = engine.states();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].id, parallax);
        assert_eq!(states[1].kind, TriggerKind::LinkedValue);
        assert_eq!(host.style(el).properties.get("--scroll-value"), Some(&0.5));

        assert!(engine.remove(linked, &host));
        let style = host.style(el);
        assert_eq!(style.translate_y, -200.0);
        assert!(style.properties.is_empty());

        assert!(engine.remove(parallax, &host));
        assert!(!host.has_inline_style(el));
    }

    #[test]
    fn test_refresh_recomputes_bounds() {
        let (host, mut engine, el) = setup(Options::default());
        let id = TriggerId(1);
        engine.add(id, el, TriggerSpec::Parallax(ParallaxOptions::default()), &host);
        host.set_element_rect(el, Rect::new(0.0, 3000.0, 1000.0, 400.0));
        engine.refresh(&host);
        assert_eq!(engine.state(id).unwrap().bounds, Bounds { start: 2200.0, end: 3400.0 });
    }

    #[test]
    fn test_parallax_smoothing_lags_then_settles() {
        let (host, mut engine, el) = setup(Options::default());
        let id = TriggerId(1);
        engine.add(
            id,
            el,
            TriggerSpec::Parallax(ParallaxOptions {
                smoothing: 0.5,
                ..Default::default()
            }),
            &host,
        );
        engine.update(2400.0, &host);
        engine.tick(0.0, &host);
        engine.tick(16.0, &host);
        let TriggerOutput::Parallax { offset } = engine.state(id).unwrap().output else {
            panic!("expected parallax output");
        };
        assert!(offset < 0.0 && offset > -400.0);

        for frame in 2..2000 {
            engine.tick(frame as f64 * 16.0, &host);
        }
        assert_eq!(host.style(el).translate_y, -400.0);
        assert!(!engine.is_animating());
    }

    #[test]
    fn test_destroy_clears_everything() {
        let (host, mut engine, el) = setup(Options::default());
        engine.add(TriggerId(1), el, TriggerSpec::FadeIn(FadeInOptions::default()), &host);
        engine.add(TriggerId(2), el, TriggerSpec::Parallax(ParallaxOptions::default()), &host);
        assert_eq!(host.live_listeners(), 2);
        engine.destroy(&host);
        assert!(engine.is_empty());
        assert_eq!(host.live_listeners(), 0);
        assert!(!host.has_inline_style(el));
    }
}
