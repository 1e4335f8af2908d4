//! Smooth-scroll engine
//!
//! Intercepts wheel/touch input, accumulates a target offset and eases the
//! document towards it one frame at a time. Two modes are supported:
//! frame-rate independent damping (`lerp`) and fixed duration with an easing
//! curve. Input landing inside a nested zone is left to native scrolling.

use tracing::{debug, trace};

use crate::config::{Config, SmoothConfig};
use crate::easing::Easing;
use crate::host::{Axis, ElementId, Host, ListenerId, ListenerKind, ScrollPosition, Size};
use crate::timing::{damp, is_complete, lerp, progress};
use crate::zones::ZoneRegistry;

/// Distance (px) under which damping snaps to the target
const SETTLE_THRESHOLD: f64 = 0.5;

/// Where a scroll gesture came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Wheel,
    Touch,
}

/// A raw scroll gesture delivered by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollInput {
    /// Element under the pointer/touch
    pub target: ElementId,
    pub delta_x: f64,
    pub delta_y: f64,
    pub source: InputSource,
}

impl ScrollInput {
    pub fn wheel(target: ElementId, delta_x: f64, delta_y: f64) -> Self {
        Self {
            target,
            delta_x,
            delta_y,
            source: InputSource::Wheel,
        }
    }

    pub fn touch(target: ElementId, delta_x: f64, delta_y: f64) -> Self {
        Self {
            target,
            delta_x,
            delta_y,
            source: InputSource::Touch,
        }
    }

    fn delta(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Vertical => self.delta_y,
            Axis::Horizontal => self.delta_x,
        }
    }
}

/// What happened to one axis of an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handling {
    /// No movement on this axis
    Ignored,
    /// Left to the platform's native scrolling
    Native,
    /// Taken over by the smooth-scroll engine
    Smoothed,
    /// Swallowed because the engine is stopped
    Blocked,
}

/// Per-axis outcome of [`SmoothScroll::handle_input`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputDisposition {
    pub vertical: Handling,
    pub horizontal: Handling,
}

impl InputDisposition {
    /// Every axis goes to native scrolling
    pub const NATIVE: Self = Self {
        vertical: Handling::Native,
        horizontal: Handling::Native,
    };

    /// Whether the host must suppress the platform's default scrolling
    pub fn prevents_default(&self) -> bool {
        matches!(self.vertical, Handling::Smoothed | Handling::Blocked)
            || matches!(self.horizontal, Handling::Smoothed | Handling::Blocked)
    }

    pub fn for_axis(&self, axis: Axis) -> Handling {
        match axis {
            Axis::Vertical => self.vertical,
            Axis::Horizontal => self.horizontal,
        }
    }
}

/// Duration-mode animation of one axis
#[derive(Debug, Clone)]
struct ActiveAnimation {
    /// Set on the first frame after the animation was requested
    start_ms: Option<f64>,
    from: f64,
    to: f64,
    duration_ms: f64,
    easing: Easing,
}

#[derive(Debug, Clone, Default)]
struct AxisState {
    current: f64,
    target: f64,
    limit: f64,
    animation: Option<ActiveAnimation>,
}

impl AxisState {
    fn at(position: f64, limit: f64) -> Self {
        let position = position.clamp(0.0, limit);
        Self {
            current: position,
            target: position,
            limit,
            animation: None,
        }
    }

    fn is_moving(&self) -> bool {
        self.animation.is_some() || self.current != self.target
    }

    fn jump(&mut self, position: f64) {
        let position = position.clamp(0.0, self.limit);
        self.current = position;
        self.target = position;
        self.animation = None;
    }

    fn set_limit(&mut self, limit: f64) {
        self.limit = limit;
        self.target = self.target.clamp(0.0, limit);
        self.current = self.current.clamp(0.0, limit);
        if let Some(anim) = self.animation.as_mut() {
            anim.to = anim.to.clamp(0.0, limit);
        }
    }

    /// Advance one frame; returns whether `current` changed
    fn advance(&mut self, config: &SmoothConfig, now_ms: f64, dt_secs: f64) -> bool {
        let before = self.current;

        if let Some(anim) = self.animation.as_mut() {
            let start = *anim.start_ms.get_or_insert(now_ms);
            if is_complete(start, now_ms, anim.duration_ms) {
                self.current = anim.to;
                self.animation = None;
            } else {
                let t = progress(start, now_ms, anim.duration_ms);
                self.current = lerp(anim.from, anim.to, anim.easing.apply(t));
            }
        } else if let Some(factor) = config.lerp {
            if self.current != self.target {
                self.current = damp(self.current, self.target, factor * 60.0, dt_secs);
                if (self.target - self.current).abs() < SETTLE_THRESHOLD {
                    self.current = self.target;
                }
            }
        } else {
            self.current = self.target;
        }

        self.current != before
    }
}

/// Smooth-scroll engine instance
#[derive(Debug)]
pub struct SmoothScroll {
    config: SmoothConfig,
    coarse_pointer: bool,
    debug: bool,
    vertical: AxisState,
    horizontal: AxisState,
    stopped: bool,
    last_tick_ms: Option<f64>,
    listeners: Vec<ListenerId>,
}

impl SmoothScroll {
    /// Construct the engine and attach its input listeners
    pub fn new(config: &Config, host: &dyn Host) -> Self {
        let limits = scroll_limits(host);
        let position = host.scroll_position();
        let listeners = vec![
            host.attach_listener(ListenerKind::Wheel),
            host.attach_listener(ListenerKind::Touch),
        ];
        debug!(
            lerp = ?config.smooth.lerp,
            duration = config.smooth.duration_secs,
            orientation = ?config.smooth.orientation,
            "Smooth-scroll engine constructed"
        );
        Self {
            config: config.smooth.clone(),
            coarse_pointer: config.platform.coarse_pointer,
            debug: config.debug,
            vertical: AxisState::at(position.y, limits.height),
            horizontal: AxisState::at(position.x, limits.width),
            stopped: false,
            last_tick_ms: None,
            listeners,
        }
    }

    pub fn config(&self) -> &SmoothConfig {
        &self.config
    }

    fn axis(&self, axis: Axis) -> &AxisState {
        match axis {
            Axis::Vertical => &self.vertical,
            Axis::Horizontal => &self.horizontal,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut AxisState {
        match axis {
            Axis::Vertical => &mut self.vertical,
            Axis::Horizontal => &mut self.horizontal,
        }
    }

    /// Current (animated) scroll position
    pub fn position(&self) -> ScrollPosition {
        ScrollPosition {
            x: self.horizontal.current,
            y: self.vertical.current,
        }
    }

    /// Position the engine is easing towards
    pub fn target(&self) -> ScrollPosition {
        ScrollPosition {
            x: self.horizontal.target,
            y: self.vertical.target,
        }
    }

    /// Check if an animation is in progress on any axis
    #[inline]
    pub fn is_scrolling(&self) -> bool {
        self.vertical.is_moving() || self.horizontal.is_moving()
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Pause scrolling: input is swallowed and motion halts in place
    pub fn stop(&mut self) {
        self.stopped = true;
        for axis in [Axis::Vertical, Axis::Horizontal] {
            let state = self.axis_mut(axis);
            let current = state.current;
            state.jump(current);
        }
    }

    /// Resume after [`SmoothScroll::stop`]
    pub fn start(&mut self) {
        self.stopped = false;
    }

    /// Route one input event, consulting the nested zones first
    pub fn handle_input(
        &mut self,
        input: &ScrollInput,
        zones: &ZoneRegistry,
        host: &dyn Host,
    ) -> InputDisposition {
        let vertical = self.route_axis(input, Axis::Vertical, zones, host);
        let horizontal = self.route_axis(input, Axis::Horizontal, zones, host);
        if self.debug {
            trace!(?input, ?vertical, ?horizontal, "Scroll input routed");
        }
        InputDisposition {
            vertical,
            horizontal,
        }
    }

    fn route_axis(
        &mut self,
        input: &ScrollInput,
        axis: Axis,
        zones: &ZoneRegistry,
        host: &dyn Host,
    ) -> Handling {
        let delta = input.delta(axis);
        if delta == 0.0 {
            return Handling::Ignored;
        }
        if !self.config.orientation.covers(axis) || !self.config.gesture_orientation.covers(axis) {
            return Handling::Native;
        }
        let multiplier = match input.source {
            InputSource::Wheel if self.config.smooth_wheel => self.config.wheel_multiplier,
            InputSource::Touch if self.config.sync_touch && !self.coarse_pointer => {
                self.config.touch_multiplier
            }
            _ => return Handling::Native,
        };
        if zones.suspends(input.target, axis, host) {
            return Handling::Native;
        }
        if self.stopped {
            return Handling::Blocked;
        }

        let target = self.axis(axis).target + delta * multiplier;
        self.animate_axis(axis, target);
        Handling::Smoothed
    }

    fn animate_axis(&mut self, axis: Axis, target: f64) {
        let duration_ms = self.config.duration_secs * 1000.0;
        let easing = self.config.easing;
        let duration_mode = self.config.lerp.is_none();
        let state = self.axis_mut(axis);
        let target = target.clamp(0.0, state.limit);
        state.target = target;
        if duration_mode {
            if target == state.current {
                state.animation = None;
            } else {
                state.animation = Some(ActiveAnimation {
                    start_ms: None,
                    from: state.current,
                    to: target,
                    duration_ms,
                    easing,
                });
            }
        }
    }

    /// Scroll programmatically, optionally skipping the animation
    pub fn scroll_to(&mut self, target: ScrollPosition, immediate: bool, host: &dyn Host) {
        if self.stopped {
            return;
        }
        if immediate {
            self.vertical.jump(target.y);
            self.horizontal.jump(target.x);
            host.set_scroll_position(self.position());
        } else {
            self.animate_axis(Axis::Vertical, target.y);
            self.animate_axis(Axis::Horizontal, target.x);
        }
    }

    /// Adopt a position the document reached on its own (scrollbar drag,
    /// keyboard) without writing it back
    pub fn sync_native(&mut self, position: ScrollPosition) {
        self.vertical.jump(position.y);
        self.horizontal.jump(position.x);
    }

    /// Advance one frame at `now_ms`
    ///
    /// Returns the new position when the document moved.
    pub fn tick(&mut self, now_ms: f64, host: &dyn Host) -> Option<ScrollPosition> {
        let dt_ms = match self.last_tick_ms {
            Some(last) => (now_ms - last).max(0.0),
            None => self.config.frame_interval_ms() as f64,
        };
        self.last_tick_ms = Some(now_ms);

        let dt_secs = dt_ms / 1000.0;
        let config = &self.config;
        let moved_y = self.vertical.advance(config, now_ms, dt_secs);
        let moved_x = self.horizontal.advance(config, now_ms, dt_secs);

        if !(moved_x || moved_y) {
            return None;
        }
        let position = self.position();
        host.set_scroll_position(position);
        if self.debug {
            trace!(x = position.x, y = position.y, now_ms, "Smooth-scroll frame");
        }
        Some(position)
    }

    /// Recompute scroll limits after the viewport or content changed
    pub fn resize(&mut self, host: &dyn Host) {
        let limits = scroll_limits(host);
        self.vertical.set_limit(limits.height);
        self.horizontal.set_limit(limits.width);
    }

    /// Detach listeners; the engine must not be used afterwards
    pub fn destroy(&mut self, host: &dyn Host) {
        for id in self.listeners.drain(..) {
            host.detach_listener(id);
        }
        self.vertical.animation = None;
        self.horizontal.animation = None;
        debug!("Smooth-scroll engine destroyed");
    }
}

/// Maximum scroll offsets for the current document
fn scroll_limits(host: &dyn Host) -> Size {
    let viewport = host.viewport();
    let content = host.content_size();
    Size::new(
        (content.width - viewport.width).max(0.0),
        (content.height - viewport.height).max(0.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, Options, Orientation, SmoothOptions};
    use crate::host::{HeadlessHost, Rect};

    fn engine_with(smooth: SmoothOptions) -> (HeadlessHost, SmoothScroll, ElementId) {
        let host = HeadlessHost::new(Size::new(1000.0, 800.0), Size::new(3000.0, 5000.0));
        let body = host.add_element(None, Rect::new(0.0, 0.0, 3000.0, 5000.0));
        let options = Options {
            smooth: Some(smooth),
            ..Default::default()
        };
        let config = resolve(&options, &host);
        let engine = SmoothScroll::new(&config, &host);
        (host, engine, body)
    }

    #[test]
    fn test_construction_attaches_and_destroy_detaches() {
        let (host, mut engine, _) = engine_with(SmoothOptions::default());
        assert_eq!(host.live_listeners(), 2);
        engine.destroy(&host);
        assert_eq!(host.live_listeners(), 0);
    }

    #[test]
    fn test_lerp_mode_converges_on_target() {
        let (host, mut engine, body) = engine_with(SmoothOptions::default());
        let zones = ZoneRegistry::new();

        let disposition = engine.handle_input(&ScrollInput::wheel(body, 0.0, 400.0), &zones, &host);
        assert_eq!(disposition.vertical, Handling::Smoothed);
        assert_eq!(disposition.horizontal, Handling::Ignored);
        assert!(disposition.prevents_default());
        assert_eq!(engine.target().y, 400.0);

        let mut prev = 0.0;
        for frame in 0..240 {
            engine.tick(frame as f64 * 16.0, &host);
            let y = engine.position().y;
            assert!(y >= prev);
            prev = y;
        }
        assert_eq!(engine.position().y, 400.0);
        assert_eq!(host.scroll_position().y, 400.0);
        assert!(!engine.is_scrolling());
    }

    #[test]
    fn test_duration_mode_reaches_target_after_duration() {
        let (host, mut engine, body) = engine_with(SmoothOptions {
            lerp: Some(0.0),
            duration: Some(0.5),
            easing: Some("linear".to_string()),
            ..Default::default()
        });
        let zones = ZoneRegistry::new();
        assert_eq!(engine.config().lerp, None);
        engine.handle_input(&ScrollInput::wheel(body, 0.0, 200.0), &zones, &host);

        engine.tick(1000.0, &host);
        assert_eq!(engine.position().y, 0.0);
        engine.tick(1250.0, &host);
        assert!((engine.position().y - 100.0).abs() < 1e-6);
        engine.tick(1500.0, &host);
        assert_eq!(engine.position().y, 200.0);
        assert!(!engine.is_scrolling());
    }

    #[test]
    fn test_target_is_clamped_to_limits() {
        let (host, mut engine, body) = engine_with(SmoothOptions::default());
        let zones = ZoneRegistry::new();
        engine.handle_input(&ScrollInput::wheel(body, 0.0, 99_999.0), &zones, &host);
        assert_eq!(engine.target().y, 4200.0);
        engine.handle_input(&ScrollInput::wheel(body, 0.0, -200_000.0), &zones, &host);
        assert_eq!(engine.target().y, 0.0);
    }

    #[test]
    fn test_vertical_zone_leaves_horizontal_smoothing_active() {
        let (host, mut engine, body) = engine_with(SmoothOptions {
            orientation: Some(Orientation::Both),
            gesture_orientation: Some(Orientation::Both),
            ..Default::default()
        });
        let panel = host.add_element(Some(body), Rect::new(0.0, 100.0, 300.0, 300.0));
        let inner = host.add_element(Some(panel), Rect::new(0.0, 120.0, 300.0, 50.0));
        let mut zones = ZoneRegistry::new();
        zones.register(panel, Orientation::Vertical);

        let inside = engine.handle_input(&ScrollInput::wheel(inner, 30.0, 50.0), &zones, &host);
        assert_eq!(inside.for_axis(Axis::Vertical), Handling::Native);
        assert_eq!(inside.for_axis(Axis::Horizontal), Handling::Smoothed);

        let outside = engine.handle_input(&ScrollInput::wheel(body, 30.0, 50.0), &zones, &host);
        assert_eq!(outside.vertical, Handling::Smoothed);
        assert_eq!(outside.horizontal, Handling::Smoothed);

        // Only the event outside the zone moved the vertical target
        assert_eq!(engine.target().y, 50.0);
        assert_eq!(engine.target().x, 60.0);
    }

    #[test]
    fn test_touch_is_native_unless_synced() {
        let (host, mut engine, body) = engine_with(SmoothOptions::default());
        let zones = ZoneRegistry::new();
        let d = engine.handle_input(&ScrollInput::touch(body, 0.0, 40.0), &zones, &host);
        assert_eq!(
            d,
            InputDisposition {
                vertical: Handling::Native,
                horizontal: Handling::Ignored,
            }
        );
        assert!(!d.prevents_default());

        let (host, mut engine, body) = engine_with(SmoothOptions {
            sync_touch: Some(true),
            touch_multiplier: Some(2.0),
            ..Default::default()
        });
        let d = engine.handle_input(&ScrollInput::touch(body, 0.0, 40.0), &zones, &host);
        assert_eq!(d.vertical, Handling::Smoothed);
        assert_eq!(engine.target().y, 80.0);
    }

    #[test]
    fn test_touch_is_never_synced_on_coarse_pointer() {
        let host = HeadlessHost::new(Size::new(1000.0, 800.0), Size::new(1000.0, 5000.0))
            .with_coarse_pointer(true);
        let body = host.add_element(None, Rect::new(0.0, 0.0, 1000.0, 5000.0));
        let options = Options {
            smooth: Some(SmoothOptions {
                sync_touch: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = resolve(&options, &host);
        let mut engine = SmoothScroll::new(&config, &host);
        let zones = ZoneRegistry::new();

        let touch = engine.handle_input(&ScrollInput::touch(body, 0.0, 40.0), &zones, &host);
        assert_eq!(touch.vertical, Handling::Native);
        assert!(!touch.prevents_default());
        assert_eq!(engine.target().y, 0.0);

        // Wheel input on the same device is still smoothed
        let wheel = engine.handle_input(&ScrollInput::wheel(body, 0.0, 40.0), &zones, &host);
        assert_eq!(wheel.vertical, Handling::Smoothed);
    }

    #[test]
    fn test_stopped_engine_blocks_input() {
        let (host, mut engine, body) = engine_with(SmoothOptions::default());
        let zones = ZoneRegistry::new();
        engine.stop();
        assert!(engine.is_stopped());
        let d = engine.handle_input(&ScrollInput::wheel(body, 0.0, 100.0), &zones, &host);
        assert_eq!(d.vertical, Handling::Blocked);
        assert_eq!(engine.target().y, 0.0);

        engine.start();
        assert!(!engine.is_stopped());
        let d = engine.handle_input(&ScrollInput::wheel(body, 0.0, 100.0), &zones, &host);
        assert_eq!(d.vertical, Handling::Smoothed);
    }

    #[test]
    fn test_immediate_scroll_to() {
        let (host, mut engine, _) = engine_with(SmoothOptions::default());
        engine.scroll_to(ScrollPosition { x: 0.0, y: 1234.0 }, true, &host);
        assert_eq!(engine.position().y, 1234.0);
        assert_eq!(host.scroll_position().y, 1234.0);
        assert!(engine.tick(0.0, &host).is_none());
    }

    #[test]
    fn test_resize_reclamps_target() {
        let (host, mut engine, _) = engine_with(SmoothOptions::default());
        engine.scroll_to(ScrollPosition { x: 0.0, y: 4000.0 }, true, &host);
        host.set_content_size(Size::new(3000.0, 2000.0));
        engine.resize(&host);
        assert_eq!(engine.target().y, 1200.0);
    }
}
