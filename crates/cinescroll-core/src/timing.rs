//! Time calculation utilities for scroll animations
//!
//! Everything here works on caller-supplied timestamps in milliseconds so that
//! frames can be pumped manually and replayed deterministically.

/// Calculate animation progress (0.0 to 1.0) from start and current timestamps
///
/// # Arguments
/// * `start_ms` - Timestamp the animation started at
/// * `now_ms` - Current frame timestamp
/// * `duration_ms` - Total animation duration
///
/// # Returns
/// Progress value clamped to [0.0, 1.0]
#[inline]
pub fn progress(start_ms: f64, now_ms: f64, duration_ms: f64) -> f64 {
    if duration_ms <= 0.0 {
        return 1.0;
    }
    ((now_ms - start_ms) / duration_ms).clamp(0.0, 1.0)
}

/// Check if animation is complete
#[inline]
pub fn is_complete(start_ms: f64, now_ms: f64, duration_ms: f64) -> bool {
    now_ms - start_ms >= duration_ms
}

/// Linear interpolation between two values
///
/// # Arguments
/// * `from` - Start value
/// * `to` - End value
/// * `t` - Interpolation factor [0.0, 1.0]
#[inline]
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// Frame-rate independent exponential smoothing towards `to`
///
/// `lambda` is the smoothing rate per second; `dt_secs` the elapsed frame time.
#[inline]
pub fn damp(from: f64, to: f64, lambda: f64, dt_secs: f64) -> f64 {
    lerp(from, to, 1.0 - (-lambda * dt_secs).exp())
}

/// Normalized position of `value` within `[start, end]`, clamped to [0, 1]
#[inline]
pub fn normalize(value: f64, start: f64, end: f64) -> f64 {
    let span = end - start;
    if span <= 0.0 {
        return if value >= end { 1.0 } else { 0.0 };
    }
    ((value - start) / span).clamp(0.0, 1.0)
}
