//! Pure easing functions and the named easing registry
//!
//! Every easing maps input [0, 1] to output [0, 1]. Names follow the
//! `family.mode` convention (`power2.out`, `expo.inOut`); a bare family name
//! means its `out` variant.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Which end of the curve is eased
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EaseMode {
    In,
    Out,
    InOut,
}

/// A named easing curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Easing {
    /// Jump straight to the end at t=1
    None,
    Linear,
    /// Polynomial easing: power N uses exponent N + 1
    Power(u8, EaseMode),
    Sine(EaseMode),
    Expo(EaseMode),
    Circ(EaseMode),
    /// Exponential curve used by the smooth-scroll engine by default
    ScrollOut,
}

/// Every name the registry resolves, in listing order
const REGISTRY: &[(&str, Easing)] = &[
    ("none", Easing::None),
    ("linear", Easing::Linear),
    ("power1.in", Easing::Power(1, EaseMode::In)),
    ("power1.out", Easing::Power(1, EaseMode::Out)),
    ("power1.inOut", Easing::Power(1, EaseMode::InOut)),
    ("power2.in", Easing::Power(2, EaseMode::In)),
    ("power2.out", Easing::Power(2, EaseMode::Out)),
    ("power2.inOut", Easing::Power(2, EaseMode::InOut)),
    ("power3.in", Easing::Power(3, EaseMode::In)),
    ("power3.out", Easing::Power(3, EaseMode::Out)),
    ("power3.inOut", Easing::Power(3, EaseMode::InOut)),
    ("power4.in", Easing::Power(4, EaseMode::In)),
    ("power4.out", Easing::Power(4, EaseMode::Out)),
    ("power4.inOut", Easing::Power(4, EaseMode::InOut)),
    ("sine.in", Easing::Sine(EaseMode::In)),
    ("sine.out", Easing::Sine(EaseMode::Out)),
    ("sine.inOut", Easing::Sine(EaseMode::InOut)),
    ("expo.in", Easing::Expo(EaseMode::In)),
    ("expo.out", Easing::Expo(EaseMode::Out)),
    ("expo.inOut", Easing::Expo(EaseMode::InOut)),
    ("circ.in", Easing::Circ(EaseMode::In)),
    ("circ.out", Easing::Circ(EaseMode::Out)),
    ("circ.inOut", Easing::Circ(EaseMode::InOut)),
    ("scroll.out", Easing::ScrollOut),
];

impl Easing {
    /// Look up an easing by its registered name
    ///
    /// Bare family names (`power3`, `expo`) resolve to the `out` variant.
    pub fn from_name(name: &str) -> Result<Self> {
        let name = name.trim();
        if let Some((_, easing)) = REGISTRY.iter().find(|(n, _)| *n == name) {
            return Ok(*easing);
        }
        let with_mode = format!("{name}.out");
        REGISTRY
            .iter()
            .find(|(n, _)| *n == with_mode)
            .map(|(_, easing)| *easing)
            .ok_or_else(|| Error::UnknownEasing(name.to_string()))
    }

    /// Resolve a name, falling back to [`Easing::Linear`] with a warning
    ///
    /// Returns the easing and whether the fallback was used.
    pub fn from_name_or_linear(name: &str) -> (Self, bool) {
        match Self::from_name(name) {
            Ok(easing) => (easing, false),
            Err(e) => {
                tracing::warn!(easing = name, "{}, falling back to linear", e);
                (Easing::Linear, true)
            }
        }
    }

    /// All registered easing names
    pub fn names() -> impl Iterator<Item = &'static str> {
        REGISTRY.iter().map(|(n, _)| *n)
    }

    /// The canonical registered name of this easing
    pub fn name(&self) -> &'static str {
        REGISTRY
            .iter()
            .find(|(_, e)| e == self)
            .map(|(n, _)| *n)
            .unwrap_or("linear")
    }

    /// Apply the easing function to a progress value
    ///
    /// Input is clamped to [0, 1].
    #[inline]
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Easing::None => {
                if t < 1.0 {
                    0.0
                } else {
                    1.0
                }
            }
            Easing::Linear => t,
            Easing::Power(n, mode) => with_mode(mode, t, |x| x.powi(i32::from(n) + 1)),
            Easing::Sine(mode) => {
                with_mode(mode, t, |x| 1.0 - (x * std::f64::consts::FRAC_PI_2).cos())
            }
            Easing::Expo(mode) => with_mode(mode, t, |x| {
                if x <= 0.0 {
                    0.0
                } else {
                    2.0_f64.powf(10.0 * (x - 1.0))
                }
            }),
            Easing::Circ(mode) => with_mode(mode, t, |x| 1.0 - (1.0 - x * x).max(0.0).sqrt()),
            Easing::ScrollOut => scroll_ease_out(t),
        }
    }
}

impl Default for Easing {
    fn default() -> Self {
        Easing::ScrollOut
    }
}

impl FromStr for Easing {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl serde::Serialize for Easing {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build in/out/inOut variants from an ease-in curve
#[inline]
fn with_mode(mode: EaseMode, t: f64, ease_in: impl Fn(f64) -> f64) -> f64 {
    match mode {
        EaseMode::In => ease_in(t),
        EaseMode::Out => 1.0 - ease_in(1.0 - t),
        EaseMode::InOut => {
            if t < 0.5 {
                ease_in(t * 2.0) / 2.0
            } else {
                1.0 - ease_in((1.0 - t) * 2.0) / 2.0
            }
        }
    }
}

/// Exponential ease-out: f(t) = 1.001 - 2^(-10t), capped at 1
#[inline]
fn scroll_ease_out(t: f64) -> f64 {
    if t >= 1.0 {
        1.0
    } else {
        (1.001 - 2.0_f64.powf(-10.0 * t)).clamp(0.0, 1.0)
    }
}
