use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::easing::Easing;
use crate::host::{Axis, Host};
use crate::triggers::TriggerKind;

/// Caller-supplied options, every field optional
///
/// Unknown keys are ignored when deserializing so older or newer option
/// files keep loading.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Options {
    /// Enable the smooth-scroll engine
    #[serde(default, deserialize_with = "lenient")]
    pub smooth_scroll: Option<bool>,
    /// Smooth-scroll engine tuning (merged one level deep)
    #[serde(default, deserialize_with = "lenient")]
    pub smooth: Option<SmoothOptions>,
    /// Enable scroll-triggered animations
    #[serde(default, deserialize_with = "lenient")]
    pub enable_scroll_trigger: Option<bool>,
    /// `true`, `false` or `"auto"` (follow the platform preference)
    #[serde(default, deserialize_with = "lenient")]
    pub reduced_motion: Option<ReducedMotion>,
    /// Keep full animations even when reduced motion resolves on
    #[serde(default, deserialize_with = "lenient")]
    pub force_animations: Option<bool>,
    /// Per-category animation toggles (merged one level deep)
    #[serde(default, deserialize_with = "lenient")]
    pub performance: Option<PerformanceOptions>,
    /// Skip smooth scrolling below `mobile_breakpoint`
    #[serde(default, deserialize_with = "lenient")]
    pub disable_on_mobile: Option<bool>,
    /// Viewport width in px under which the device counts as mobile
    #[serde(default, deserialize_with = "lenient")]
    pub mobile_breakpoint: Option<f64>,
    /// Verbose per-frame logging
    #[serde(default, deserialize_with = "lenient")]
    pub debug: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmoothOptions {
    /// Animation duration in seconds (used when `lerp` is 0)
    #[serde(default, deserialize_with = "lenient")]
    pub duration: Option<f64>,
    /// Easing name for duration-based scrolling
    #[serde(default, deserialize_with = "lenient")]
    pub easing: Option<String>,
    /// Damping factor in (0, 1]; 0 switches to duration + easing
    #[serde(default, deserialize_with = "lenient")]
    pub lerp: Option<f64>,
    /// Axes the page scrolls along
    #[serde(default, deserialize_with = "lenient")]
    pub orientation: Option<Orientation>,
    /// Input axes that drive scrolling
    #[serde(default, deserialize_with = "lenient")]
    pub gesture_orientation: Option<Orientation>,
    /// Smooth wheel input
    #[serde(default, deserialize_with = "lenient")]
    pub smooth_wheel: Option<bool>,
    /// Smooth touch input (never applied on coarse pointers)
    #[serde(default, deserialize_with = "lenient")]
    pub sync_touch: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub wheel_multiplier: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub touch_multiplier: Option<f64>,
    /// Own the frame loop instead of waiting for `tick`
    #[serde(default, deserialize_with = "lenient")]
    pub auto_raf: Option<bool>,
    /// Frame rate of the self-owned loop
    #[serde(default, deserialize_with = "lenient")]
    pub fps: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceOptions {
    #[serde(default, deserialize_with = "lenient")]
    pub parallax: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub fade_in: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub linked_values: Option<bool>,
}

/// Deserialize an optional field, treating a value of the wrong type or out
/// of range as absent so one bad entry does not reject the whole file
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = toml::Value::deserialize(deserializer)?;
    match value.clone().try_into::<T>() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            warn!(%value, error = %e, "Invalid option value, using default");
            Ok(None)
        }
    }
}

/// Reduced-motion mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReducedMotion {
    On,
    Off,
    /// Follow the platform preference, probed once at resolve time
    #[default]
    Auto,
}

impl Serialize for ReducedMotion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            ReducedMotion::On => serializer.serialize_bool(true),
            ReducedMotion::Off => serializer.serialize_bool(false),
            ReducedMotion::Auto => serializer.serialize_str("auto"),
        }
    }
}

// Accept either a boolean or the string "auto"
impl<'de> Deserialize<'de> for ReducedMotion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ReducedMotionVisitor;

        impl<'de> Visitor<'de> for ReducedMotionVisitor {
            type Value = ReducedMotion;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a boolean or the string \"auto\"")
            }

            fn visit_bool<E>(self, value: bool) -> Result<ReducedMotion, E>
            where
                E: de::Error,
            {
                Ok(if value {
                    ReducedMotion::On
                } else {
                    ReducedMotion::Off
                })
            }

            fn visit_str<E>(self, value: &str) -> Result<ReducedMotion, E>
            where
                E: de::Error,
            {
                match value.trim().to_ascii_lowercase().as_str() {
                    "true" | "on" | "reduce" => Ok(ReducedMotion::On),
                    "false" | "off" | "no-preference" => Ok(ReducedMotion::Off),
                    // Anything unrecognized follows the platform
                    _ => Ok(ReducedMotion::Auto),
                }
            }
        }

        deserializer.deserialize_any(ReducedMotionVisitor)
    }
}

/// A set of scroll axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
    Both,
}

impl Orientation {
    #[inline]
    pub fn covers(&self, axis: Axis) -> bool {
        matches!(
            (self, axis),
            (Orientation::Both, _)
                | (Orientation::Vertical, Axis::Vertical)
                | (Orientation::Horizontal, Axis::Horizontal)
        )
    }
}

/// Resolved smooth-scroll engine tuning
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmoothConfig {
    pub duration_secs: f64,
    pub easing: Easing,
    /// `None` selects duration + easing mode
    pub lerp: Option<f64>,
    pub orientation: Orientation,
    pub gesture_orientation: Orientation,
    pub smooth_wheel: bool,
    pub sync_touch: bool,
    pub wheel_multiplier: f64,
    pub touch_multiplier: f64,
    pub auto_raf: bool,
    pub fps: u32,
}

impl Default for SmoothConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_duration(),
            easing: Easing::default(),
            lerp: Some(default_lerp()),
            orientation: Orientation::Vertical,
            gesture_orientation: Orientation::Vertical,
            smooth_wheel: true,
            sync_touch: false,
            wheel_multiplier: 1.0,
            touch_multiplier: 1.0,
            auto_raf: true,
            fps: default_fps(),
        }
    }
}

impl SmoothConfig {
    /// Frame interval of the self-owned loop in milliseconds
    pub fn frame_interval_ms(&self) -> u64 {
        if self.fps == 0 {
            16 // ~60fps fallback
        } else {
            (1000 / u64::from(self.fps)).max(1)
        }
    }
}

/// Resolved per-category toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PerformanceConfig {
    pub parallax: bool,
    pub fade_in: bool,
    pub linked_values: bool,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            parallax: true,
            fade_in: true,
            linked_values: true,
        }
    }
}

impl PerformanceConfig {
    /// Whether animations of `kind` may be created
    pub fn allows(&self, kind: TriggerKind) -> bool {
        match kind {
            TriggerKind::Parallax => self.parallax,
            TriggerKind::FadeIn => self.fade_in,
            TriggerKind::LinkedValue => self.linked_values,
        }
    }
}

/// Platform signals frozen at resolve time
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Platform {
    pub prefers_reduced_motion: bool,
    pub coarse_pointer: bool,
    pub viewport_width: f64,
    pub is_mobile: bool,
}

/// Immutable configuration snapshot for one initialized lifetime
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub smooth_scroll: bool,
    pub smooth: SmoothConfig,
    pub enable_scroll_trigger: bool,
    /// Resolved reduced-motion flag
    pub reduced_motion: bool,
    pub force_animations: bool,
    pub performance: PerformanceConfig,
    pub disable_on_mobile: bool,
    pub mobile_breakpoint: f64,
    pub debug: bool,
    pub platform: Platform,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            smooth_scroll: true,
            smooth: SmoothConfig::default(),
            enable_scroll_trigger: true,
            reduced_motion: false,
            force_animations: false,
            performance: PerformanceConfig::default(),
            disable_on_mobile: true,
            mobile_breakpoint: default_mobile_breakpoint(),
            debug: false,
            platform: Platform::default(),
        }
    }
}

impl Config {
    /// Reduced motion applies (not overridden by `force_animations`)
    #[inline]
    pub fn motion_reduced(&self) -> bool {
        self.reduced_motion && !self.force_animations
    }

    /// Whether the smooth-scroll engine should be constructed
    pub fn smooth_scroll_active(&self) -> bool {
        self.smooth_scroll
            && !self.motion_reduced()
            && !(self.disable_on_mobile && self.platform.is_mobile)
    }

    /// Whether the animation trigger engine should be constructed
    #[inline]
    pub fn scroll_trigger_active(&self) -> bool {
        self.enable_scroll_trigger
    }

    /// Animation time scale: zero collapses every duration and delay
    #[inline]
    pub fn time_scale(&self) -> f64 {
        if self.motion_reduced() {
            0.0
        } else {
            1.0
        }
    }
}

fn default_duration() -> f64 {
    1.2
}

fn default_lerp() -> f64 {
    0.1
}

fn default_fps() -> u32 {
    60
}

fn default_mobile_breakpoint() -> f64 {
    768.0
}

/// Accept a finite number inside `[min, max]`, otherwise fall back to `default`
fn sanitize(field: &str, value: Option<f64>, default: f64, min: f64, max: f64) -> f64 {
    match value {
        None => default,
        Some(v) if v.is_finite() && v >= min && v <= max => v,
        Some(v) => {
            warn!(field, value = v, default, "Invalid option value, using default");
            default
        }
    }
}

/// Merge options over the defaults and freeze the platform probes
///
/// Never fails: invalid values are replaced by defaults and logged.
pub fn resolve(options: &Options, host: &dyn Host) -> Config {
    let defaults = Config::default();
    let smooth_defaults = defaults.smooth.clone();
    let smooth_options = options.smooth.clone().unwrap_or_default();
    let perf = options.performance.clone().unwrap_or_default();

    let easing = match smooth_options.easing.as_deref() {
        Some(name) => Easing::from_name_or_linear(name).0,
        None => smooth_defaults.easing,
    };

    let lerp = match smooth_options.lerp {
        Some(v) if v == 0.0 => None,
        other => Some(sanitize("smooth.lerp", other, default_lerp(), f64::MIN_POSITIVE, 1.0)),
    };

    let fps = match smooth_options.fps {
        Some(fps) if (1..=240).contains(&fps) => fps,
        Some(fps) => {
            warn!(field = "smooth.fps", value = fps, "Invalid option value, using default");
            default_fps()
        }
        None => default_fps(),
    };

    let smooth = SmoothConfig {
        duration_secs: sanitize(
            "smooth.duration",
            smooth_options.duration,
            default_duration(),
            0.0,
            60.0,
        ),
        easing,
        lerp,
        orientation: smooth_options
            .orientation
            .unwrap_or(smooth_defaults.orientation),
        gesture_orientation: smooth_options
            .gesture_orientation
            .unwrap_or(smooth_defaults.gesture_orientation),
        smooth_wheel: smooth_options
            .smooth_wheel
            .unwrap_or(smooth_defaults.smooth_wheel),
        sync_touch: smooth_options
            .sync_touch
            .unwrap_or(smooth_defaults.sync_touch),
        wheel_multiplier: sanitize(
            "smooth.wheel_multiplier",
            smooth_options.wheel_multiplier,
            1.0,
            0.0,
            100.0,
        ),
        touch_multiplier: sanitize(
            "smooth.touch_multiplier",
            smooth_options.touch_multiplier,
            1.0,
            0.0,
            100.0,
        ),
        auto_raf: smooth_options.auto_raf.unwrap_or(smooth_defaults.auto_raf),
        fps,
    };

    let mobile_breakpoint = sanitize(
        "mobile_breakpoint",
        options.mobile_breakpoint,
        default_mobile_breakpoint(),
        0.0,
        f64::MAX,
    );

    // Probe the platform exactly once; the snapshot is frozen into the config
    let prefers_reduced_motion = host.prefers_reduced_motion();
    let viewport_width = host.viewport().width;
    let platform = Platform {
        prefers_reduced_motion,
        coarse_pointer: host.coarse_pointer(),
        viewport_width,
        is_mobile: viewport_width < mobile_breakpoint,
    };

    let reduced_motion = match options.reduced_motion.unwrap_or_default() {
        ReducedMotion::On => true,
        ReducedMotion::Off => false,
        ReducedMotion::Auto => prefers_reduced_motion,
    };

    Config {
        smooth_scroll: options.smooth_scroll.unwrap_or(defaults.smooth_scroll),
        smooth,
        enable_scroll_trigger: options
            .enable_scroll_trigger
            .unwrap_or(defaults.enable_scroll_trigger),
        reduced_motion,
        force_animations: options.force_animations.unwrap_or(defaults.force_animations),
        performance: PerformanceConfig {
            parallax: perf.parallax.unwrap_or(defaults.performance.parallax),
            fade_in: perf.fade_in.unwrap_or(defaults.performance.fade_in),
            linked_values: perf
                .linked_values
                .unwrap_or(defaults.performance.linked_values),
        },
        disable_on_mobile: options
            .disable_on_mobile
            .unwrap_or(defaults.disable_on_mobile),
        mobile_breakpoint,
        debug: options.debug.unwrap_or(defaults.debug),
        platform,
    }
}

impl Options {
    /// Load options from the default file, or empty options if it is missing
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load options from a TOML file, or empty options if it is missing
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml_str(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse options from TOML text
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the options file path
    /// Always uses ~/.config/cinescroll/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("cinescroll")
            .join("config.toml")
    }
}
