#![forbid(unsafe_code)]

//! Policy-as-data configuration for story playback.
//!
//! Captures every tunable of the engine (item duration, gesture thresholds,
//! runtime frame interval) as a single [`StoryConfig`] that can be loaded
//! from TOML or JSON at startup.
//!
//! # Loading
//!
//! ```toml
//! # stories.toml
//! [playback]
//! item_duration_ms = 5000
//!
//! [gesture]
//! swipe_threshold = 60.0
//! viewport_width = 412.0
//! ```
//!
//! ```rust,ignore
//! let config = StoryConfig::from_toml_file("stories.toml")?;
//! ```
//!
//! # Defaults
//!
//! `StoryConfig::default()` validates clean and matches the behavior the
//! engine ships with.

#[cfg(feature = "config")]
use std::path::Path;
use std::time::Duration;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct StoryConfig {
    pub playback: PlaybackConfig,
    pub gesture: GestureConfig,
    pub runtime: RuntimeConfig,
}

impl StoryConfig {
    /// Load from a TOML string and validate.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.validated()
    }

    /// Load from a TOML file on disk and validate.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string and validate.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.validated()
    }

    /// Check every parameter is within range.
    ///
    /// An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.playback.item_duration_ms == 0 {
            errors.push("playback.item_duration_ms must be > 0".into());
        }

        let g = &self.gesture;
        for (name, value) in [
            ("gesture.swipe_threshold", g.swipe_threshold),
            ("gesture.down_threshold", g.down_threshold),
            ("gesture.tap_tolerance", g.tap_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{name} must be finite and >= 0, got {value}"));
            }
        }
        if !g.viewport_width.is_finite() || g.viewport_width <= 0.0 {
            errors.push(format!(
                "gesture.viewport_width must be finite and > 0, got {}",
                g.viewport_width
            ));
        }
        if g.tap_tolerance > g.swipe_threshold {
            errors.push(format!(
                "gesture.tap_tolerance ({}) must not exceed gesture.swipe_threshold ({})",
                g.tap_tolerance, g.swipe_threshold
            ));
        }

        if self.runtime.frame_interval_ms == 0 {
            errors.push("runtime.frame_interval_ms must be > 0".into());
        }

        errors
    }

    #[cfg(feature = "config")]
    fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Item timing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct PlaybackConfig {
    /// Display time of one item (ms). Default: 6000.
    pub item_duration_ms: u64,
}

impl PlaybackConfig {
    #[must_use]
    pub fn item_duration(&self) -> Duration {
        Duration::from_millis(self.item_duration_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            item_duration_ms: 6000,
        }
    }
}

/// Gesture classification thresholds, in pointer units (logical pixels).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct GestureConfig {
    /// Minimum horizontal travel for a group swipe. Default: 60.
    pub swipe_threshold: f32,
    /// Minimum downward travel for swipe-to-close. Default: 100.
    pub down_threshold: f32,
    /// Maximum travel on either axis that still counts as a tap. Default: 10.
    pub tap_tolerance: f32,
    /// Width of the story viewport; taps in the left third go back. Default: 390.
    pub viewport_width: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            swipe_threshold: 60.0,
            down_threshold: 100.0,
            tap_tolerance: 10.0,
            viewport_width: 390.0,
        }
    }
}

/// Host loop parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct RuntimeConfig {
    /// Interval of the frame tick subscription (ms). Default: 16.
    pub frame_interval_ms: u64,
}

impl RuntimeConfig {
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
