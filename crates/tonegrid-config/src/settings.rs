//! User settings stored as TOML.
//!
//! ```toml
//! sample_rate = 48000
//! buffer_size = 512
//! bpm = 120.0
//! output_device = "USB Audio"
//! default_preset = "glass_pad"
//! ```
//!
//! Every key is optional; missing keys take their default.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::paths;

/// Audio and session defaults for the command-line front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Frames per audio callback.
    pub buffer_size: u32,
    /// Output device name; `None` uses the system default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_device: Option<String>,
    /// Transport tempo.
    pub bpm: f32,
    /// Preset loaded when none is given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_preset: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 512,
            output_device: None,
            bpm: 120.0,
            default_preset: None,
        }
    }
}

impl Settings {
    /// Load from the user settings file, or defaults if it does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(paths::settings_path())
    }

    /// Load from `path`, or defaults if it does not exist.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let settings: Self = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save to the user settings file.
    pub fn save(&self) -> Result<(), ConfigError> {
        paths::ensure_user_config_dir()?;
        self.save_to(paths::settings_path())
    }

    /// Save to `path`.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        self.validate()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Reject values the audio backend cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(8000..=384_000).contains(&self.sample_rate) {
            return Err(ConfigError::InvalidParameter {
                param: "sample_rate".to_string(),
                reason: format!("{} Hz is outside 8000..=384000", self.sample_rate),
            });
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::InvalidParameter {
                param: "buffer_size".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                param: "bpm".to_string(),
                reason: format!("{} is not a positive tempo", self.bpm),
            });
        }
        Ok(())
    }
}
