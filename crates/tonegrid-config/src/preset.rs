//! Patch preset file format.

use serde::{Deserialize, Serialize};
use std::path::Path;

use tonegrid_synth::{FilterSettings, GrainSettings, OscillatorType, Timbre};

use crate::error::ConfigError;

/// A flat, serializable copy of the settings in a [`Timbre`].
///
/// Presets are JSON documents. Every field except `description` is required,
/// so a truncated or hand-edited file fails to load instead of silently
/// falling back to defaults.
///
/// # JSON Format
///
/// ```json
/// {
///   "name": "Glass Pad",
///   "description": "Slow triangle pad",
///   "osc_a": "triangle",
///   "osc_b": "sine",
///   "osc_mix": 0.3,
///   "attack": 0.4,
///   "decay": 0.3,
///   "sustain": 0.8,
///   "release": 1.2,
///   "filter_smoothing": 0.35,
///   "drive": 1.2,
///   "grain_enabled": false,
///   "grain_rate": 10.0,
///   "grain_duty": 0.5,
///   "grain_jitter": 0.0
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatchPreset {
    /// Display name.
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// First oscillator type name.
    pub osc_a: String,
    /// Second oscillator type name.
    pub osc_b: String,
    /// Blend from A (0) to B (1).
    pub osc_mix: f32,

    /// Attack in seconds.
    pub attack: f32,
    /// Decay in seconds.
    pub decay: f32,
    /// Sustain level.
    pub sustain: f32,
    /// Release in seconds.
    pub release: f32,

    /// One-pole smoothing coefficient, 1 bypasses.
    pub filter_smoothing: f32,
    /// tanh drive.
    pub drive: f32,

    /// Whether voices get a grain gate.
    pub grain_enabled: bool,
    /// Grains per second.
    pub grain_rate: f32,
    /// Open fraction of each grain.
    pub grain_duty: f32,
    /// Per-grain random spread.
    pub grain_jitter: f32,
}

impl PatchPreset {
    /// Preset holding the default timbre.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_timbre(name, &Timbre::default())
    }

    /// Capture `timbre` under `name`.
    ///
    /// A ladder filter has no flat representation and is stored as a bypassed
    /// smoother.
    pub fn from_timbre(name: impl Into<String>, timbre: &Timbre) -> Self {
        let filter_smoothing = match timbre.filter {
            FilterSettings::Smoothing { smoothing } => smoothing,
            FilterSettings::Ladder { .. } => 1.0,
        };
        let grain = timbre.grain.unwrap_or(GrainSettings {
            rate: 10.0,
            duty: 0.5,
            jitter: 0.0,
        });
        Self {
            name: name.into(),
            description: None,
            osc_a: timbre.osc_a.oscillator_type().name().to_string(),
            osc_b: timbre.osc_b.oscillator_type().name().to_string(),
            osc_mix: timbre.osc_mix,
            attack: timbre.attack,
            decay: timbre.decay,
            sustain: timbre.sustain,
            release: timbre.release,
            filter_smoothing,
            drive: timbre.drive,
            grain_enabled: timbre.grain.is_some(),
            grain_rate: grain.rate,
            grain_duty: grain.duty,
            grain_jitter: grain.jitter,
        }
    }

    /// Builder: set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Write these settings into `timbre`.
    ///
    /// Unknown oscillator names leave that oscillator unchanged and are
    /// returned as [`ConfigError::UnknownOscillator`] warnings. Out-of-range
    /// numbers are clamped later, when voices are built.
    pub fn apply(&self, timbre: &mut Timbre) -> Vec<ConfigError> {
        let mut warnings = Vec::new();

        for (field, name, slot) in [
            ("osc_a", &self.osc_a, &mut timbre.osc_a),
            ("osc_b", &self.osc_b, &mut timbre.osc_b),
        ] {
            match name.parse::<OscillatorType>() {
                Ok(ty) => *slot = ty.build(),
                Err(err) => {
                    tracing::warn!(preset = %self.name, field, name = err.name(), "unknown oscillator type");
                    warnings.push(ConfigError::UnknownOscillator {
                        field,
                        name: err.name().to_string(),
                    });
                }
            }
        }

        timbre.osc_mix = self.osc_mix;
        timbre.attack = self.attack;
        timbre.decay = self.decay;
        timbre.sustain = self.sustain;
        timbre.release = self.release;
        timbre.filter = FilterSettings::Smoothing {
            smoothing: self.filter_smoothing,
        };
        timbre.drive = self.drive;
        timbre.grain = self.grain_enabled.then_some(GrainSettings {
            rate: self.grain_rate,
            duty: self.grain_duty,
            jitter: self.grain_jitter,
        });

        warnings
    }

    /// Default timbre with this preset applied.
    pub fn to_timbre(&self) -> (Timbre, Vec<ConfigError>) {
        let mut timbre = Timbre::default();
        let warnings = self.apply(&mut timbre);
        (timbre, warnings)
    }

    /// Reject values no clamp can rescue.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidParameter {
                param: "name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        let numbers = [
            ("osc_mix", self.osc_mix),
            ("attack", self.attack),
            ("decay", self.decay),
            ("sustain", self.sustain),
            ("release", self.release),
            ("filter_smoothing", self.filter_smoothing),
            ("drive", self.drive),
            ("grain_rate", self.grain_rate),
            ("grain_duty", self.grain_duty),
            ("grain_jitter", self.grain_jitter),
        ];
        for (param, value) in numbers {
            if !value.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    param: param.to_string(),
                    reason: format!("{value} is not a finite number"),
                });
            }
        }
        Ok(())
    }

    /// Load a preset from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let preset = Self::from_json(&content)?;
        tracing::debug!(name = %preset.name, path = %path.display(), "loaded preset");
        Ok(preset)
    }

    /// Resolve `name` to a preset: a file path, a user preset, then a
    /// factory preset.
    pub fn resolve(name: &str) -> Result<Self, ConfigError> {
        if let Some(path) = crate::paths::find_preset(name) {
            return Self::load(path);
        }
        crate::get_factory_preset(name).ok_or_else(|| ConfigError::PresetNotFound(name.to_string()))
    }

    /// Parse a preset from a JSON string.
    ///
    /// The parsed preset must pass [`PatchPreset::validate`], so anything
    /// that loads can also be saved.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let preset: Self = serde_json::from_str(json)?;
        preset.validate()?;
        Ok(preset)
    }

    /// Save the preset as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        self.validate()?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_json()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for PatchPreset {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
