//! Patch presets and user settings for the tonegrid synthesizer.
//!
//! # Features
//!
//! - **Patch presets**: JSON snapshots of a [`tonegrid_synth::Timbre`]
//! - **Factory presets**: a built-in bank available without any files
//! - **Settings**: sample rate, buffer size, device and tempo in TOML
//! - **Paths**: platform-specific config and preset directories
//!
//! # Example
//!
//! ```rust,no_run
//! use tonegrid_config::{PatchPreset, Settings, user_presets_dir};
//!
//! let settings = Settings::load().unwrap();
//! let preset = PatchPreset::resolve("glass_pad").unwrap();
//! let (timbre, warnings) = preset.to_timbre();
//! assert!(warnings.is_empty());
//!
//! let copy = PatchPreset::from_timbre("My Pad", &timbre);
//! copy.save(user_presets_dir().join("my_pad.json")).unwrap();
//! # let _ = settings;
//! ```

mod error;
mod preset;
mod settings;

/// Platform-specific paths for presets and settings.
pub mod paths;

/// Factory presets bundled with the library.
pub mod factory_presets;

pub use error::ConfigError;
pub use factory_presets::{
    FACTORY_PRESET_NAMES, factory_preset_names, factory_presets, get_factory_preset,
    is_factory_preset,
};
pub use paths::{
    ensure_user_config_dir, ensure_user_presets_dir, find_preset, list_user_presets,
    preset_name_from_path, settings_path, user_config_dir, user_presets_dir,
};
pub use preset::PatchPreset;
pub use settings::Settings;
