//! Error types for presets and settings.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading, saving or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Preset document is not valid JSON or misses a field
    #[error("failed to parse preset: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Settings file is not valid TOML
    #[error("failed to parse settings: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Settings could not be serialized
    #[error("failed to serialize settings: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// No factory or user preset with that name
    #[error("preset not found: {0}")]
    PresetNotFound(String),

    /// Preset names an oscillator type that does not exist
    #[error("unknown oscillator type '{name}' for {field}")]
    UnknownOscillator {
        /// Preset field, `osc_a` or `osc_b`.
        field: &'static str,
        /// The rejected name.
        name: String,
    },

    /// A value that cannot be used even after clamping
    #[error("invalid parameter '{param}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        param: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn missing() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn io_helpers_keep_path_and_source() {
        let err = ConfigError::read_file("/a/pad.json", missing());
        assert!(matches!(err, ConfigError::ReadFile { ref path, .. } if path.ends_with("pad.json")));
        assert!(err.to_string().contains("/a/pad.json"));
        assert!(err.source().is_some());

        let err = ConfigError::write_file("/b/out.json", missing());
        assert!(err.to_string().starts_with("failed to write file"));

        let err = ConfigError::create_dir("/c", missing());
        assert!(err.to_string().starts_with("failed to create directory"));
        assert!(err.source().is_some());
    }

    #[test]
    fn unknown_oscillator_display() {
        let err = ConfigError::UnknownOscillator {
            field: "osc_b",
            name: "theremin".to_string(),
        };
        assert_eq!(err.to_string(), "unknown oscillator type 'theremin' for osc_b");
        assert!(err.source().is_none());
    }

    #[test]
    fn json_errors_convert() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{ nope");
        let err: ConfigError = parse.unwrap_err().into();
        assert!(matches!(err, ConfigError::JsonParse(_)));
        assert!(err.to_string().starts_with("failed to parse preset"));
    }

    #[test]
    fn preset_not_found_display() {
        let err = ConfigError::PresetNotFound("glass".to_string());
        assert_eq!(err.to_string(), "preset not found: glass");
    }
}
