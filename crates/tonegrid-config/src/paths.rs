//! Per-user locations for presets and settings.
//!
//! # Directory Structure
//!
//! - **Config**: `~/.config/tonegrid/` (Linux), `~/Library/Application Support/tonegrid/` (macOS), `%APPDATA%\tonegrid\` (Windows)
//! - **Presets**: `<config>/presets/*.json`
//! - **Settings**: `<config>/settings.toml`
//!
//! When the platform config directory cannot be determined, paths are
//! relative to the current directory.
//!
//! # Example
//!
//! ```rust,no_run
//! use tonegrid_config::paths;
//!
//! println!("presets live in {:?}", paths::user_presets_dir());
//!
//! if let Some(path) = paths::find_preset("glass_pad") {
//!     println!("found {:?}", path);
//! }
//! ```

use std::path::{Path, PathBuf};

const APP_NAME: &str = "tonegrid";
const PRESETS_SUBDIR: &str = "presets";
const SETTINGS_FILE: &str = "settings.toml";
const PRESET_EXTENSION: &str = "json";

/// Per-user configuration directory.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Per-user presets directory.
pub fn user_presets_dir() -> PathBuf {
    user_config_dir().join(PRESETS_SUBDIR)
}

/// Location of the settings file.
pub fn settings_path() -> PathBuf {
    user_config_dir().join(SETTINGS_FILE)
}

/// Find a preset file by name or path.
///
/// `name` may be a path to an existing file, or a preset name with or
/// without the `.json` extension, looked up in [`user_presets_dir`].
pub fn find_preset(name: &str) -> Option<PathBuf> {
    find_preset_in(name, &user_presets_dir())
}

fn find_preset_in(name: &str, dir: &Path) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }

    let filename = if path.extension().is_some_and(|ext| ext == PRESET_EXTENSION) {
        name.to_string()
    } else {
        format!("{name}.{PRESET_EXTENSION}")
    };
    let candidate = dir.join(filename);
    candidate.is_file().then_some(candidate)
}

/// Create the presets directory if needed and return it.
pub fn ensure_user_presets_dir() -> Result<PathBuf, crate::ConfigError> {
    ensure_dir(user_presets_dir())
}

/// Create the config directory if needed and return it.
pub fn ensure_user_config_dir() -> Result<PathBuf, crate::ConfigError> {
    ensure_dir(user_config_dir())
}

fn ensure_dir(dir: PathBuf) -> Result<PathBuf, crate::ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| crate::ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

/// Preset files in the user presets directory, sorted by path.
///
/// Empty if the directory is missing or unreadable.
pub fn list_user_presets() -> Vec<PathBuf> {
    list_presets_in_dir(&user_presets_dir())
}

fn list_presets_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut presets: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == PRESET_EXTENSION))
        .collect();
    presets.sort();
    presets
}

/// File stem of a preset path.
///
/// ```rust
/// use std::path::Path;
/// use tonegrid_config::paths::preset_name_from_path;
///
/// let name = preset_name_from_path(Path::new("/presets/glass_pad.json"));
/// assert_eq!(name.as_deref(), Some("glass_pad"));
/// ```
pub fn preset_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn paths_live_under_app_dir() {
        assert!(user_config_dir().ends_with("tonegrid"));
        assert!(user_presets_dir().ends_with("tonegrid/presets"));
        assert!(settings_path().ends_with("tonegrid/settings.toml"));
    }

    #[test]
    fn find_by_existing_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lead.json");
        fs::write(&path, "{}").unwrap();
        assert_eq!(find_preset(path.to_str().unwrap()), Some(path));
    }

    #[test]
    fn find_by_name_adds_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lead.json");
        fs::write(&path, "{}").unwrap();
        assert_eq!(find_preset_in("lead", dir.path()), Some(path.clone()));
        assert_eq!(find_preset_in("lead.json", dir.path()), Some(path));
        assert_eq!(find_preset_in("bass", dir.path()), None);
    }

    #[test]
    fn listing_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("folder.json")).unwrap();

        let names: Vec<_> = list_presets_in_dir(dir.path())
            .iter()
            .filter_map(|p| preset_name_from_path(p))
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn listing_missing_dir_is_empty() {
        assert!(list_presets_in_dir(Path::new("/nonexistent/tonegrid/12345")).is_empty());
    }
}
