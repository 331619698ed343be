//! Factory presets compiled into the library.
//!
//! Always available without any files on disk, and a starting point for
//! user presets (`tonegrid presets export`).

use crate::PatchPreset;

/// Internal identifiers of the factory presets.
pub static FACTORY_PRESET_NAMES: &[&str] = &[
    "init",
    "glass_pad",
    "pluck",
    "grain_choir",
    "sub_bass",
    "morph_drift",
    "organ",
    "fuzz_lead",
];

/// JSON source for each factory preset, embedded at compile time.
static FACTORY_PRESETS_JSON: &[(&str, &str)] = &[
    ("init", INIT_PRESET),
    ("glass_pad", GLASS_PAD_PRESET),
    ("pluck", PLUCK_PRESET),
    ("grain_choir", GRAIN_CHOIR_PRESET),
    ("sub_bass", SUB_BASS_PRESET),
    ("morph_drift", MORPH_DRIFT_PRESET),
    ("organ", ORGAN_PRESET),
    ("fuzz_lead", FUZZ_LEAD_PRESET),
];

const INIT_PRESET: &str = r#"{
  "name": "Init",
  "description": "Plain sine, default envelope, nothing else",
  "osc_a": "sine", "osc_b": "sine", "osc_mix": 0.0,
  "attack": 0.01, "decay": 0.1, "sustain": 0.7, "release": 0.2,
  "filter_smoothing": 1.0, "drive": 1.0,
  "grain_enabled": false, "grain_rate": 10.0, "grain_duty": 0.5, "grain_jitter": 0.0
}"#;

const GLASS_PAD_PRESET: &str = r#"{
  "name": "Glass Pad",
  "description": "Slow triangle and half-sine pad with a soft top",
  "osc_a": "triangle", "osc_b": "half_sine", "osc_mix": 0.35,
  "attack": 0.6, "decay": 0.4, "sustain": 0.8, "release": 1.5,
  "filter_smoothing": 0.3, "drive": 1.2,
  "grain_enabled": false, "grain_rate": 10.0, "grain_duty": 0.5, "grain_jitter": 0.0
}"#;

const PLUCK_PRESET: &str = r#"{
  "name": "Pluck",
  "description": "Short saw pluck with no sustain",
  "osc_a": "saw", "osc_b": "pulse", "osc_mix": 0.2,
  "attack": 0.002, "decay": 0.18, "sustain": 0.0, "release": 0.12,
  "filter_smoothing": 0.5, "drive": 1.5,
  "grain_enabled": false, "grain_rate": 10.0, "grain_duty": 0.5, "grain_jitter": 0.0
}"#;

const GRAIN_CHOIR_PRESET: &str = r#"{
  "name": "Grain Choir",
  "description": "Custom wavetable chopped by a jittered grain gate",
  "osc_a": "custom", "osc_b": "sine", "osc_mix": 0.25,
  "attack": 0.3, "decay": 0.2, "sustain": 0.75, "release": 0.9,
  "filter_smoothing": 0.6, "drive": 1.0,
  "grain_enabled": true, "grain_rate": 22.0, "grain_duty": 0.55, "grain_jitter": 0.35
}"#;

const SUB_BASS_PRESET: &str = r#"{
  "name": "Sub Bass",
  "description": "Square an octave down blended with sine",
  "osc_a": "sub", "osc_b": "sine", "osc_mix": 0.5,
  "attack": 0.005, "decay": 0.2, "sustain": 0.9, "release": 0.15,
  "filter_smoothing": 0.15, "drive": 2.0,
  "grain_enabled": false, "grain_rate": 10.0, "grain_duty": 0.5, "grain_jitter": 0.0
}"#;

const MORPH_DRIFT_PRESET: &str = r#"{
  "name": "Morph Drift",
  "description": "Four-shape morph bank slowly cycling under a grain flutter",
  "osc_a": "morph", "osc_b": "triangle", "osc_mix": 0.1,
  "attack": 0.25, "decay": 0.3, "sustain": 0.7, "release": 0.8,
  "filter_smoothing": 0.45, "drive": 1.4,
  "grain_enabled": true, "grain_rate": 6.0, "grain_duty": 0.8, "grain_jitter": 0.2
}"#;

const ORGAN_PRESET: &str = r#"{
  "name": "Organ",
  "description": "Wavetable organ with instant attack and full sustain",
  "osc_a": "custom", "osc_b": "square", "osc_mix": 0.15,
  "attack": 0.003, "decay": 0.01, "sustain": 1.0, "release": 0.05,
  "filter_smoothing": 0.7, "drive": 1.1,
  "grain_enabled": false, "grain_rate": 10.0, "grain_duty": 0.5, "grain_jitter": 0.0
}"#;

const FUZZ_LEAD_PRESET: &str = r#"{
  "name": "Fuzz Lead",
  "description": "Hard-driven square and saw lead",
  "osc_a": "square", "osc_b": "saw", "osc_mix": 0.5,
  "attack": 0.01, "decay": 0.15, "sustain": 0.8, "release": 0.25,
  "filter_smoothing": 0.35, "drive": 8.0,
  "grain_enabled": false, "grain_rate": 10.0, "grain_duty": 0.5, "grain_jitter": 0.0
}"#;

/// All factory presets.
///
/// # Example
///
/// ```rust
/// use tonegrid_config::factory_presets;
///
/// for preset in factory_presets() {
///     println!("{}: {}", preset.name, preset.description.as_deref().unwrap_or(""));
/// }
/// ```
pub fn factory_presets() -> Vec<PatchPreset> {
    FACTORY_PRESETS_JSON
        .iter()
        .filter_map(|(_, json)| PatchPreset::from_json(json).ok())
        .collect()
}

/// Look up a factory preset by identifier or display name, case-insensitively.
///
/// ```rust
/// use tonegrid_config::get_factory_preset;
///
/// assert_eq!(get_factory_preset("glass_pad").unwrap().name, "Glass Pad");
/// assert_eq!(get_factory_preset("Glass Pad").unwrap().name, "Glass Pad");
/// assert!(get_factory_preset("theremin").is_none());
/// ```
pub fn get_factory_preset(name: &str) -> Option<PatchPreset> {
    let wanted = name.trim();

    if let Some((_, json)) = FACTORY_PRESETS_JSON
        .iter()
        .find(|(id, _)| id.eq_ignore_ascii_case(wanted))
    {
        return PatchPreset::from_json(json).ok();
    }

    factory_presets()
        .into_iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(wanted))
}

/// Identifiers of every factory preset.
pub fn factory_preset_names() -> Vec<&'static str> {
    FACTORY_PRESETS_JSON.iter().map(|(name, _)| *name).collect()
}

/// `true` if `name` matches a factory preset identifier or display name.
pub fn is_factory_preset(name: &str) -> bool {
    get_factory_preset(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_factory_preset_parses_and_validates() {
        for (id, json) in FACTORY_PRESETS_JSON {
            let preset = PatchPreset::from_json(json)
                .unwrap_or_else(|e| panic!("factory preset '{id}' should parse: {e}"));
            assert!(preset.validate().is_ok(), "{id}");
            assert!(preset.description.is_some(), "{id} should have a description");
        }
        assert_eq!(factory_presets().len(), FACTORY_PRESETS_JSON.len());
    }

    #[test]
    fn every_factory_preset_applies_cleanly() {
        for preset in factory_presets() {
            let (_, warnings) = preset.to_timbre();
            assert!(warnings.is_empty(), "{}: {warnings:?}", preset.name);
        }
    }

    #[test]
    fn names_table_matches_presets() {
        assert_eq!(factory_preset_names(), FACTORY_PRESET_NAMES.to_vec());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(get_factory_preset("PLUCK").unwrap().name, "Pluck");
        assert_eq!(get_factory_preset("sub bass").unwrap().name, "Sub Bass");
        assert!(is_factory_preset("Init"));
        assert!(!is_factory_preset("my_custom_preset"));
    }

    #[test]
    fn grain_presets_enable_the_gate() {
        let (timbre, _) = get_factory_preset("grain_choir").unwrap().to_timbre();
        assert!(timbre.grain.is_some());
        let (timbre, _) = get_factory_preset("init").unwrap().to_timbre();
        assert!(timbre.grain.is_none());
    }
}
