//! Preset demo: list the factory bank, tweak a preset, save it and load it back.
//!
//! Run with: cargo run -p tonegrid-config --example preset_demo

use tonegrid_config::{PatchPreset, factory_preset_names, get_factory_preset, is_factory_preset};

fn main() {
    println!("=== Factory Presets ===\n");
    for id in factory_preset_names() {
        if let Some(preset) = get_factory_preset(id) {
            println!(
                "{id:<12} {:<12} {} + {} ({:.0}% B)",
                preset.name,
                preset.osc_a,
                preset.osc_b,
                preset.osc_mix * 100.0
            );
        }
    }

    println!("\n=== Tweaking ===\n");
    let Some(mut preset) = get_factory_preset("glass_pad") else {
        return;
    };
    preset.name = "Darker Pad".to_string();
    preset.filter_smoothing = 0.1;
    preset.release = 3.0;
    println!("{}", preset.to_json().unwrap_or_default());

    let (timbre, warnings) = preset.to_timbre();
    println!("\napplied with {} warnings, drive {}", warnings.len(), timbre.drive);

    println!("\n=== Disk ===\n");
    let path = std::env::temp_dir().join("tonegrid_darker_pad.json");
    match preset.save(&path) {
        Ok(()) => println!("saved to {}", path.display()),
        Err(e) => println!("save failed: {e}"),
    }
    match PatchPreset::load(&path) {
        Ok(loaded) => println!("loaded back: {} (matches: {})", loaded.name, loaded == preset),
        Err(e) => println!("load failed: {e}"),
    }
    println!("'Darker Pad' is a factory preset: {}", is_factory_preset("Darker Pad"));
}
