//! Preset management commands.
//!
//! Provides commands to list, show and export patch presets.

use anyhow::Context;
use clap::{Args, Subcommand};
use std::path::PathBuf;
use tonegrid_config::{
    FACTORY_PRESET_NAMES, PatchPreset, ensure_user_presets_dir, get_factory_preset,
    list_user_presets, preset_name_from_path, settings_path, user_config_dir, user_presets_dir,
};

#[derive(Args)]
pub struct PresetsArgs {
    #[command(subcommand)]
    command: PresetsCommand,
}

#[derive(Subcommand)]
enum PresetsCommand {
    /// List available presets (factory and user)
    List {
        /// Show only factory presets
        #[arg(long)]
        factory: bool,

        /// Show only user presets
        #[arg(long)]
        user: bool,
    },

    /// Show details of a preset
    Show {
        /// Preset name or path
        name: String,

        /// Print the raw JSON document
        #[arg(long)]
        json: bool,
    },

    /// Write a preset to the user presets directory (or a given path)
    Export {
        /// Preset name or path
        name: String,

        /// Destination file (defaults to <presets dir>/<name>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show preset and settings locations
    Paths,
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    match args.command {
        PresetsCommand::List { factory, user } => list_presets(factory, user),
        PresetsCommand::Show { name, json } => show_preset(&name, json),
        PresetsCommand::Export {
            name,
            output,
            force,
        } => export_preset(&name, output, force),
        PresetsCommand::Paths => show_paths(),
    }
}

fn list_presets(factory_only: bool, user_only: bool) -> anyhow::Result<()> {
    let show_factory = !user_only;
    let show_user = !factory_only;

    if show_factory {
        println!("Factory Presets:");
        println!("================");
        for id in FACTORY_PRESET_NAMES {
            if let Some(preset) = get_factory_preset(id) {
                let desc = preset.description.as_deref().unwrap_or("");
                println!("  {:14} {:14} - {}", id, preset.name, desc);
            }
        }
        println!();
    }

    if show_user {
        println!("User Presets:");
        println!("=============");
        let user_presets = list_user_presets();
        if user_presets.is_empty() {
            println!("  (none)");
            println!();
            println!("  Copy a factory preset with: tonegrid presets export <name>\n");
        } else {
            for path in user_presets {
                let name = preset_name_from_path(&path).unwrap_or_else(|| "unknown".to_string());
                match PatchPreset::load(&path) {
                    Ok(preset) => {
                        let desc = preset.description.as_deref().unwrap_or("");
                        println!("  {:14} {:14} - {}", name, preset.name, desc);
                    }
                    Err(e) => {
                        tracing::debug!(path = %path.display(), error = %e, "unreadable preset");
                        println!("  {:14} (error loading)", name);
                    }
                }
            }
        }
        println!();
    }

    Ok(())
}

fn show_preset(name: &str, json: bool) -> anyhow::Result<()> {
    let preset = PatchPreset::resolve(name)
        .with_context(|| format!("preset '{name}' not found"))?;

    if json {
        println!("{}", preset.to_json()?);
        return Ok(());
    }

    println!("Preset: {}", preset.name);
    println!("{}", "=".repeat(8 + preset.name.len()));
    println!();

    if let Some(desc) = &preset.description {
        println!("Description: {}", desc);
        println!();
    }

    println!("Oscillators: {} + {} (mix {:.2})", preset.osc_a, preset.osc_b, preset.osc_mix);
    println!(
        "Envelope:    A {:.3}s  D {:.3}s  S {:.2}  R {:.3}s",
        preset.attack, preset.decay, preset.sustain, preset.release
    );
    println!("Filter:      smoothing {:.2}", preset.filter_smoothing);
    println!("Drive:       {:.2}", preset.drive);
    if preset.grain_enabled {
        println!(
            "Grain gate:  {:.1} Hz, duty {:.2}, jitter {:.2}",
            preset.grain_rate, preset.grain_duty, preset.grain_jitter
        );
    } else {
        println!("Grain gate:  off");
    }

    let (_, warnings) = preset.to_timbre();
    for warning in warnings {
        println!("Warning: {warning}");
    }

    Ok(())
}

fn export_preset(name: &str, output: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let preset = PatchPreset::resolve(name)
        .with_context(|| format!("preset '{name}' not found"))?;

    let path = match output {
        Some(path) => path,
        None => {
            let dir = ensure_user_presets_dir()?;
            let stem = preset.name.to_lowercase().replace(' ', "_");
            dir.join(format!("{stem}.json"))
        }
    };

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    preset
        .save(&path)
        .with_context(|| format!("failed to save {}", path.display()))?;
    println!("Exported '{}' to {}", preset.name, path.display());
    Ok(())
}

fn show_paths() -> anyhow::Result<()> {
    println!("Config directory:  {}", user_config_dir().display());
    println!("Presets directory: {}", user_presets_dir().display());
    println!("Settings file:     {}", settings_path().display());
    Ok(())
}
