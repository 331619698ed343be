//! tonegrid - command-line front end for the tonegrid synthesizer.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tonegrid_config::Settings;

#[derive(Parser)]
#[command(name = "tonegrid")]
#[command(author, version, about = "Polyphonic synthesizer and sequencer", long_about = None)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render notes, patterns or arpeggios to a WAV file
    Render(commands::render::RenderArgs),

    /// Play the arpeggiator live on an output device
    Play(commands::play::PlayArgs),

    /// List, inspect and export presets
    Presets(commands::presets::PresetsArgs),

    /// List audio output devices
    Devices(commands::devices::DevicesArgs),
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let fallback = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::load().context("failed to load settings")?;

    match cli.command {
        Commands::Render(args) => commands::render::run(args, &settings),
        Commands::Play(args) => commands::play::run(args, &settings),
        Commands::Presets(args) => commands::presets::run(args),
        Commands::Devices(args) => commands::devices::run(args),
    }
}
