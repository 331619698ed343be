//! Live arpeggiator playback.

use super::common::{ArpOptions, load_timbre};
use anyhow::Context;
use clap::Args;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tonegrid_config::Settings;
use tonegrid_io::{OutputStream, StreamConfig};
use tonegrid_synth::SynthEngine;

/// How often the control loop wakes to schedule notes.
const CONTROL_INTERVAL: Duration = Duration::from_millis(2);

/// Time given to release tails before the stream closes.
const RELEASE_GRACE: Duration = Duration::from_millis(1500);

#[derive(Args)]
pub struct PlayArgs {
    #[command(flatten)]
    arp: ArpOptions,

    /// Preset name or path
    #[arg(short, long)]
    preset: Option<String>,

    /// Tempo (defaults to the settings file)
    #[arg(long)]
    bpm: Option<f32>,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long)]
    duration: Option<f32>,

    /// Output device (index, exact name, or partial name)
    #[arg(short, long)]
    output: Option<String>,

    /// Frames per audio callback (defaults to the settings file)
    #[arg(long)]
    buffer_size: Option<u32>,

    /// Master gain
    #[arg(long, default_value = "0.8")]
    gain: f32,
}

pub fn run(args: PlayArgs, settings: &Settings) -> anyhow::Result<()> {
    let (name, timbre) = load_timbre(args.preset.as_deref(), settings)?;
    let bpm = args.bpm.unwrap_or(settings.bpm);

    let config = StreamConfig {
        sample_rate: settings.sample_rate,
        buffer_size: args.buffer_size.unwrap_or(settings.buffer_size),
        device: args.output.or_else(|| settings.output_device.clone()),
    };
    let mut stream = OutputStream::new(config).context("failed to open output device")?;

    let (mut engine, mut handle) = SynthEngine::new(stream.sample_rate() as f32, 32);
    handle.set_timbre(timbre);
    handle.set_master_gain(args.gain);
    let mut arp = args.arp.build();

    println!("Device: {}", stream.device_name());
    println!(
        "Playing {:?} on MIDI {} at {} BPM with '{}'",
        args.arp.mode, args.arp.root, bpm, name
    );
    println!("Press Ctrl+C to stop.\n");

    let running = stream.running_flag();
    let interrupt = stream.running_flag();
    ctrlc::set_handler(move || {
        interrupt.store(false, Ordering::SeqCst);
    })
    .context("failed to install Ctrl+C handler")?;

    stream.start(move |data, channels| engine.render(data, channels))?;

    let start = Instant::now();
    let limit = args.duration.map(|secs| Duration::from_secs_f32(secs.max(0.0)));
    while running.load(Ordering::SeqCst) {
        let elapsed = start.elapsed();
        if limit.is_some_and(|limit| elapsed >= limit) {
            break;
        }
        arp.update_at(elapsed.as_secs_f64(), bpm, &mut handle);
        handle.collect_garbage();
        std::thread::sleep(CONTROL_INTERVAL);
    }

    println!("\nStopping...");
    arp.release(&mut handle);
    let release_start = Instant::now();
    while running.load(Ordering::SeqCst)
        && release_start.elapsed() < RELEASE_GRACE
        && (handle.active_voices() > 0 || arp.pending() > 0)
    {
        // Releases refused by a full queue are retried here.
        arp.update_at(start.elapsed().as_secs_f64(), bpm, &mut handle);
        handle.collect_garbage();
        std::thread::sleep(Duration::from_millis(20));
    }
    stream.stop();
    handle.collect_garbage();

    println!("Done!");
    Ok(())
}
