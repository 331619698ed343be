//! Offline rendering to WAV: chords, step patterns and arpeggios.

use super::common::{ArpOptions, BLOCK_FRAMES, load_timbre, parse_oscillator, parse_pitch};
use anyhow::Context;
use clap::{Args, Subcommand};
use std::path::PathBuf;
use tonegrid_config::Settings;
use tonegrid_core::Transport;
use tonegrid_io::{WavSpec, write_wav};
use tonegrid_synth::{OscillatorType, Step, StepPitch, StepSequencer, SynthEngine, SynthHandle};

#[derive(Args)]
pub struct RenderArgs {
    #[command(subcommand)]
    command: RenderCommand,
}

/// Output file options shared by every render.
#[derive(Args, Debug, Clone)]
struct OutputOptions {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Sample rate (defaults to the settings file)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Output channels; every channel carries the same mix
    #[arg(long, default_value = "2")]
    channels: u16,

    /// Bit depth: 16, 24 or 32 (float)
    #[arg(long, default_value = "32", value_parser = parse_bits)]
    bits: u16,
}

impl OutputOptions {
    fn spec(&self, settings: &Settings) -> WavSpec {
        WavSpec {
            channels: self.channels.max(1),
            sample_rate: self.sample_rate.unwrap_or(settings.sample_rate),
            bits_per_sample: self.bits,
        }
    }

    fn write(&self, samples: &[f32], spec: WavSpec) -> anyhow::Result<()> {
        write_wav(&self.output, samples, spec)
            .with_context(|| format!("failed to write {}", self.output.display()))?;
        let frames = samples.len() / usize::from(spec.channels);
        println!(
            "Wrote {} frames ({:.2}s, {} ch) to {}",
            frames,
            frames as f32 / spec.sample_rate as f32,
            spec.channels,
            self.output.display()
        );
        Ok(())
    }
}

#[derive(Subcommand)]
enum RenderCommand {
    /// Hold a chord, then let it ring out
    Chord {
        #[command(flatten)]
        out: OutputOptions,

        /// Notes as names or Hz, e.g. C4 E4 G4 or 220
        #[arg(value_parser = parse_pitch, default_values = ["C4", "E4", "G4"])]
        notes: Vec<f32>,

        /// Preset name or path
        #[arg(short, long)]
        preset: Option<String>,

        /// Seconds the notes are held
        #[arg(long, default_value = "1.0")]
        hold: f32,

        /// Seconds rendered after release
        #[arg(long, default_value = "1.0")]
        tail: f32,
    },

    /// Loop a step pattern through the sequencer voice
    ///
    /// Steps are space separated: a note or Hz value, optionally followed by
    /// `!` (accent), `~` (slide) and `:N` (gate length 0-4, 4 ties).
    /// `.` is a rest. Example: "A2 A2! . C3~ E3:4 . G2 A2:1"
    Sequence {
        #[command(flatten)]
        out: OutputOptions,

        /// Step pattern
        pattern: String,

        /// Times the pattern plays
        #[arg(long, default_value = "4")]
        loops: u32,

        /// Tempo (defaults to the settings file)
        #[arg(long)]
        bpm: Option<f32>,

        /// Oscillator type
        #[arg(long, value_parser = parse_oscillator, default_value = "saw")]
        wave: OscillatorType,

        /// Ladder cutoff in Hz
        #[arg(long, default_value = "1200")]
        cutoff: f32,

        /// Ladder resonance (0-1)
        #[arg(long, default_value = "0.5")]
        resonance: f32,

        /// Slide time in milliseconds
        #[arg(long, default_value = "60")]
        slide_ms: f32,

        /// Seconds rendered after the last step
        #[arg(long, default_value = "1.0")]
        tail: f32,
    },

    /// Arpeggiate a held note
    Arp {
        #[command(flatten)]
        out: OutputOptions,

        #[command(flatten)]
        arp: ArpOptions,

        /// Preset name or path
        #[arg(short, long)]
        preset: Option<String>,

        /// Tempo (defaults to the settings file)
        #[arg(long)]
        bpm: Option<f32>,

        /// Seconds the note is held
        #[arg(long, default_value = "4.0")]
        duration: f32,

        /// Seconds rendered after release
        #[arg(long, default_value = "1.0")]
        tail: f32,
    },
}

pub fn run(args: RenderArgs, settings: &Settings) -> anyhow::Result<()> {
    match args.command {
        RenderCommand::Chord {
            out,
            notes,
            preset,
            hold,
            tail,
        } => {
            let spec = out.spec(settings);
            let (name, timbre) = load_timbre(preset.as_deref(), settings)?;
            println!("Rendering {} note chord with '{}'", notes.len(), name);

            let capacity = notes.len().max(32);
            let (mut engine, mut handle) = SynthEngine::new(spec.sample_rate as f32, capacity);
            handle.set_timbre(timbre);
            for &hz in &notes {
                handle
                    .note_on(hz)
                    .with_context(|| format!("could not start {hz} Hz"))?;
            }

            let channels = usize::from(spec.channels);
            let mut samples = Vec::new();
            let hold_frames = seconds_to_frames(hold, spec);
            render_engine(&mut engine, &mut handle, &mut samples, hold_frames, channels, |_, _| {});
            handle.all_notes_off().context("voice queue full")?;
            let tail_frames = seconds_to_frames(tail, spec);
            render_engine(&mut engine, &mut handle, &mut samples, tail_frames, channels, |_, _| {});

            out.write(&samples, spec)
        }

        RenderCommand::Sequence {
            out,
            pattern,
            loops,
            bpm,
            wave,
            cutoff,
            resonance,
            slide_ms,
            tail,
        } => {
            let spec = out.spec(settings);
            let steps = parse_pattern(&pattern).map_err(anyhow::Error::msg)?;
            if steps.is_empty() {
                anyhow::bail!("pattern has no steps");
            }
            let sample_rate = spec.sample_rate as f32;
            let bpm = bpm.unwrap_or(settings.bpm);

            let mut transport = Transport::new(sample_rate, bpm);
            let mut seq = StepSequencer::new(sample_rate);
            let step_count = steps.len();
            seq.set_steps(steps);
            seq.vco_mut().set_oscillator(wave.build());
            seq.vco_mut().set_slide_time_ms(slide_ms);
            seq.vco_mut().filter_mut().set_cutoff(cutoff);
            seq.vco_mut().filter_mut().set_resonance(resonance);

            let pattern_secs = transport.step_length_secs() * step_count as f32 * loops as f32;
            println!(
                "Rendering {} steps x {} at {} BPM ({:.2}s)",
                step_count, loops, bpm, pattern_secs
            );

            let mut mono = Vec::new();
            transport.play();
            let pattern_frames = seconds_to_frames(pattern_secs, spec);
            render_sequencer(&mut seq, &mut transport, &mut mono, pattern_frames);
            seq.stop();
            transport.stop();
            let tail_frames = seconds_to_frames(tail, spec);
            render_sequencer(&mut seq, &mut transport, &mut mono, tail_frames);

            let channels = usize::from(spec.channels);
            let samples: Vec<f32> = mono
                .iter()
                .flat_map(|&s| std::iter::repeat_n(s, channels))
                .collect();
            out.write(&samples, spec)
        }

        RenderCommand::Arp {
            out,
            arp,
            preset,
            bpm,
            duration,
            tail,
        } => {
            let spec = out.spec(settings);
            let (name, timbre) = load_timbre(preset.as_deref(), settings)?;
            let bpm = bpm.unwrap_or(settings.bpm);
            println!(
                "Rendering {:?} arpeggio on MIDI {} at {} BPM with '{}'",
                arp.mode, arp.root, bpm, name
            );

            let sample_rate = spec.sample_rate as f32;
            let (mut engine, mut handle) = SynthEngine::new(sample_rate, 32);
            handle.set_timbre(timbre);
            let mut arpeggiator = arp.build();
            let mut transport = Transport::new(sample_rate, bpm);
            transport.play();

            let channels = usize::from(spec.channels);
            let mut samples = Vec::new();
            render_engine(
                &mut engine,
                &mut handle,
                &mut samples,
                seconds_to_frames(duration, spec),
                channels,
                |handle, frames| {
                    arpeggiator.update(&transport, handle);
                    transport.advance(frames as u64);
                },
            );
            arpeggiator.release(&mut handle);
            let tail_frames = seconds_to_frames(tail, spec);
            render_engine(
                &mut engine,
                &mut handle,
                &mut samples,
                tail_frames,
                channels,
                |handle, frames| {
                    arpeggiator.update(&transport, handle);
                    transport.advance(frames as u64);
                },
            );

            out.write(&samples, spec)
        }
    }
}

fn parse_bits(s: &str) -> Result<u16, String> {
    match s.parse::<u16>() {
        Ok(bits @ (16 | 24 | 32)) => Ok(bits),
        _ => Err(format!("'{s}' is not a supported bit depth (16, 24 or 32)")),
    }
}

fn seconds_to_frames(secs: f32, spec: WavSpec) -> usize {
    (secs.max(0.0) * spec.sample_rate as f32).round() as usize
}

/// Render `frames` frames through the engine, calling `control` before each block.
fn render_engine(
    engine: &mut SynthEngine,
    handle: &mut SynthHandle,
    samples: &mut Vec<f32>,
    frames: usize,
    channels: usize,
    mut control: impl FnMut(&mut SynthHandle, usize),
) {
    let mut remaining = frames;
    let mut block = vec![0.0f32; BLOCK_FRAMES * channels];
    while remaining > 0 {
        let n = remaining.min(BLOCK_FRAMES);
        control(handle, n);
        let buffer = &mut block[..n * channels];
        engine.render(buffer, channels);
        samples.extend_from_slice(buffer);
        handle.collect_garbage();
        remaining -= n;
    }
}

fn render_sequencer(
    seq: &mut StepSequencer,
    transport: &mut Transport,
    samples: &mut Vec<f32>,
    frames: usize,
) {
    let mut remaining = frames;
    let mut block = [0.0f32; BLOCK_FRAMES];
    while remaining > 0 {
        let n = remaining.min(BLOCK_FRAMES);
        seq.render(transport, &mut block[..n]);
        samples.extend_from_slice(&block[..n]);
        if transport.is_playing() {
            transport.advance(n as u64);
        }
        remaining -= n;
    }
}

/// Parse a space-separated step pattern.
fn parse_pattern(pattern: &str) -> Result<Vec<Step>, String> {
    pattern.split_whitespace().map(parse_step).collect()
}

fn parse_step(token: &str) -> Result<Step, String> {
    if matches!(token, "." | "-" | "_") {
        return Ok(Step::rest());
    }

    let (head, duration) = match token.split_once(':') {
        Some((head, d)) => {
            let d: u8 = d
                .parse()
                .map_err(|_| format!("step '{token}': bad gate length '{d}'"))?;
            (head, Some(d))
        }
        None => (token, None),
    };

    let pitch_text = head.trim_end_matches(['!', '~']);
    let flags = &head[pitch_text.len()..];
    let hz = parse_pitch(pitch_text).map_err(|e| format!("step '{token}': {e}"))?;

    let mut step = Step::new(StepPitch::Hz(hz));
    if let Some(d) = duration {
        step = step.with_duration(d);
    }
    if flags.contains('!') {
        step = step.with_accent(1.0);
    }
    if flags.contains('~') {
        step = step.with_slide();
    }
    Ok(step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_tokens() {
        let steps = parse_pattern("A2 A2! . C3~:3 110!~ -").unwrap();
        assert_eq!(steps.len(), 6);

        assert!(!steps[0].accent && !steps[0].slide);
        assert!(steps[1].accent);
        assert_eq!(steps[2].duration, 0, "rest");
        assert!(steps[3].slide);
        assert_eq!(steps[3].duration, 3);
        assert_eq!(steps[4].pitch, StepPitch::Hz(110.0));
        assert!(steps[4].accent && steps[4].slide);
        assert_eq!(steps[5].duration, 0);
    }

    #[test]
    fn bad_tokens_are_reported() {
        let err = parse_pattern("A2 Q9").unwrap_err();
        assert!(err.contains("Q9"), "{err}");
        assert!(parse_pattern("A2:x").is_err());
    }

    #[test]
    fn engine_render_fills_every_frame() {
        let (mut engine, mut handle) = SynthEngine::new(8000.0, 4);
        handle.note_on(220.0).unwrap();
        let mut samples = Vec::new();
        let mut calls = 0;
        render_engine(&mut engine, &mut handle, &mut samples, 1300, 2, |_, _| calls += 1);
        assert_eq!(samples.len(), 2600);
        assert_eq!(calls, 3, "512 + 512 + 276");
    }

    #[test]
    fn stopped_transport_does_not_advance() {
        let mut seq = StepSequencer::new(8000.0);
        seq.set_steps(vec![Step::new(StepPitch::Hz(110.0))]);
        let mut transport = Transport::new(8000.0, 120.0);
        let mut samples = Vec::new();
        render_sequencer(&mut seq, &mut transport, &mut samples, 1000);
        assert_eq!(samples.len(), 1000);
        assert_eq!(transport.tick(), 0);
        assert_eq!(seq.position(), None);
    }
}
