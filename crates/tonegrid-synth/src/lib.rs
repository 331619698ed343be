//! Tonegrid Synth - voices, pools and sequencing for the tonegrid engine
//!
//! This crate turns the DSP primitives of `tonegrid-core` and `tonegrid-effects`
//! into playable notes: oscillators, envelopes, voices, polyphonic pools and
//! the real-time engine that mixes them into an audio buffer.
//!
//! # Core Components
//!
//! ## Oscillators
//!
//! Phase in radians, one closed enum per variant:
//!
//! - [`Oscillator`] - Phase accumulator over an [`OscillatorKind`]
//! - [`WaveShape`] - Sine, Square, Saw, Triangle, Noise, HalfSine, Pulse
//! - [`MorphBank`] - Four shapes crossfaded by a rotating cosine window
//! - [`Wavetable`] - 1024-point table built from a keyed curve
//! - [`DualOscillator`] - Two oscillators blended by a mix amount
//!
//! ```rust
//! use tonegrid_synth::{Oscillator, OscillatorKind, WaveShape};
//!
//! let mut osc = Oscillator::new(OscillatorKind::Basic(WaveShape::Saw), 48000.0);
//! osc.set_frequency(220.0);
//!
//! let sample = osc.advance();
//! ```
//!
//! ## Envelopes
//!
//! - [`AdsrEnvelope`] - Linear attack, decay, sustain, release
//! - [`ArEnvelope`] - Attack/release only
//! - [`Envelope`] - Shared `note_on`/`note_off`/`advance` interface
//!
//! ```rust
//! use tonegrid_synth::{AdsrEnvelope, Envelope};
//!
//! let mut env = AdsrEnvelope::new(0.01, 0.1, 0.7, 0.2);
//! env.note_on();
//! let level = env.advance(1.0 / 48000.0);
//! ```
//!
//! ## Voices and Pools
//!
//! - [`Voice`] - Oscillator, distortion, filter, envelope and optional grain gate
//! - [`Timbre`] - Settings new voices are built from
//! - [`VoicePool`] - Unbounded slab with a free list
//! - [`StealingPool`] - Fixed size, steals slot 0 when full
//! - [`SynthEngine`] / [`SynthHandle`] - Audio and control halves joined by ring buffers
//!
//! ## Sequencing
//!
//! - [`StepSequencer`] - Sixteenth-note steps with slide and accent on a [`Vco`]
//! - [`Arpeggiator`] - One held key into a tempo-locked note stream
//! - [`ReleaseSchedule`] - Deadline list for ending notes
//!
//! # no_std Support
//!
//! Everything except the engine is `no_std` compatible. Disable the default
//! `std` feature:
//!
//! ```toml
//! [dependencies]
//! tonegrid-synth = { version = "0.1", default-features = false }
//! ```
//!
//! # Example: Chord Through the Engine
//!
//! ```rust
//! use tonegrid_synth::{SynthEngine, Timbre, WaveShape, OscillatorKind};
//!
//! let (mut engine, mut handle) = SynthEngine::new(44100.0, 16);
//! handle.set_timbre(Timbre {
//!     osc_a: OscillatorKind::Basic(WaveShape::Triangle),
//!     drive: 2.0,
//!     ..Timbre::default()
//! });
//!
//! for hz in [261.63, 329.63, 392.0] {
//!     handle.note_on(hz).unwrap();
//! }
//!
//! let mut buffer = vec![0.0f32; 512];
//! engine.render(&mut buffer, 2);
//! assert!(buffer.iter().all(|s| s.abs() <= 1.0));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod arpeggiator;
#[cfg(feature = "std")]
pub mod engine;
pub mod envelope;
pub mod note;
pub mod oscillator;
pub mod pool;
pub mod schedule;
pub mod sequencer;
pub mod voice;
pub mod wavetable;

pub use arpeggiator::{ArpMode, Arpeggiator, NoteSink, PoolSink, Scale};
#[cfg(feature = "std")]
pub use engine::{Command, EngineError, SynthEngine, SynthHandle};
pub use envelope::{
    AdsrEnvelope, ArEnvelope, Envelope, EnvelopeKind, EnvelopeStage, VoiceEnvelope,
};
pub use note::{NoteName, ParseNoteError, freq_to_midi, midi_to_freq, note_to_freq, note_to_midi};
pub use oscillator::{
    DualOscillator, MorphBank, MorphSlot, Oscillator, OscillatorKind, OscillatorType,
    ParseOscillatorError, WaveShape,
};
pub use pool::{StealingPool, VoicePool};
pub use schedule::ReleaseSchedule;
pub use sequencer::{Step, StepPitch, StepSequencer, Vco};
pub use voice::{FilterSettings, Timbre, Voice, VoiceFilter, VoiceId};
pub use wavetable::Wavetable;

// Types that appear in this crate's public API.
pub use tonegrid_core::{LadderMode, LfoWaveform, NoteDivision, Transport};
pub use tonegrid_effects::GrainSettings;
