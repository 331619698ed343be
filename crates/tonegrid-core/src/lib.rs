//! Tonegrid Core - DSP primitives for the tonegrid synthesizer
//!
//! Building blocks shared by the effect and synthesis crates. Everything here
//! is allocation-free once constructed and safe to call from an audio callback.
//!
//! # Processing
//!
//! - [`Effect`] - mono per-sample processing trait
//! - [`EffectExt`] / [`Chain`] - static series chaining
//!
//! # Filters
//!
//! - [`Smoother`] - one-pole `y = (1-s)·y + s·x`, the per-voice tone filter
//! - [`OnePole`] - one-pole lowpass tuned in Hz
//! - [`LadderFilter`] - 4-stage resonant ladder with low/high/band-pass outputs
//!   and an LFO cutoff sweep
//!
//! # Time and modulation
//!
//! - [`Lfo`] - low frequency oscillator (sine, triangle, saw, square)
//! - [`SmoothedParam`] / [`LinearSmoothedParam`] - click-free parameter changes
//! - [`InterpolatedDelay`] - fractional delay line
//! - [`Transport`] / [`NoteDivision`] - shared tempo and position
//!
//! # Utilities
//!
//! - [`Xorshift32`] - cheap deterministic randomness
//! - shaping curves ([`soft_clip`], [`arctan_clip`], [`cubic_clip`], [`hard_clip`])
//!   and helpers such as [`wrap_phase`] and [`sanitize_output`]
//!
//! # no_std Support
//!
//! Disable the default `std` feature to build for embedded targets:
//!
//! ```toml
//! [dependencies]
//! tonegrid-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod delay;
pub mod effect;
pub mod ladder;
pub mod lfo;
pub mod math;
pub mod one_pole;
pub mod param;
pub mod random;
pub mod tempo;

pub use delay::InterpolatedDelay;
pub use effect::{Chain, Effect, EffectExt};
pub use ladder::{LadderFilter, LadderMode, clamp_cutoff, modulated_cutoff};
pub use lfo::{Lfo, LfoWaveform};
pub use math::{
    arctan_clip, clamp01, cubic_clip, db_to_linear, flush_denormal, hard_clip, lerp,
    sanitize_output, soft_clip, wet_dry_mix, wrap_phase, wrap_unit,
};
pub use one_pole::{OnePole, Smoother};
pub use param::{LinearSmoothedParam, SmoothedParam};
pub use random::Xorshift32;
pub use tempo::{NoteDivision, Transport, TransportState};
