//! Tonegrid Effects - per-sample processors for voices and the VCO chain
//!
//! - [`Distortion`] - stateless `tanh(x · drive)` voice stage
//! - [`Saturator`] - four-curve saturator with tone filter and dry/wet mix
//! - [`GrainGate`] - jittered rhythmic gate
//! - [`Chorus`] - dual-tap modulated chorus
//! - [`Echo`] - feedback delay
//!
//! ## Example
//!
//! ```rust,ignore
//! use tonegrid_core::{Effect, EffectExt, LadderFilter};
//! use tonegrid_effects::{Chorus, Echo};
//!
//! let mut chain = LadderFilter::new(48000.0)
//!     .chain(Chorus::new(48000.0))
//!     .chain(Echo::new(48000.0));
//! let output = chain.process(input);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod chorus;
pub mod distortion;
pub mod echo;
pub mod grain_gate;
pub mod saturator;

pub use chorus::Chorus;
pub use distortion::{Distortion, clamp_drive};
pub use echo::Echo;
pub use grain_gate::{GrainGate, GrainSettings};
pub use saturator::{SaturationCurve, Saturator};
