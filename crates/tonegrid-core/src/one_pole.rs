//! One-pole lowpass filters.
//!
//! Two parameterizations of the same 6 dB/octave topology:
//!
//! - [`OnePole`] is tuned by a cutoff frequency, `coeff = exp(-2π·f/sr)`.
//!   Used for tone controls.
//! - [`Smoother`] is tuned directly by its smoothing factor `s`:
//!
//! ```text
//! y[n] = (1 - s)·y[n-1] + s·x[n],   s ∈ (0, 1]
//! ```
//!
//!   This is the per-voice filter. With `s = 1` it is a wire; small values
//!   darken the tone. The same struct doubles as a parameter de-clicker.

use crate::{Effect, flush_denormal};
use libm::expf;

/// Smallest accepted smoothing factor. Zero would freeze the output.
pub const MIN_SMOOTHING: f32 = 1e-4;

/// One-pole lowpass tuned by cutoff frequency.
///
/// # Invariants
///
/// - `coeff` is always in [0, 1) for stable operation
/// - `state` is flushed to zero when below 1e-20
#[derive(Debug, Clone)]
pub struct OnePole {
    state: f32,
    coeff: f32,
    sample_rate: f32,
    freq: f32,
}

impl OnePole {
    /// Create a filter with the given cutoff in Hz.
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        let mut filter = Self {
            state: 0.0,
            coeff: 0.0,
            sample_rate,
            freq: freq_hz,
        };
        filter.recalculate_coeff();
        filter
    }

    /// Set the cutoff frequency.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.freq = freq_hz;
        self.recalculate_coeff();
    }

    /// Current cutoff in Hz.
    pub fn frequency(&self) -> f32 {
        self.freq
    }

    fn recalculate_coeff(&mut self) {
        let freq = self.freq.clamp(1.0, self.sample_rate * 0.5);
        self.coeff = expf(-core::f32::consts::TAU * freq / self.sample_rate);
    }
}

impl Effect for OnePole {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.state = flush_denormal(input + self.coeff * (self.state - input));
        self.state
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    fn reset(&mut self) {
        self.state = 0.0;
    }
}

/// One-pole smoother tuned by its blend factor.
#[derive(Debug, Clone)]
pub struct Smoother {
    smoothing: f32,
    state: f32,
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Smoother {
    /// Create a smoother. `smoothing` is clamped to `[MIN_SMOOTHING, 1]`.
    pub fn new(smoothing: f32) -> Self {
        Self {
            smoothing: clamp_smoothing(smoothing),
            state: 0.0,
        }
    }

    /// Change the smoothing factor without resetting history.
    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.smoothing = clamp_smoothing(smoothing);
    }

    /// Current smoothing factor.
    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    /// Last output.
    pub fn value(&self) -> f32 {
        self.state
    }

    /// Jump straight to `value`, e.g. when a de-clicked parameter is first set.
    pub fn snap_to(&mut self, value: f32) {
        self.state = value;
    }
}

fn clamp_smoothing(s: f32) -> f32 {
    if s.is_finite() {
        s.clamp(MIN_SMOOTHING, 1.0)
    } else {
        1.0
    }
}

impl Effect for Smoother {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.state = flush_denormal((1.0 - self.smoothing) * self.state + self.smoothing * input);
        self.state
    }

    fn set_sample_rate(&mut self, _sample_rate: f32) {}

    fn reset(&mut self) {
        self.state = 0.0;
    }
}
