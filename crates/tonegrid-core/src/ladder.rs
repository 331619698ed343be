//! Four-stage Moog-style ladder filter with resonance and an LFO cutoff sweep.
//!
//! Coefficients from normalized cutoff `f = cutoff / sample_rate`:
//!
//! ```text
//! p = f·(1.8 − 0.8·f)
//! k = 2·sin(f·π/2) − 1
//! r = resonance·(1 − 0.15·p²)
//! ```
//!
//! Each stage computes `y_i = p·(x_i + oldx_i) − k·y_i`, where the first stage
//! is fed `x_0 = input − r·y_3`. Outputs:
//!
//! | Mode | Output |
//! |------|--------|
//! | [`LadderMode::LowPass`] | `y_3` |
//! | [`LadderMode::HighPass`] | `input − y_3` |
//! | [`LadderMode::BandPass`] | high-pass minus low-pass |
//!
//! The band-pass is an approximation derived from the same chain, not a
//! resonant band-pass. It is kept that way so existing patches sound the same.
//!
//! Cutoff is clamped to `[50 Hz, 0.45·sample_rate]` before every coefficient
//! update. The feedback tap and the output are clamped to `[-1, 1]`, which
//! keeps the loop bounded even at full resonance.

use crate::{Effect, Lfo, LfoWaveform, flush_denormal, sanitize_output};
use core::f32::consts::PI;
use libm::{exp2f, sinf};

/// Lowest cutoff the filter will run at.
pub const MIN_CUTOFF_HZ: f32 = 50.0;

/// Highest cutoff as a fraction of the sample rate.
pub const MAX_CUTOFF_RATIO: f32 = 0.45;

/// Octaves swept at full modulation depth, in each direction.
const MOD_OCTAVES: f32 = 4.0;

/// Ladder filter response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LadderMode {
    /// Last stage output.
    #[default]
    LowPass,
    /// Input minus the low-pass.
    HighPass,
    /// High-pass minus low-pass.
    BandPass,
}

/// Clamp a cutoff into the stable range for `sample_rate`.
#[inline]
pub fn clamp_cutoff(cutoff_hz: f32, sample_rate: f32) -> f32 {
    let max = (sample_rate * MAX_CUTOFF_RATIO).max(MIN_CUTOFF_HZ);
    if cutoff_hz.is_finite() {
        cutoff_hz.clamp(MIN_CUTOFF_HZ, max)
    } else {
        max
    }
}

/// Cutoff after LFO modulation: `base · 2^((2·lfo − 1)·depth·4)`.
///
/// `lfo` is unipolar in `[0, 1]`, `depth` in `[0, 1]`.
#[inline]
pub fn modulated_cutoff(base_hz: f32, lfo: f32, depth: f32) -> f32 {
    base_hz * exp2f((2.0 * lfo - 1.0) * depth * MOD_OCTAVES)
}

#[derive(Debug, Clone, Copy, Default)]
struct Coefficients {
    p: f32,
    k: f32,
    r: f32,
}

impl Coefficients {
    fn compute(cutoff_hz: f32, resonance: f32, sample_rate: f32) -> Self {
        let f = clamp_cutoff(cutoff_hz, sample_rate) / sample_rate;
        let p = f * (1.8 - 0.8 * f);
        let k = 2.0 * sinf(f * PI * 0.5) - 1.0;
        let r = resonance * (1.0 - 0.15 * p * p);
        Self { p, k, r }
    }
}

/// Resonant ladder filter.
///
/// # Example
///
/// ```rust
/// use tonegrid_core::{Effect, LadderFilter, LadderMode};
///
/// let mut filter = LadderFilter::new(44100.0);
/// filter.set_cutoff(800.0);
/// filter.set_resonance(0.6);
/// filter.set_mode(LadderMode::LowPass);
///
/// let out = filter.process(0.5);
/// assert!(out.abs() <= 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct LadderFilter {
    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
    mode: LadderMode,
    coeffs: Coefficients,
    stage: [f32; 4],
    stage_input: [f32; 4],
    lfo: Lfo,
    lfo_depth: f32,
}

impl LadderFilter {
    /// Create a low-pass at 1 kHz with no resonance.
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            sample_rate,
            cutoff: 1000.0,
            resonance: 0.0,
            mode: LadderMode::LowPass,
            coeffs: Coefficients::default(),
            stage: [0.0; 4],
            stage_input: [0.0; 4],
            lfo: Lfo::new(sample_rate, 0.0),
            lfo_depth: 0.0,
        };
        filter.update_coefficients();
        filter
    }

    /// Set the base cutoff in Hz. Stored as given, clamped when coefficients are computed.
    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.cutoff = cutoff_hz;
        self.update_coefficients();
    }

    /// Base cutoff in Hz, clamped to the stable range.
    pub fn cutoff(&self) -> f32 {
        clamp_cutoff(self.cutoff, self.sample_rate)
    }

    /// Set resonance in `[0, 1]`.
    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = if resonance.is_finite() {
            resonance.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.update_coefficients();
    }

    /// Current resonance.
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Select the output response.
    pub fn set_mode(&mut self, mode: LadderMode) {
        self.mode = mode;
    }

    /// Current output response.
    pub fn mode(&self) -> LadderMode {
        self.mode
    }

    /// Configure the cutoff LFO. A depth of 0 disables modulation.
    pub fn set_lfo(&mut self, waveform: LfoWaveform, rate_hz: f32, depth: f32) {
        self.lfo.set_waveform(waveform);
        self.lfo.set_frequency(rate_hz);
        self.lfo_depth = if depth.is_finite() {
            depth.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    /// Current LFO depth.
    pub fn lfo_depth(&self) -> f32 {
        self.lfo_depth
    }

    fn update_coefficients(&mut self) {
        self.coeffs = Coefficients::compute(self.cutoff, self.resonance, self.sample_rate);
    }
}

impl Effect for LadderFilter {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        if self.lfo_depth > 0.0 {
            let lfo = self.lfo.advance_unipolar();
            let cutoff = modulated_cutoff(self.cutoff, lfo, self.lfo_depth);
            self.coeffs = Coefficients::compute(cutoff, self.resonance, self.sample_rate);
        }

        let Coefficients { p, k, r } = self.coeffs;
        let mut x = input - r * self.stage[3];
        for i in 0..4 {
            let y = p * (x + self.stage_input[i]) - k * self.stage[i];
            self.stage_input[i] = x;
            self.stage[i] = flush_denormal(y);
            x = self.stage[i];
        }
        self.stage[3] = self.stage[3].clamp(-1.0, 1.0);

        let low = self.stage[3];
        let high = input - low;
        let out = match self.mode {
            LadderMode::LowPass => low,
            LadderMode::HighPass => high,
            LadderMode::BandPass => high - low,
        };
        sanitize_output(out)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.lfo.set_sample_rate(sample_rate);
        self.update_coefficients();
    }

    fn reset(&mut self) {
        self.stage = [0.0; 4];
        self.stage_input = [0.0; 4];
        self.lfo.reset();
    }
}
