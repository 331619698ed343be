//! Low frequency oscillator for cutoff sweeps and chorus modulation.
//!
//! Phase lives in `[0, 1)` and advances by `rate / sample_rate` per sample.

use core::f32::consts::TAU;
use libm::sinf;

/// LFO waveform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LfoWaveform {
    /// Smooth sinusoid.
    #[default]
    Sine,
    /// Linear up/down ramps.
    Triangle,
    /// Rising ramp with a hard reset.
    Saw,
    /// Two-level switch.
    Square,
}

/// Low frequency oscillator.
///
/// # Example
///
/// ```rust
/// use tonegrid_core::{Lfo, LfoWaveform};
///
/// let mut lfo = Lfo::new(44100.0, 2.0);
/// lfo.set_waveform(LfoWaveform::Triangle);
///
/// let bipolar = lfo.advance();
/// assert!((-1.0..=1.0).contains(&bipolar));
/// ```
#[derive(Debug, Clone)]
pub struct Lfo {
    phase: f32,
    phase_inc: f32,
    sample_rate: f32,
    waveform: LfoWaveform,
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new(48000.0, 1.0)
    }
}

impl Lfo {
    /// Create an LFO at `rate_hz`.
    pub fn new(sample_rate: f32, rate_hz: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: rate_hz.max(0.0) / sample_rate,
            sample_rate,
            waveform: LfoWaveform::Sine,
        }
    }

    /// Set the rate in Hz. Negative rates are treated as 0.
    pub fn set_frequency(&mut self, rate_hz: f32) {
        self.phase_inc = rate_hz.max(0.0) / self.sample_rate;
    }

    /// Current rate in Hz.
    pub fn frequency(&self) -> f32 {
        self.phase_inc * self.sample_rate
    }

    /// Select the waveform.
    pub fn set_waveform(&mut self, waveform: LfoWaveform) {
        self.waveform = waveform;
    }

    /// Current waveform.
    pub fn waveform(&self) -> LfoWaveform {
        self.waveform
    }

    /// Restart at phase 0.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Set the phase offset (0.25 = 90°).
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = crate::wrap_unit(phase);
    }

    /// Current phase in `[0, 1)`.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Output in `[-1, 1]` at the current phase, then advance one sample.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        let output = match self.waveform {
            LfoWaveform::Sine => sinf(self.phase * TAU),
            LfoWaveform::Triangle => {
                if self.phase < 0.5 {
                    4.0 * self.phase - 1.0
                } else {
                    3.0 - 4.0 * self.phase
                }
            }
            LfoWaveform::Saw => 2.0 * self.phase - 1.0,
            LfoWaveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        };

        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase = crate::wrap_unit(self.phase);
        }

        output
    }

    /// Output mapped into `[0, 1]`, then advance one sample.
    #[inline]
    pub fn advance_unipolar(&mut self) -> f32 {
        (self.advance() + 1.0) * 0.5
    }

    /// Change sample rate while keeping the rate in Hz.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let freq = self.frequency();
        self.sample_rate = sample_rate;
        self.set_frequency(freq);
    }
}
