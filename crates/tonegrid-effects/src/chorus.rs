//! Dual-tap chorus for the sequencer VCO.

use libm::ceilf;
use tonegrid_core::{Effect, InterpolatedDelay, Lfo, SmoothedParam, wet_dry_mix};

const BASE_DELAY_MS: f32 = 15.0;
const MAX_MOD_MS: f32 = 5.0;

/// Chorus with two modulated taps 90° apart.
///
/// # Example
///
/// ```rust
/// use tonegrid_effects::Chorus;
/// use tonegrid_core::Effect;
///
/// let mut chorus = Chorus::new(44100.0);
/// chorus.set_rate(0.8);
/// chorus.set_depth(0.6);
/// chorus.set_mix(0.4);
///
/// let output = chorus.process(0.5);
/// ```
#[derive(Debug, Clone)]
pub struct Chorus {
    delay1: InterpolatedDelay,
    delay2: InterpolatedDelay,
    lfo1: Lfo,
    lfo2: Lfo,
    base_delay_samples: f32,
    max_mod_samples: f32,
    depth: SmoothedParam,
    mix: SmoothedParam,
}

impl Chorus {
    /// Rate 1 Hz, depth 0.5, mix 0.5.
    pub fn new(sample_rate: f32) -> Self {
        let max_delay_samples =
            ceilf((BASE_DELAY_MS + MAX_MOD_MS) / 1000.0 * sample_rate) as usize + 2;

        let lfo1 = Lfo::new(sample_rate, 1.0);
        let mut lfo2 = Lfo::new(sample_rate, 1.0);
        lfo2.set_phase(0.25);

        Self {
            delay1: InterpolatedDelay::new(max_delay_samples),
            delay2: InterpolatedDelay::new(max_delay_samples),
            lfo1,
            lfo2,
            base_delay_samples: BASE_DELAY_MS / 1000.0 * sample_rate,
            max_mod_samples: MAX_MOD_MS / 1000.0 * sample_rate,
            depth: SmoothedParam::with_config(0.5, sample_rate, 10.0),
            mix: SmoothedParam::with_config(0.5, sample_rate, 10.0),
        }
    }

    /// LFO rate in Hz, clamped to `[0.05, 10]`.
    pub fn set_rate(&mut self, rate_hz: f32) {
        let rate = rate_hz.clamp(0.05, 10.0);
        self.lfo1.set_frequency(rate);
        self.lfo2.set_frequency(rate);
    }

    /// Modulation depth in `[0, 1]`.
    pub fn set_depth(&mut self, depth: f32) {
        self.depth.set_target(depth.clamp(0.0, 1.0));
    }

    /// Wet/dry mix in `[0, 1]`.
    pub fn set_mix(&mut self, mix: f32) {
        self.mix.set_target(mix.clamp(0.0, 1.0));
    }

    /// Target mix.
    pub fn mix(&self) -> f32 {
        self.mix.target()
    }
}

impl Effect for Chorus {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let depth = self.depth.advance();
        let mix = self.mix.advance();

        let tap1 = self.base_delay_samples + self.lfo1.advance() * depth * self.max_mod_samples;
        let tap2 = self.base_delay_samples + self.lfo2.advance() * depth * self.max_mod_samples;

        let wet = (self.delay1.read(tap1) + self.delay2.read(tap2)) * 0.5;

        self.delay1.write(input);
        self.delay2.write(input);

        wet_dry_mix(input, wet, mix)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        let rate = self.lfo1.frequency();
        *self = Self {
            depth: SmoothedParam::with_config(self.depth.target(), sample_rate, 10.0),
            mix: SmoothedParam::with_config(self.mix.target(), sample_rate, 10.0),
            ..Self::new(sample_rate)
        };
        self.set_rate(rate);
    }

    fn reset(&mut self) {
        self.delay1.clear();
        self.delay2.clear();
        self.lfo1.reset();
        self.lfo2.reset();
        self.lfo2.set_phase(0.25);
        self.depth.snap_to_target();
        self.mix.snap_to_target();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_mix_is_transparent() {
        let mut chorus = Chorus::new(44100.0);
        chorus.set_mix(0.0);
        chorus.reset();
        for i in 0..2000 {
            let x = (i as f32 * 0.05).sin();
            assert!((chorus.process(x) - x).abs() < 1e-6);
        }
    }

    #[test]
    fn wet_signal_arrives_after_base_delay() {
        let mut chorus = Chorus::new(44100.0);
        chorus.set_mix(1.0);
        chorus.set_depth(0.0);
        chorus.reset();
        let mut first_nonzero = None;
        for i in 0..2000 {
            let y = chorus.process(if i == 0 { 1.0 } else { 0.0 });
            if y.abs() > 1e-6 && first_nonzero.is_none() {
                first_nonzero = Some(i);
            }
        }
        let at = first_nonzero.unwrap_or(usize::MAX);
        // 15 ms at 44.1 kHz is 661.5 samples
        assert!((660..=664).contains(&at), "first wet sample at {at}");
    }

    #[test]
    fn sample_rate_change_keeps_settings() {
        let mut chorus = Chorus::new(44100.0);
        chorus.set_rate(2.0);
        chorus.set_mix(0.3);
        chorus.set_sample_rate(96000.0);
        assert!((chorus.lfo1.frequency() - 2.0).abs() < 1e-4);
        assert_eq!(chorus.mix(), 0.3);
        for _ in 0..100 {
            assert!(chorus.process(0.5).is_finite());
        }
    }
}
