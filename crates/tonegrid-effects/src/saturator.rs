//! Multi-curve saturator with tone control and dry/wet mix.
//!
//! Signal flow:
//!
//! ```text
//! input ─┬─ ÷ peak ─ × drive ─ curve ─ × peak ─ × 1/max(1, drive/4) ─ tone ─┐
//!        └──────────────────────────── dry ──────────────────────────────── mix ─ out
//! ```
//!
//! The input is normalized by a running peak follower before shaping, so the
//! amount of saturation depends on `drive` rather than on the incoming level.
//! The peak is multiplied back in afterwards and the drive compensation keeps
//! heavy settings from getting much louder than light ones.

use libm::expf;
use tonegrid_core::{
    Effect, OnePole, SmoothedParam, arctan_clip, cubic_clip, flush_denormal, hard_clip, soft_clip,
    wet_dry_mix,
};

/// Peak follower release time in milliseconds.
const PEAK_RELEASE_MS: f32 = 50.0;
/// Peaks below this are treated as this value, so near-silence is not amplified.
const PEAK_FLOOR: f32 = 1e-3;

/// Transfer curve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaturationCurve {
    /// Hyperbolic tangent.
    #[default]
    Tanh,
    /// Scaled arctangent, softest knee.
    Arctan,
    /// Cubic polynomial soft clip.
    Cubic,
    /// Flat-topped hard clip.
    HardClip,
}

impl SaturationCurve {
    /// Apply the curve to an already driven sample.
    #[inline]
    pub fn shape(self, x: f32) -> f32 {
        match self {
            SaturationCurve::Tanh => soft_clip(x),
            SaturationCurve::Arctan => arctan_clip(x),
            SaturationCurve::Cubic => cubic_clip(x),
            SaturationCurve::HardClip => hard_clip(x, 1.0),
        }
    }
}

/// Saturator effect.
///
/// # Example
///
/// ```rust
/// use tonegrid_effects::{SaturationCurve, Saturator};
/// use tonegrid_core::Effect;
///
/// let mut sat = Saturator::new(48000.0);
/// sat.set_curve(SaturationCurve::Cubic);
/// sat.set_drive(8.0);
/// sat.set_tone_hz(6000.0);
/// sat.set_mix(0.7);
///
/// let out = sat.process(0.25);
/// assert!(out.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct Saturator {
    curve: SaturationCurve,
    drive: SmoothedParam,
    mix: SmoothedParam,
    tone: OnePole,
    peak: f32,
    peak_release: f32,
    sample_rate: f32,
}

impl Saturator {
    /// Defaults: tanh curve, drive 1, tone 12 kHz, fully wet.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            curve: SaturationCurve::Tanh,
            drive: SmoothedParam::with_config(1.0, sample_rate, 5.0),
            mix: SmoothedParam::with_config(1.0, sample_rate, 10.0),
            tone: OnePole::new(sample_rate, 12_000.0),
            peak: PEAK_FLOOR,
            peak_release: release_coeff(sample_rate),
            sample_rate,
        }
    }

    /// Select the transfer curve.
    pub fn set_curve(&mut self, curve: SaturationCurve) {
        self.curve = curve;
    }

    /// Current curve.
    pub fn curve(&self) -> SaturationCurve {
        self.curve
    }

    /// Set drive, clamped to `[1, 100]`.
    pub fn set_drive(&mut self, drive: f32) {
        let drive = if drive.is_finite() { drive.clamp(1.0, 100.0) } else { 1.0 };
        self.drive.set_target(drive);
    }

    /// Set the tone filter cutoff in Hz.
    pub fn set_tone_hz(&mut self, freq_hz: f32) {
        self.tone.set_frequency(freq_hz);
    }

    /// Set dry/wet mix in `[0, 1]`.
    pub fn set_mix(&mut self, mix: f32) {
        let mix = if mix.is_finite() { mix.clamp(0.0, 1.0) } else { 1.0 };
        self.mix.set_target(mix);
    }

    /// Output gain applied after shaping: `1 / max(1, drive · 0.25)`.
    #[inline]
    pub fn makeup_gain(drive: f32) -> f32 {
        1.0 / (drive * 0.25).max(1.0)
    }
}

fn release_coeff(sample_rate: f32) -> f32 {
    expf(-1.0 / (PEAK_RELEASE_MS / 1000.0 * sample_rate))
}

impl Effect for Saturator {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let drive = self.drive.advance();
        let mix = self.mix.advance();

        self.peak = (self.peak * self.peak_release).max(input.abs()).max(PEAK_FLOOR);
        let normalized = input / self.peak;

        let shaped = self.curve.shape(normalized * drive) * self.peak * Self::makeup_gain(drive);
        let wet = flush_denormal(self.tone.process(shaped));

        wet_dry_mix(input, wet, mix)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.drive.set_sample_rate(sample_rate);
        self.mix.set_sample_rate(sample_rate);
        self.tone.set_sample_rate(sample_rate);
        self.peak_release = release_coeff(sample_rate);
    }

    fn reset(&mut self) {
        self.tone.reset();
        self.peak = PEAK_FLOOR;
        self.drive.snap_to_target();
        self.mix.snap_to_target();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    fn sine(freq: f32, amp: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| amp * libm::sinf(core::f32::consts::TAU * freq * i as f32 / SR))
            .collect()
    }

    fn peak(signal: &[f32]) -> f32 {
        signal.iter().fold(0.0f32, |m, &s| m.max(s.abs()))
    }

    #[test]
    fn makeup_gain_law() {
        assert_eq!(Saturator::makeup_gain(1.0), 1.0);
        assert_eq!(Saturator::makeup_gain(4.0), 1.0);
        assert_eq!(Saturator::makeup_gain(8.0), 0.5);
        assert_eq!(Saturator::makeup_gain(40.0), 0.1);
    }

    #[test]
    fn dry_mix_passes_input() {
        let mut sat = Saturator::new(SR);
        sat.set_drive(20.0);
        sat.set_mix(0.0);
        sat.reset();
        for x in sine(220.0, 0.8, 1000) {
            assert!((sat.process(x) - x).abs() < 1e-6);
        }
    }

    #[test]
    fn every_curve_stays_bounded() {
        for curve in [
            SaturationCurve::Tanh,
            SaturationCurve::Arctan,
            SaturationCurve::Cubic,
            SaturationCurve::HardClip,
        ] {
            let mut sat = Saturator::new(SR);
            sat.set_curve(curve);
            sat.set_drive(100.0);
            sat.reset();
            let out: Vec<f32> = sine(110.0, 1.0, 4800).iter().map(|&x| sat.process(x)).collect();
            assert!(peak(&out) <= 1.0, "{curve:?} peaked at {}", peak(&out));
            assert!(out.iter().all(|s| s.is_finite()));
        }
    }

    #[test]
    fn saturation_character_is_level_independent() {
        // Normalization means a quiet and a loud sine come out with the same shape.
        let mut quiet = Saturator::new(SR);
        let mut loud = Saturator::new(SR);
        for sat in [&mut quiet, &mut loud] {
            sat.set_curve(SaturationCurve::HardClip);
            sat.set_drive(4.0);
            sat.set_tone_hz(20_000.0);
            sat.reset();
        }
        let q: Vec<f32> = sine(100.0, 0.1, 9600).iter().map(|&x| quiet.process(x)).collect();
        let l: Vec<f32> = sine(100.0, 0.8, 9600).iter().map(|&x| loud.process(x)).collect();
        let ratio = peak(&l[4800..]) / peak(&q[4800..]);
        assert!((ratio - 8.0).abs() < 0.5, "ratio {ratio}");
    }

    #[test]
    fn tone_filter_darkens_wet_signal() {
        let mut bright = Saturator::new(SR);
        let mut dark = Saturator::new(SR);
        bright.set_tone_hz(16_000.0);
        dark.set_tone_hz(300.0);
        let input = sine(5000.0, 0.5, 4800);
        let b: Vec<f32> = input.iter().map(|&x| bright.process(x)).collect();
        let d: Vec<f32> = input.iter().map(|&x| dark.process(x)).collect();
        assert!(peak(&d[2400..]) < peak(&b[2400..]) * 0.5);
    }
}
