//! Rhythmic gate that chops a signal into grains.
//!
//! Every grain re-rolls its rate and duty by up to `±jitter` (as a fraction of
//! the configured value), then:
//!
//! ```text
//! grain_length  = 1 / jittered_rate
//! duty_duration = clamp01(jittered_duty) · grain_length
//! ```
//!
//! The input passes unchanged while the grain timer is below `duty_duration`
//! and is muted for the rest of the grain.

use tonegrid_core::{Effect, Xorshift32, clamp01};

/// Slowest grain rate in Hz.
pub const MIN_RATE_HZ: f32 = 0.1;
/// Fastest grain rate in Hz.
pub const MAX_RATE_HZ: f32 = 1000.0;

/// Grain gate settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrainSettings {
    /// Grains per second.
    pub rate: f32,
    /// Open fraction of each grain, `[0, 1]`.
    pub duty: f32,
    /// Random spread applied to rate and duty per grain, `[0, 1]`.
    pub jitter: f32,
}

impl Default for GrainSettings {
    fn default() -> Self {
        Self {
            rate: 8.0,
            duty: 0.5,
            jitter: 0.0,
        }
    }
}

impl GrainSettings {
    /// Copy with every field forced into its valid range.
    pub fn clamped(self) -> Self {
        let rate = if self.rate.is_finite() {
            self.rate.clamp(MIN_RATE_HZ, MAX_RATE_HZ)
        } else {
            GrainSettings::default().rate
        };
        Self {
            rate,
            duty: if self.duty.is_finite() { clamp01(self.duty) } else { 0.5 },
            jitter: if self.jitter.is_finite() { clamp01(self.jitter) } else { 0.0 },
        }
    }
}

/// Grain gate.
///
/// # Example
///
/// ```rust
/// use tonegrid_effects::{GrainGate, GrainSettings};
///
/// let mut gate = GrainGate::new(GrainSettings { rate: 20.0, duty: 0.5, jitter: 0.0 });
/// let step = 1.0 / 44100.0;
/// let open = (0..44100).filter(|_| gate.apply(1.0, step) > 0.0).count();
/// assert!((21000..23100).contains(&open));
/// ```
#[derive(Debug, Clone)]
pub struct GrainGate {
    settings: GrainSettings,
    timer: f32,
    grain_length: f32,
    duty_duration: f32,
    step: f32,
    rng: Xorshift32,
}

impl GrainGate {
    /// Create a gate with a fixed default seed.
    pub fn new(settings: GrainSettings) -> Self {
        Self::with_seed(settings, 0x9E37_79B9)
    }

    /// Create a gate with an explicit jitter seed.
    pub fn with_seed(settings: GrainSettings, seed: u32) -> Self {
        let mut gate = Self {
            settings: settings.clamped(),
            timer: 0.0,
            grain_length: 0.0,
            duty_duration: 0.0,
            step: 1.0 / 48000.0,
            rng: Xorshift32::new(seed),
        };
        gate.roll_grain();
        gate
    }

    /// Replace the settings. Takes effect from the next grain.
    pub fn set_settings(&mut self, settings: GrainSettings) {
        self.settings = settings.clamped();
    }

    /// Current settings.
    pub fn settings(&self) -> GrainSettings {
        self.settings
    }

    /// Length of the current grain in seconds.
    pub fn grain_length(&self) -> f32 {
        self.grain_length
    }

    /// Open time of the current grain in seconds.
    pub fn duty_duration(&self) -> f32 {
        self.duty_duration
    }

    /// Advance by `step` seconds and gate `input`.
    #[inline]
    pub fn apply(&mut self, input: f32, step: f32) -> f32 {
        self.timer += step;
        if self.timer >= self.grain_length {
            self.roll_grain();
            self.timer = 0.0;
        }
        if self.timer < self.duty_duration { input } else { 0.0 }
    }

    fn roll_grain(&mut self) {
        let GrainSettings { rate, duty, jitter } = self.settings;
        let rate = (rate * (1.0 + jitter * self.rng.next_bipolar())).max(MIN_RATE_HZ);
        let duty = duty * (1.0 + jitter * self.rng.next_bipolar());
        self.grain_length = 1.0 / rate;
        self.duty_duration = clamp01(duty) * self.grain_length;
    }
}

impl Effect for GrainGate {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.apply(input, self.step)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.step = 1.0 / sample_rate;
    }

    fn reset(&mut self) {
        self.timer = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    fn open_fraction(gate: &mut GrainGate, seconds: f32) -> f32 {
        let n = (SR * seconds) as usize;
        let open = (0..n).filter(|_| gate.apply(1.0, 1.0 / SR) == 1.0).count();
        open as f32 / n as f32
    }

    #[test]
    fn half_duty_passes_half_the_samples() {
        let mut gate = GrainGate::new(GrainSettings {
            rate: 20.0,
            duty: 0.5,
            jitter: 0.0,
        });
        let fraction = open_fraction(&mut gate, 1.0);
        assert!((fraction - 0.5).abs() < 0.01, "open fraction {fraction}");
    }

    #[test]
    fn zero_jitter_grains_are_exact() {
        let gate = GrainGate::new(GrainSettings {
            rate: 10.0,
            duty: 0.25,
            jitter: 0.0,
        });
        assert!((gate.grain_length() - 0.1).abs() < 1e-6);
        assert!((gate.duty_duration() - 0.025).abs() < 1e-6);
    }

    #[test]
    fn output_is_input_or_silence() {
        let mut gate = GrainGate::new(GrainSettings {
            rate: 13.0,
            duty: 0.3,
            jitter: 0.8,
        });
        for i in 0..10_000 {
            let x = (i as f32 * 0.01).sin();
            let y = gate.apply(x, 1.0 / SR);
            assert!(y == x || y == 0.0);
        }
    }

    #[test]
    fn jitter_varies_grain_length_within_bounds() {
        let settings = GrainSettings {
            rate: 10.0,
            duty: 0.5,
            jitter: 0.5,
        };
        let mut gate = GrainGate::with_seed(settings, 42);
        let mut lengths = Vec::new();
        for _ in 0..(SR as usize * 4) {
            gate.apply(1.0, 1.0 / SR);
            lengths.push(gate.grain_length());
        }
        let min = lengths.iter().copied().fold(f32::MAX, f32::min);
        let max = lengths.iter().copied().fold(f32::MIN, f32::max);
        assert!(max > min, "jitter produced identical grains");
        // rate in [5, 15] Hz -> length in [1/15, 1/5] s
        assert!(min >= 1.0 / 15.0 - 1e-4 && max <= 0.2 + 1e-4, "[{min}, {max}]");
    }

    #[test]
    fn full_and_zero_duty() {
        let mut always = GrainGate::new(GrainSettings {
            rate: 20.0,
            duty: 1.0,
            jitter: 0.0,
        });
        assert!(open_fraction(&mut always, 0.5) > 0.99);

        let mut never = GrainGate::new(GrainSettings {
            rate: 20.0,
            duty: 0.0,
            jitter: 0.0,
        });
        assert_eq!(open_fraction(&mut never, 0.5), 0.0);
    }

    #[test]
    fn settings_are_clamped() {
        let s = GrainSettings {
            rate: -5.0,
            duty: 3.0,
            jitter: f32::NAN,
        }
        .clamped();
        assert_eq!(s.rate, MIN_RATE_HZ);
        assert_eq!(s.duty, 1.0);
        assert_eq!(s.jitter, 0.0);
    }
}
