//! Feedback echo, the last stage of the VCO chain.

use libm::ceilf;
use tonegrid_core::{Effect, InterpolatedDelay, SmoothedParam, flush_denormal, wet_dry_mix};

/// Mono feedback delay.
///
/// # Example
///
/// ```rust
/// use tonegrid_effects::Echo;
/// use tonegrid_core::Effect;
///
/// let mut echo = Echo::new(44100.0);
/// echo.set_delay_time_ms(375.0);
/// echo.set_feedback(0.45);
/// echo.set_mix(0.3);
///
/// let output = echo.process(0.5);
/// ```
#[derive(Debug, Clone)]
pub struct Echo {
    line: InterpolatedDelay,
    max_delay_samples: f32,
    delay_time: SmoothedParam,
    feedback: SmoothedParam,
    mix: SmoothedParam,
    sample_rate: f32,
}

impl Echo {
    /// Two seconds maximum, 300 ms default time.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_max_delay_ms(sample_rate, 2000.0)
    }

    /// Custom maximum time.
    pub fn with_max_delay_ms(sample_rate: f32, max_delay_ms: f32) -> Self {
        let max_delay_samples = ceilf(max_delay_ms.max(1.0) / 1000.0 * sample_rate) as usize + 2;
        let max_f32 = max_delay_samples as f32;
        let default_delay = (0.3 * sample_rate).min(max_f32 - 2.0);

        Self {
            line: InterpolatedDelay::new(max_delay_samples),
            max_delay_samples: max_f32,
            delay_time: SmoothedParam::with_config(default_delay, sample_rate, 50.0),
            feedback: SmoothedParam::with_config(0.3, sample_rate, 10.0),
            mix: SmoothedParam::with_config(0.3, sample_rate, 10.0),
            sample_rate,
        }
    }

    /// Delay time in milliseconds, clamped to the line length.
    pub fn set_delay_time_ms(&mut self, delay_ms: f32) {
        let samples = delay_ms / 1000.0 * self.sample_rate;
        self.delay_time.set_target(samples.clamp(1.0, self.max_delay_samples - 2.0));
    }

    /// Feedback in `[0, 0.95]`.
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback.set_target(feedback.clamp(0.0, 0.95));
    }

    /// Wet/dry mix in `[0, 1]`.
    pub fn set_mix(&mut self, mix: f32) {
        self.mix.set_target(mix.clamp(0.0, 1.0));
    }
}

impl Effect for Echo {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delay_samples = self.delay_time.advance();
        let feedback = self.feedback.advance();
        let mix = self.mix.advance();

        let delayed = self.line.read(delay_samples);
        self.line.write(flush_denormal(input + delayed * feedback));

        wet_dry_mix(input, delayed, mix)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        let delay_ms = self.delay_time.target() / self.sample_rate * 1000.0;
        let feedback = self.feedback.target();
        let mix = self.mix.target();
        *self = Self::new(sample_rate);
        self.set_delay_time_ms(delay_ms);
        self.set_feedback(feedback);
        self.set_mix(mix);
        self.reset();
    }

    fn reset(&mut self) {
        self.line.clear();
        self.delay_time.snap_to_target();
        self.feedback.snap_to_target();
        self.mix.snap_to_target();
    }
}
