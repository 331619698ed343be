//! Per-voice tanh drive.

use libm::tanhf;
use tonegrid_core::Effect;

/// Stateless `tanh(input · drive)` waveshaper.
///
/// Drive is held at 1 or above; at 1 the stage is a gentle soft clip that is
/// nearly transparent for quiet signals.
///
/// # Example
///
/// ```rust
/// use tonegrid_effects::Distortion;
/// use tonegrid_core::Effect;
///
/// let mut dist = Distortion::new(4.0);
/// let out = dist.process(0.5);
/// assert!((out - 2.0f32.tanh()).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distortion {
    drive: f32,
}

impl Default for Distortion {
    fn default() -> Self {
        Self { drive: 1.0 }
    }
}

impl Distortion {
    /// Create a stage with the given drive, clamped to `>= 1`.
    pub fn new(drive: f32) -> Self {
        Self {
            drive: clamp_drive(drive),
        }
    }

    /// Set the drive, clamped to `>= 1`.
    pub fn set_drive(&mut self, drive: f32) {
        self.drive = clamp_drive(drive);
    }

    /// Current drive.
    pub fn drive(&self) -> f32 {
        self.drive
    }

    /// Shape one sample without needing `&mut self`.
    #[inline]
    pub fn apply(&self, input: f32) -> f32 {
        tanhf(input * self.drive)
    }
}

/// Clamp a drive value into `[1, ∞)`. Non-finite values fall back to 1.
#[inline]
pub fn clamp_drive(drive: f32) -> f32 {
    if drive.is_finite() { drive.max(1.0) } else { 1.0 }
}

impl Effect for Distortion {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.apply(input)
    }

    fn set_sample_rate(&mut self, _sample_rate: f32) {}

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_below_one_is_clamped() {
        assert_eq!(Distortion::new(0.2).drive(), 1.0);
        assert_eq!(Distortion::new(f32::NAN).drive(), 1.0);
        assert_eq!(Distortion::new(f32::INFINITY).drive(), 1.0);
        assert_eq!(Distortion::new(8.0).drive(), 8.0);
    }

    #[test]
    fn output_is_bounded_and_odd() {
        let dist = Distortion::new(50.0);
        for &x in &[-10.0, -1.0, -0.01, 0.0, 0.01, 1.0, 10.0] {
            let y = dist.apply(x);
            assert!(y.abs() <= 1.0);
            assert!((y + dist.apply(-x)).abs() < 1e-6);
        }
    }

    #[test]
    fn more_drive_is_louder_for_quiet_input() {
        let soft = Distortion::new(1.0).apply(0.1);
        let hot = Distortion::new(10.0).apply(0.1);
        assert!(hot > soft * 5.0);
    }
}
