//! Property-based tests for tonegrid effects.
//!
//! Random settings and input must keep every effect finite and bounded, and
//! the grain gate must only ever pass or mute.

use proptest::prelude::*;
use tonegrid_core::Effect;
use tonegrid_effects::{
    Chorus, Distortion, Echo, GrainGate, GrainSettings, SaturationCurve, Saturator,
};

fn curve_from_index(i: usize) -> SaturationCurve {
    match i % 4 {
        0 => SaturationCurve::Tanh,
        1 => SaturationCurve::Arctan,
        2 => SaturationCurve::Cubic,
        _ => SaturationCurve::HardClip,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// tanh drive output is always inside [-1, 1].
    #[test]
    fn distortion_bounded(drive in -10.0f32..1000.0f32, x in -100.0f32..100.0f32) {
        let y = Distortion::new(drive).apply(x);
        prop_assert!(y.abs() <= 1.0, "drive={} x={} -> {}", drive, x, y);
    }

    /// Saturator output stays bounded for unit-range input with any curve and drive.
    #[test]
    fn saturator_bounded(
        curve in 0usize..4,
        drive in 1.0f32..100.0f32,
        mix in 0.0f32..=1.0f32,
        tone in 100.0f32..20_000.0f32,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut sat = Saturator::new(48000.0);
        sat.set_curve(curve_from_index(curve));
        sat.set_drive(drive);
        sat.set_mix(mix);
        sat.set_tone_hz(tone);
        for _ in 0..8 {
            for &x in &input {
                let y = sat.process(x);
                prop_assert!(y.is_finite() && y.abs() <= 1.0 + 1e-5, "{}", y);
            }
        }
    }

    /// Grain gate output is always the input or exact silence.
    #[test]
    fn grain_gate_passes_or_mutes(
        rate in 0.1f32..200.0f32,
        duty in 0.0f32..=1.0f32,
        jitter in 0.0f32..=1.0f32,
        seed in 1u32..u32::MAX,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut gate = GrainGate::with_seed(GrainSettings { rate, duty, jitter }, seed);
        for _ in 0..64 {
            for &x in &input {
                let y = gate.apply(x, 1.0 / 48000.0);
                prop_assert!(y == x || y == 0.0);
            }
        }
    }

    /// Chorus and echo with unit-range input stay finite.
    #[test]
    fn modulated_delays_finite(
        rate in 0.0f32..10.0f32,
        depth in 0.0f32..=1.0f32,
        feedback in 0.0f32..=1.0f32,
        time_ms in 1.0f32..2000.0f32,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut chorus = Chorus::new(48000.0);
        chorus.set_rate(rate);
        chorus.set_depth(depth);
        let mut echo = Echo::new(48000.0);
        echo.set_delay_time_ms(time_ms);
        echo.set_feedback(feedback);
        for _ in 0..64 {
            for &x in &input {
                prop_assert!(chorus.process(x).is_finite());
                prop_assert!(echo.process(x).is_finite());
            }
        }
    }
}
