//! Math helpers shared by the synthesis path.
//!
//! All functions are allocation-free and `no_std` friendly.
//!
//! # Shaping curves
//!
//! | Function | Character |
//! |----------|-----------|
//! | [`soft_clip`] | tanh, smooth and warm |
//! | [`arctan_clip`] | softer knee than tanh, slower approach to ±1 |
//! | [`cubic_clip`] | polynomial knee, exactly ±1 past the threshold |
//! | [`hard_clip`] | flat tops |

use core::f32::consts::{FRAC_2_PI, TAU};
use libm::{atanf, expf, floorf, tanhf};

/// Convert decibels to linear gain.
///
/// ```rust
/// use tonegrid_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Soft clip using hyperbolic tangent. Output in (-1, 1).
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    tanhf(x)
}

/// Arctangent clipper scaled so that the asymptotes sit at ±1.
#[inline]
pub fn arctan_clip(x: f32) -> f32 {
    FRAC_2_PI * atanf(x)
}

/// Cubic soft clip: `1.5·(x − x³/3)` inside ±1, ±1 outside.
///
/// Continuous in value and slope at the knee.
#[inline]
pub fn cubic_clip(x: f32) -> f32 {
    if x >= 1.0 {
        1.0
    } else if x <= -1.0 {
        -1.0
    } else {
        1.5 * (x - x * x * x / 3.0)
    }
}

/// Hard clip to `±threshold`.
#[inline]
pub fn hard_clip(x: f32, threshold: f32) -> f32 {
    x.clamp(-threshold, threshold)
}

/// Linear interpolation: `a` at `t = 0`, `b` at `t = 1`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp into `[0, 1]`.
#[inline]
pub fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Wrap a phase in radians into `[0, 2π)`.
///
/// Handles increments larger than one period and negative phases.
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    if (0.0..TAU).contains(&phase) {
        return phase;
    }
    let mut wrapped = phase - TAU * floorf(phase / TAU);
    // Rounding can land just outside the range on either side.
    if wrapped < 0.0 {
        wrapped += TAU;
    }
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Wrap a normalized phase into `[0, 1)`.
#[inline]
pub fn wrap_unit(phase: f32) -> f32 {
    let wrapped = phase - floorf(phase);
    if (0.0..1.0).contains(&wrapped) {
        wrapped
    } else {
        0.0
    }
}

/// Final-stage guard for anything written to an output buffer.
///
/// Non-finite input degrades to silence; everything else is clamped to `[-1, 1]`.
#[inline]
pub fn sanitize_output(x: f32) -> f32 {
    if x.is_finite() { x.clamp(-1.0, 1.0) } else { 0.0 }
}

/// Flush subnormal floats to zero.
///
/// Values below 1e-20 are replaced with zero, leaving headroom before the IEEE 754
/// subnormal range. Use in any feedback path that can decay indefinitely.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Crossfade between dry and wet signals: `dry + (wet - dry) * mix`.
#[inline]
pub fn wet_dry_mix(dry: f32, wet: f32, mix: f32) -> f32 {
    dry + (wet - dry) * mix
}
