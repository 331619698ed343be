//! Single-cycle wavetables for the custom oscillator.
//!
//! A table holds [`TABLE_SIZE`] samples of one cycle, pre-sampled from a
//! shaping curve over `[0, 1)`. Lookups interpolate linearly between the two
//! nearest entries and always wrap modulo the table size.
//!
//! The sample storage is reference counted, so cloning a [`Wavetable`] into
//! every new voice is a pointer copy.

#[cfg(not(feature = "std"))]
use alloc::{sync::Arc, vec::Vec};
#[cfg(feature = "std")]
use std::sync::Arc;

use libm::floorf;

/// Number of entries in every table.
pub const TABLE_SIZE: usize = 1024;

/// A 1024-entry single-cycle table.
///
/// # Example
///
/// ```rust
/// use tonegrid_synth::Wavetable;
///
/// // Rising ramp from -1 to 1 with a flat top
/// let table = Wavetable::from_points(&[(0.0, -1.0), (0.75, 1.0), (1.0, 1.0)]);
/// assert!((table.lookup(0.0) + 1.0).abs() < 1e-6);
/// assert!((table.lookup(0.9) - 1.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Wavetable {
    samples: Arc<[f32]>,
}

impl Wavetable {
    /// Sample `curve` at `i / TABLE_SIZE` for every entry.
    pub fn from_fn(curve: impl Fn(f32) -> f32) -> Self {
        let samples: Vec<f32> = (0..TABLE_SIZE)
            .map(|i| {
                let y = curve(i as f32 / TABLE_SIZE as f32);
                if y.is_finite() { y } else { 0.0 }
            })
            .collect();
        Self {
            samples: Arc::from(samples),
        }
    }

    /// Build from `(time, value)` keys, linearly interpolated.
    ///
    /// Keys are sorted by time. Before the first key and after the last the
    /// curve holds the end value. With no keys the table is all zeros.
    pub fn from_points(points: &[(f32, f32)]) -> Self {
        let mut keys: Vec<(f32, f32)> = points
            .iter()
            .copied()
            .filter(|(t, v)| t.is_finite() && v.is_finite())
            .collect();
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self::from_fn(|t| evaluate_keys(&keys, t))
    }

    /// All-zero table.
    pub fn silent() -> Self {
        Self::from_fn(|_| 0.0)
    }

    /// Read at a normalized position. Any finite `position` is wrapped into `[0, 1)`.
    #[inline]
    pub fn lookup(&self, position: f32) -> f32 {
        if !position.is_finite() {
            return 0.0;
        }
        let pos = (position - floorf(position)) * TABLE_SIZE as f32;
        let index = pos as usize;
        let frac = pos - index as f32;
        let i0 = index % TABLE_SIZE;
        let i1 = (i0 + 1) % TABLE_SIZE;
        let a = self.samples[i0];
        let b = self.samples[i1];
        a + (b - a) * frac
    }

    /// Raw table entries.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

impl Default for Wavetable {
    /// A soft organ-like cycle: fundamental plus a quieter octave.
    fn default() -> Self {
        Self::from_fn(|t| {
            let theta = core::f32::consts::TAU * t;
            0.7 * libm::sinf(theta) + 0.3 * libm::sinf(2.0 * theta)
        })
    }
}

fn evaluate_keys(keys: &[(f32, f32)], t: f32) -> f32 {
    let (Some(&first), Some(&last)) = (keys.first(), keys.last()) else {
        return 0.0;
    };
    if t <= first.0 {
        return first.1;
    }
    if t >= last.0 {
        return last.1;
    }
    for pair in keys.windows(2) {
        let (t0, v0) = pair[0];
        let (t1, v1) = pair[1];
        if t >= t0 && t <= t1 {
            let span = t1 - t0;
            if span <= f32::EPSILON {
                return v1;
            }
            return v0 + (v1 - v0) * (t - t0) / span;
        }
    }
    last.1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_curve_is_silent() {
        let table = Wavetable::from_points(&[]);
        assert_eq!(table.samples().len(), TABLE_SIZE);
        assert!(table.samples().iter().all(|&s| s == 0.0));
        assert_eq!(table.lookup(0.37), 0.0);
    }

    #[test]
    fn single_key_is_constant() {
        let table = Wavetable::from_points(&[(0.4, 0.25)]);
        assert!(table.samples().iter().all(|&s| s == 0.25));
    }

    #[test]
    fn lookup_wraps_past_the_end() {
        let table = Wavetable::from_fn(|t| t);
        // Position just below 1 interpolates towards entry 0.
        let last = table.lookup(1.0 - 0.5 / TABLE_SIZE as f32);
        let expected = (table.samples()[TABLE_SIZE - 1] + table.samples()[0]) * 0.5;
        assert!((last - expected).abs() < 1e-4, "{last} vs {expected}");
        assert!((table.lookup(1.25) - table.lookup(0.25)).abs() < 1e-6);
        assert!((table.lookup(-0.75) - table.lookup(0.25)).abs() < 1e-6);
    }

    #[test]
    fn interpolates_between_entries() {
        let table = Wavetable::from_fn(|t| t * 2.0);
        let step = 1.0 / TABLE_SIZE as f32;
        let mid = table.lookup(10.5 * step);
        assert!((mid - 10.5 * step * 2.0).abs() < 1e-5);
    }

    #[test]
    fn unsorted_keys_are_sorted() {
        let table = Wavetable::from_points(&[(1.0, 1.0), (0.0, -1.0)]);
        assert!(table.lookup(0.0) < -0.99);
        assert!(table.lookup(0.5).abs() < 0.01);
    }

    #[test]
    fn clones_share_storage() {
        let a = Wavetable::default();
        let b = a.clone();
        assert!(core::ptr::eq(a.samples().as_ptr(), b.samples().as_ptr()));
    }
}
