//! Waveform generators.
//!
//! Phase is kept in radians and wrapped into `[0, 2π)` after every increment.
//! Every variant exposes the same pair of operations:
//!
//! - [`Oscillator::sample_at`] evaluates the waveform at an arbitrary phase
//! - [`Oscillator::advance`] steps the internal phase by `2π·f/sr` and returns
//!   the scaled sample at the new phase
//!
//! Waveform laws for `θ ∈ [0, 2π)` with `t = θ/2π`:
//!
//! ```text
//! Sine      sin θ
//! Square    +1 if sin θ >= 0, else -1
//! Saw       2t - 1
//! Triangle  2·|2·(t - floor(t + 0.5))| - 1
//! HalfSine  max(sin θ, 0)
//! Pulse(w)  +1 if t mod 1 < w, else -1
//! Noise     uniform in [-1, 1], fresh every call
//! ```
//!
//! `Sub` runs an inner shape at half the phase rate (one octave down),
//! `Custom` reads a [`Wavetable`], and `Morph` crossfades up to four shapes.

#[cfg(not(feature = "std"))]
use alloc::string::{String, ToString};

use core::f32::consts::TAU;
use core::fmt;
use core::str::FromStr;

use libm::{cosf, fabsf, floorf, sinf};
use tonegrid_core::{Xorshift32, lerp, wrap_phase, wrap_unit};

use crate::wavetable::Wavetable;

/// Number of slots in a [`MorphBank`].
pub const MORPH_SLOTS: usize = 4;

/// Stateless waveform law.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum WaveShape {
    /// Pure fundamental.
    #[default]
    Sine,
    /// Sign of the sine, `{+1, -1}`.
    Square,
    /// Linear ramp from -1 to +1.
    Saw,
    /// Symmetric triangle starting at -1.
    Triangle,
    /// White noise.
    Noise,
    /// Rectified upper half of the sine.
    HalfSine,
    /// Pulse with duty width in `[0, 1]`.
    Pulse(f32),
}

impl WaveShape {
    /// Evaluate at `theta` radians. `rng` is only used by [`WaveShape::Noise`].
    #[inline]
    pub fn sample(self, theta: f32, rng: &mut Xorshift32) -> f32 {
        match self {
            WaveShape::Sine => sinf(theta),
            WaveShape::Square => {
                if sinf(theta) >= 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            WaveShape::Saw => {
                let t = theta / TAU;
                2.0 * (t - floorf(t)) - 1.0
            }
            WaveShape::Triangle => {
                let t = theta / TAU;
                2.0 * fabsf(2.0 * (t - floorf(t + 0.5))) - 1.0
            }
            WaveShape::Noise => rng.next_bipolar(),
            WaveShape::HalfSine => sinf(theta).max(0.0),
            WaveShape::Pulse(width) => {
                let t = theta / TAU;
                if t - floorf(t) < width.clamp(0.0, 1.0) {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// One entry of a [`MorphBank`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphSlot {
    /// Waveform of this slot.
    pub shape: WaveShape,
    /// Disabled slots take no part in the average.
    pub enabled: bool,
}

/// Cosine crossfade across up to four waveforms.
///
/// A slow morph phase in `[0, 1)` sweeps the weights:
///
/// ```text
/// weight_i = (cos(2π·(morph_phase + i·0.25)) + 1) / 2
/// output   = Σ weight_i · shape_i(θ) / enabled_count
/// ```
///
/// Only enabled slots contribute. With every slot disabled the output is 0.
#[derive(Debug, Clone, PartialEq)]
pub struct MorphBank {
    slots: [MorphSlot; MORPH_SLOTS],
    morph_phase: f32,
    morph_rate_hz: f32,
}

impl Default for MorphBank {
    /// Sine, triangle, saw and square, all enabled, sweeping at 0.25 Hz.
    fn default() -> Self {
        Self::new(
            [
                WaveShape::Sine,
                WaveShape::Triangle,
                WaveShape::Saw,
                WaveShape::Square,
            ],
            0.25,
        )
    }
}

impl MorphBank {
    /// Create a bank with every slot enabled.
    pub fn new(shapes: [WaveShape; MORPH_SLOTS], morph_rate_hz: f32) -> Self {
        Self {
            slots: shapes.map(|shape| MorphSlot {
                shape,
                enabled: true,
            }),
            morph_phase: 0.0,
            morph_rate_hz: morph_rate_hz.max(0.0),
        }
    }

    /// Enable or disable a slot. Out-of-range indices are ignored.
    pub fn set_enabled(&mut self, index: usize, enabled: bool) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.enabled = enabled;
        }
    }

    /// Replace the shape of a slot. Out-of-range indices are ignored.
    pub fn set_shape(&mut self, index: usize, shape: WaveShape) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.shape = shape;
        }
    }

    /// Slot contents.
    pub fn slots(&self) -> &[MorphSlot; MORPH_SLOTS] {
        &self.slots
    }

    /// Morph sweep rate in Hz.
    pub fn set_morph_rate(&mut self, rate_hz: f32) {
        self.morph_rate_hz = if rate_hz.is_finite() { rate_hz.max(0.0) } else { 0.0 };
    }

    /// Morph sweep rate in Hz.
    pub fn morph_rate(&self) -> f32 {
        self.morph_rate_hz
    }

    /// Set the morph position, wrapped into `[0, 1)`.
    pub fn set_morph_phase(&mut self, phase: f32) {
        self.morph_phase = wrap_unit(phase);
    }

    /// Morph position in `[0, 1)`.
    pub fn morph_phase(&self) -> f32 {
        self.morph_phase
    }

    /// Crossfade weight of every slot at the current morph position.
    pub fn weights(&self) -> [f32; MORPH_SLOTS] {
        core::array::from_fn(|i| (cosf(TAU * (self.morph_phase + i as f32 * 0.25)) + 1.0) * 0.5)
    }

    /// Weighted average of the enabled slots at `theta`.
    #[inline]
    pub fn sample(&self, theta: f32, rng: &mut Xorshift32) -> f32 {
        let weights = self.weights();
        let mut sum = 0.0;
        let mut active = 0u32;
        for (slot, weight) in self.slots.iter().zip(weights) {
            if slot.enabled {
                sum += slot.shape.sample(theta, rng) * weight;
                active += 1;
            }
        }
        if active == 0 { 0.0 } else { sum / active as f32 }
    }

    #[inline]
    fn advance_morph(&mut self, sample_rate: f32) {
        self.morph_phase = wrap_unit(self.morph_phase + self.morph_rate_hz / sample_rate);
    }
}

/// The closed set of oscillator variants.
#[derive(Debug, Clone, PartialEq)]
pub enum OscillatorKind {
    /// Plain waveform.
    Basic(WaveShape),
    /// Waveform one octave down.
    Sub(WaveShape),
    /// Custom single-cycle table.
    Custom(Wavetable),
    /// Crossfading bank.
    Morph(MorphBank),
}

impl Default for OscillatorKind {
    fn default() -> Self {
        OscillatorKind::Basic(WaveShape::Sine)
    }
}

impl OscillatorKind {
    /// Name-level type of this variant.
    pub fn oscillator_type(&self) -> OscillatorType {
        match self {
            OscillatorKind::Basic(shape) => match shape {
                WaveShape::Sine => OscillatorType::Sine,
                WaveShape::Square => OscillatorType::Square,
                WaveShape::Saw => OscillatorType::Saw,
                WaveShape::Triangle => OscillatorType::Triangle,
                WaveShape::Noise => OscillatorType::Noise,
                WaveShape::HalfSine => OscillatorType::HalfSine,
                WaveShape::Pulse(_) => OscillatorType::Pulse,
            },
            OscillatorKind::Sub(_) => OscillatorType::Sub,
            OscillatorKind::Custom(_) => OscillatorType::Custom,
            OscillatorKind::Morph(_) => OscillatorType::Morph,
        }
    }
}

/// Oscillator type by name, as stored in presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OscillatorType {
    /// `sine`
    Sine,
    /// `square`
    Square,
    /// `saw`
    Saw,
    /// `triangle`
    Triangle,
    /// `noise`
    Noise,
    /// `half_sine`
    HalfSine,
    /// `pulse`, 25% duty
    Pulse,
    /// `sub`, square one octave down
    Sub,
    /// `custom`, the default wavetable
    Custom,
    /// `morph`, the default morph bank
    Morph,
}

impl OscillatorType {
    /// Every type, in display order.
    pub const ALL: [OscillatorType; 10] = [
        OscillatorType::Sine,
        OscillatorType::Square,
        OscillatorType::Saw,
        OscillatorType::Triangle,
        OscillatorType::Noise,
        OscillatorType::HalfSine,
        OscillatorType::Pulse,
        OscillatorType::Sub,
        OscillatorType::Custom,
        OscillatorType::Morph,
    ];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            OscillatorType::Sine => "sine",
            OscillatorType::Square => "square",
            OscillatorType::Saw => "saw",
            OscillatorType::Triangle => "triangle",
            OscillatorType::Noise => "noise",
            OscillatorType::HalfSine => "half_sine",
            OscillatorType::Pulse => "pulse",
            OscillatorType::Sub => "sub",
            OscillatorType::Custom => "custom",
            OscillatorType::Morph => "morph",
        }
    }

    /// Default instance of this type.
    pub fn build(self) -> OscillatorKind {
        match self {
            OscillatorType::Sine => OscillatorKind::Basic(WaveShape::Sine),
            OscillatorType::Square => OscillatorKind::Basic(WaveShape::Square),
            OscillatorType::Saw => OscillatorKind::Basic(WaveShape::Saw),
            OscillatorType::Triangle => OscillatorKind::Basic(WaveShape::Triangle),
            OscillatorType::Noise => OscillatorKind::Basic(WaveShape::Noise),
            OscillatorType::HalfSine => OscillatorKind::Basic(WaveShape::HalfSine),
            OscillatorType::Pulse => OscillatorKind::Basic(WaveShape::Pulse(0.25)),
            OscillatorType::Sub => OscillatorKind::Sub(WaveShape::Square),
            OscillatorType::Custom => OscillatorKind::Custom(Wavetable::default()),
            OscillatorType::Morph => OscillatorKind::Morph(MorphBank::default()),
        }
    }
}

impl fmt::Display for OscillatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown oscillator name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOscillatorError {
    name: String,
}

impl ParseOscillatorError {
    /// The rejected name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ParseOscillatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown oscillator type '{}'", self.name)
    }
}

impl core::error::Error for ParseOscillatorError {}

impl FromStr for OscillatorType {
    type Err = ParseOscillatorError;

    /// Case-insensitive. Also accepts `sawtooth` and `halfsine`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("sawtooth") {
            return Ok(OscillatorType::Saw);
        }
        if trimmed.eq_ignore_ascii_case("halfsine") {
            return Ok(OscillatorType::HalfSine);
        }
        OscillatorType::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseOscillatorError {
                name: s.to_string(),
            })
    }
}

/// Phase-accumulating oscillator.
///
/// # Example
///
/// ```rust
/// use tonegrid_synth::{Oscillator, OscillatorKind, WaveShape};
///
/// let mut osc = Oscillator::new(OscillatorKind::Basic(WaveShape::Saw), 48000.0);
/// osc.set_frequency(220.0);
/// let sample = osc.advance();
/// assert!(sample.abs() <= 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Oscillator {
    kind: OscillatorKind,
    phase: f32,
    sub_phase: f32,
    frequency: f32,
    sample_rate: f32,
    amplitude: f32,
    rng: Xorshift32,
}

impl Oscillator {
    /// Create at 440 Hz, unit amplitude, phase 0.
    pub fn new(kind: OscillatorKind, sample_rate: f32) -> Self {
        Self {
            kind,
            phase: 0.0,
            sub_phase: 0.0,
            frequency: 440.0,
            sample_rate,
            amplitude: 1.0,
            rng: Xorshift32::default(),
        }
    }

    /// Reseed the noise generator.
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.rng = Xorshift32::new(seed);
        self
    }

    /// Set frequency in Hz. Negative and non-finite values become 0.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.frequency = if freq_hz.is_finite() { freq_hz.max(0.0) } else { 0.0 };
    }

    /// Frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Output scale applied by [`Oscillator::advance`].
    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = if amplitude.is_finite() { amplitude } else { 0.0 };
    }

    /// Output scale.
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Update the sample rate; frequency in Hz is kept.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Phase in radians, `[0, 2π)`.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Set the phase in radians; wrapped into `[0, 2π)`.
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = wrap_phase(phase);
        self.sub_phase = wrap_phase(phase * 0.5);
    }

    /// Rewind to phase 0.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.sub_phase = 0.0;
    }

    /// Active variant.
    pub fn kind(&self) -> &OscillatorKind {
        &self.kind
    }

    /// Mutable access to the variant, e.g. to toggle morph slots.
    pub fn kind_mut(&mut self) -> &mut OscillatorKind {
        &mut self.kind
    }

    /// Evaluate the waveform at `theta` radians, ignoring amplitude.
    ///
    /// `Sub` evaluates its inner shape at `theta / 2`.
    #[inline]
    pub fn sample_at(&mut self, theta: f32) -> f32 {
        match &self.kind {
            OscillatorKind::Basic(shape) => shape.sample(theta, &mut self.rng),
            OscillatorKind::Sub(shape) => shape.sample(theta * 0.5, &mut self.rng),
            OscillatorKind::Custom(table) => table.lookup(theta / TAU),
            OscillatorKind::Morph(bank) => bank.sample(theta, &mut self.rng),
        }
    }

    /// Step the phase by `2π·f/sr` and return the scaled sample.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        let increment = TAU * self.frequency / self.sample_rate;
        self.phase = wrap_phase(self.phase + increment);

        let raw = match &mut self.kind {
            OscillatorKind::Basic(shape) => shape.sample(self.phase, &mut self.rng),
            OscillatorKind::Sub(shape) => {
                // Half-rate accumulator of its own, so the sub cycle spans two main cycles.
                self.sub_phase = wrap_phase(self.sub_phase + increment * 0.5);
                shape.sample(self.sub_phase, &mut self.rng)
            }
            OscillatorKind::Custom(table) => table.lookup(self.phase / TAU),
            OscillatorKind::Morph(bank) => {
                bank.advance_morph(self.sample_rate);
                bank.sample(self.phase, &mut self.rng)
            }
        };
        raw * self.amplitude
    }
}

/// Two oscillators blended with `lerp(a, b, mix)`.
#[derive(Debug, Clone)]
pub struct DualOscillator {
    /// First oscillator, heard alone at mix 0.
    pub a: Oscillator,
    /// Second oscillator, heard alone at mix 1.
    pub b: Oscillator,
    mix: f32,
}

impl DualOscillator {
    /// Pair two oscillators.
    pub fn new(a: Oscillator, b: Oscillator, mix: f32) -> Self {
        let mut dual = Self { a, b, mix: 0.0 };
        dual.set_mix(mix);
        dual
    }

    /// Blend amount in `[0, 1]`.
    pub fn set_mix(&mut self, mix: f32) {
        self.mix = if mix.is_finite() { mix.clamp(0.0, 1.0) } else { 0.0 };
    }

    /// Blend amount.
    pub fn mix(&self) -> f32 {
        self.mix
    }

    /// Tune both oscillators.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.a.set_frequency(freq_hz);
        self.b.set_frequency(freq_hz);
    }

    /// Shared frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.a.frequency()
    }

    /// Evaluate both at `theta` and blend.
    #[inline]
    pub fn sample_at(&mut self, theta: f32) -> f32 {
        let a = self.a.sample_at(theta);
        let b = self.b.sample_at(theta);
        Self::blend(a, b, self.mix)
    }

    /// Advance both and blend.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        let a = self.a.advance();
        let b = self.b.advance();
        Self::blend(a, b, self.mix)
    }

    /// `a` at mix 0, `b` at mix 1, linear in between.
    #[inline]
    pub fn blend(a: f32, b: f32, mix: f32) -> f32 {
        if mix <= 0.0 {
            a
        } else if mix >= 1.0 {
            b
        } else {
            lerp(a, b, mix)
        }
    }

    /// Rewind both.
    pub fn reset(&mut self) {
        self.a.reset();
        self.b.reset();
    }
}
