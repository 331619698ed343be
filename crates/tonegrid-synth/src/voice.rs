//! A single sounding note.
//!
//! Signal flow per sample:
//!
//! ```text
//! oscillator A ─┐
//!               ├─ lerp(mix) ─ tanh drive ─ filter ─ × envelope ─ × 0.5 ─ [grain gate] ─ out
//! oscillator B ─┘
//! ```
//!
//! Every stage is a concrete type picked from a closed enum when the voice is
//! built, so the per-sample path never goes through a vtable.

use libm::fabsf;
use tonegrid_core::{Effect, LadderFilter, LadderMode, LfoWaveform, Smoother};
use tonegrid_effects::{Distortion, GrainGate, GrainSettings};

use crate::envelope::{Envelope, EnvelopeKind, VoiceEnvelope};
use crate::oscillator::{DualOscillator, Oscillator, OscillatorKind};

/// Two frequencies closer than this are treated as the same note.
pub const FREQUENCY_TOLERANCE_HZ: f32 = 0.01;

/// Fixed headroom applied to every voice.
pub const VOICE_GAIN: f32 = 0.5;

/// Unique voice identity. Never reused within one engine or pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u64);

impl core::fmt::Display for VoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "voice#{}", self.0)
    }
}

/// Filter choice for new voices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterSettings {
    /// One-pole smoother, `y = (1-s)·y + s·x`.
    Smoothing {
        /// Coefficient `s` in `(0, 1]`; 1 passes the signal through.
        smoothing: f32,
    },
    /// Resonant ladder with optional cutoff LFO.
    Ladder {
        /// Base cutoff in Hz.
        cutoff: f32,
        /// Resonance in `[0, 1]`.
        resonance: f32,
        /// Output response.
        mode: LadderMode,
        /// LFO shape.
        lfo_waveform: LfoWaveform,
        /// LFO rate in Hz.
        lfo_rate: f32,
        /// Sweep depth in `[0, 1]`, ±4 octaves at 1.
        lfo_depth: f32,
    },
}

impl Default for FilterSettings {
    fn default() -> Self {
        FilterSettings::Smoothing { smoothing: 1.0 }
    }
}

/// Per-voice filter.
#[derive(Debug, Clone)]
pub enum VoiceFilter {
    /// One-pole smoother.
    Smoothing(Smoother),
    /// Ladder filter.
    Ladder(LadderFilter),
}

impl VoiceFilter {
    /// Build the filter described by `settings`.
    pub fn new(settings: FilterSettings, sample_rate: f32) -> Self {
        match settings {
            FilterSettings::Smoothing { smoothing } => {
                VoiceFilter::Smoothing(Smoother::new(smoothing))
            }
            FilterSettings::Ladder {
                cutoff,
                resonance,
                mode,
                lfo_waveform,
                lfo_rate,
                lfo_depth,
            } => {
                let mut ladder = LadderFilter::new(sample_rate);
                ladder.set_cutoff(cutoff);
                ladder.set_resonance(resonance);
                ladder.set_mode(mode);
                ladder.set_lfo(lfo_waveform, lfo_rate, lfo_depth);
                VoiceFilter::Ladder(ladder)
            }
        }
    }

    /// Filter one sample.
    #[inline]
    pub fn apply(&mut self, input: f32) -> f32 {
        match self {
            VoiceFilter::Smoothing(filter) => filter.process(input),
            VoiceFilter::Ladder(filter) => filter.process(input),
        }
    }
}

/// Sound settings copied into every new voice.
///
/// Changing a timbre never restyles voices that are already sounding.
#[derive(Debug, Clone)]
pub struct Timbre {
    /// First oscillator.
    pub osc_a: OscillatorKind,
    /// Second oscillator.
    pub osc_b: OscillatorKind,
    /// Blend from A (0) to B (1).
    pub osc_mix: f32,
    /// Envelope shape.
    pub envelope: EnvelopeKind,
    /// Attack in seconds.
    pub attack: f32,
    /// Decay in seconds (ADSR only).
    pub decay: f32,
    /// Sustain level (ADSR only).
    pub sustain: f32,
    /// Release in seconds.
    pub release: f32,
    /// Filter stage.
    pub filter: FilterSettings,
    /// tanh drive, at least 1.
    pub drive: f32,
    /// Grain gate, if any.
    pub grain: Option<GrainSettings>,
}

impl Default for Timbre {
    fn default() -> Self {
        Self {
            osc_a: OscillatorKind::default(),
            osc_b: OscillatorKind::default(),
            osc_mix: 0.0,
            envelope: EnvelopeKind::Adsr,
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.2,
            filter: FilterSettings::default(),
            drive: 1.0,
            grain: None,
        }
    }
}

/// One note: oscillators, drive, filter, envelope and optional grain gate.
///
/// # Example
///
/// ```rust
/// use tonegrid_synth::{Timbre, Voice, VoiceId};
///
/// let mut voice = Voice::new(VoiceId(1), 440.0, &Timbre::default(), 44100.0);
/// let step = 1.0 / 44100.0;
/// for _ in 0..441 {
///     voice.next_sample(step);
/// }
/// voice.note_off();
/// while voice.is_active() {
///     voice.next_sample(step);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Voice {
    id: VoiceId,
    frequency: f32,
    oscillators: DualOscillator,
    distortion: Distortion,
    filter: VoiceFilter,
    envelope: VoiceEnvelope,
    gate: Option<GrainGate>,
}

impl Voice {
    /// Build a voice for `frequency` and start its envelope.
    ///
    /// The grain gate, if enabled, is seeded from the voice id so that
    /// simultaneous voices do not chop in lockstep.
    pub fn new(id: VoiceId, frequency: f32, timbre: &Timbre, sample_rate: f32) -> Self {
        let seed = (id.0 as u32) ^ 0x5EED_0000;
        let a = Oscillator::new(timbre.osc_a.clone(), sample_rate).with_seed(seed);
        let b = Oscillator::new(timbre.osc_b.clone(), sample_rate).with_seed(seed.rotate_left(16));
        let mut oscillators = DualOscillator::new(a, b, timbre.osc_mix);
        oscillators.set_frequency(frequency);

        let mut envelope = VoiceEnvelope::new(
            timbre.envelope,
            timbre.attack,
            timbre.decay,
            timbre.sustain,
            timbre.release,
        );
        envelope.note_on();

        Self {
            id,
            frequency: oscillators.frequency(),
            oscillators,
            distortion: Distortion::new(timbre.drive),
            filter: VoiceFilter::new(timbre.filter, sample_rate),
            envelope,
            gate: timbre
                .grain
                .map(|settings| GrainGate::with_seed(settings, seed.wrapping_mul(0x9E37_79B9))),
        }
    }

    /// Voice identity.
    pub fn id(&self) -> VoiceId {
        self.id
    }

    /// Target frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// `true` if `freq_hz` is within [`FREQUENCY_TOLERANCE_HZ`] of this voice.
    pub fn matches_frequency(&self, freq_hz: f32) -> bool {
        fabsf(self.frequency - freq_hz) <= FREQUENCY_TOLERANCE_HZ
    }

    /// Current envelope amplitude.
    pub fn envelope_level(&self) -> f32 {
        self.envelope.level()
    }

    /// Mutable access to the envelope, e.g. for accents.
    pub fn envelope_mut(&mut self) -> &mut VoiceEnvelope {
        &mut self.envelope
    }

    /// Start the release tail. The voice stays active until it finishes.
    pub fn note_off(&mut self) {
        self.envelope.note_off();
    }

    /// Restart the envelope, keeping oscillator phase.
    pub fn retrigger(&mut self) {
        self.envelope.note_on();
    }

    /// Move to a new frequency and restart the envelope.
    pub fn retarget(&mut self, frequency: f32) {
        self.oscillators.set_frequency(frequency);
        self.frequency = self.oscillators.frequency();
        self.envelope.note_on();
    }

    /// `false` once the envelope has gone silent.
    pub fn is_active(&self) -> bool {
        !self.envelope.is_silent()
    }

    /// Render one sample, `step` seconds after the previous one.
    #[inline]
    pub fn next_sample(&mut self, step: f32) -> f32 {
        let raw = self.oscillators.advance();
        let shaped = self.distortion.apply(raw);
        let filtered = self.filter.apply(shaped);
        let amp = self.envelope.advance(step);
        let out = filtered * amp * VOICE_GAIN;
        match &mut self.gate {
            Some(gate) => gate.apply(out, step),
            None => out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::AdsrEnvelope;
    use crate::oscillator::WaveShape;

    const SR: f32 = 44100.0;
    const STEP: f32 = 1.0 / SR;

    fn sine_timbre() -> Timbre {
        Timbre {
            osc_a: OscillatorKind::Basic(WaveShape::Sine),
            osc_b: OscillatorKind::Basic(WaveShape::Square),
            ..Timbre::default()
        }
    }

    #[test]
    fn output_matches_hand_computed_chain() {
        let timbre = Timbre {
            attack: 0.001,
            drive: 2.0,
            ..sine_timbre()
        };
        let mut voice = Voice::new(VoiceId(0), 440.0, &timbre, SR);
        let mut osc = Oscillator::new(OscillatorKind::Basic(WaveShape::Sine), SR);
        osc.set_frequency(440.0);
        let mut env = AdsrEnvelope::new(0.001, 0.1, 0.7, 0.2);
        env.note_on();
        for _ in 0..200 {
            let expected = libm::tanhf(osc.advance() * 2.0) * env.advance(STEP) * VOICE_GAIN;
            let got = voice.next_sample(STEP);
            assert!((got - expected).abs() < 1e-6, "{got} vs {expected}");
        }
    }

    #[test]
    fn release_tail_keeps_voice_active() {
        let mut voice = Voice::new(VoiceId(3), 220.0, &sine_timbre(), SR);
        for _ in 0..2000 {
            voice.next_sample(STEP);
        }
        voice.note_off();
        assert!(voice.is_active(), "release has only just started");
        let mut ticks = 0;
        while voice.is_active() {
            voice.next_sample(STEP);
            ticks += 1;
            assert!(ticks < SR as usize, "release never finished");
        }
        assert_eq!(voice.envelope_level(), 0.0);
    }

    #[test]
    fn output_is_bounded_by_voice_gain() {
        let timbre = Timbre {
            drive: 50.0,
            filter: FilterSettings::Ladder {
                cutoff: 800.0,
                resonance: 1.0,
                mode: LadderMode::LowPass,
                lfo_waveform: LfoWaveform::Sine,
                lfo_rate: 3.0,
                lfo_depth: 1.0,
            },
            ..sine_timbre()
        };
        let mut voice = Voice::new(VoiceId(1), 110.0, &timbre, SR);
        for _ in 0..20_000 {
            let y = voice.next_sample(STEP);
            assert!(y.is_finite() && y.abs() <= VOICE_GAIN + 1e-6, "{y}");
        }
    }

    #[test]
    fn grain_gate_chops_output() {
        let timbre = Timbre {
            grain: Some(GrainSettings {
                rate: 20.0,
                duty: 0.5,
                jitter: 0.0,
            }),
            osc_a: OscillatorKind::Basic(WaveShape::Square),
            attack: 0.001,
            sustain: 1.0,
            ..Timbre::default()
        };
        let mut voice = Voice::new(VoiceId(9), 100.0, &timbre, SR);
        let silent = (0..SR as usize)
            .filter(|_| voice.next_sample(STEP) == 0.0)
            .count();
        let fraction = silent as f32 / SR;
        assert!((fraction - 0.5).abs() < 0.02, "muted fraction {fraction}");
    }

    #[test]
    fn retarget_moves_frequency_and_restarts() {
        let mut voice = Voice::new(VoiceId(2), 220.0, &sine_timbre(), SR);
        voice.note_off();
        for _ in 0..100 {
            voice.next_sample(STEP);
        }
        voice.retarget(330.0);
        assert!(voice.matches_frequency(330.0));
        assert!(!voice.matches_frequency(220.0));
        let before = voice.envelope_level();
        voice.next_sample(STEP);
        assert!(voice.envelope_level() > before, "attack restarted");
    }

    #[test]
    fn frequency_tolerance() {
        let voice = Voice::new(VoiceId(4), 261.63, &sine_timbre(), SR);
        assert!(voice.matches_frequency(261.625));
        assert!(!voice.matches_frequency(262.0));
    }
}
