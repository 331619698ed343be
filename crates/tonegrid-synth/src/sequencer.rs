//! Sixteenth-note step sequencer driving a single VCO.
//!
//! Each [`Step`] carries a pitch, a duration class, an accent and a slide flag.
//! The sequencer reads its clock from a borrowed [`Transport`], so several
//! sequencers rendered against the same transport stay in lockstep.
//!
//! Duration classes gate the note for a quarter of a step each: `1` is a
//! short blip, `3` leaves a small gap, `4` ties into the next step. Class `0`
//! mutes the VCO (frequency forced to 0) and releases the envelope.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use tonegrid_core::{
    Chain, Effect, EffectExt, LadderFilter, LadderMode, LfoWaveform, LinearSmoothedParam,
    Transport, sanitize_output,
};
use tonegrid_effects::{Chorus, Echo};

use crate::envelope::{AdsrEnvelope, Envelope};
use crate::note::{NoteName, note_to_freq};
use crate::oscillator::{Oscillator, OscillatorKind, WaveShape};

/// Longest duration class.
pub const MAX_DURATION: u8 = 4;

/// Pitch of a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepPitch {
    /// Raw frequency in Hz.
    Hz(f32),
    /// Note name and octave, C4 = middle C.
    Note {
        /// Pitch class.
        note: NoteName,
        /// Octave number.
        octave: i32,
    },
}

impl StepPitch {
    /// Frequency in Hz.
    pub fn frequency(self) -> f32 {
        match self {
            StepPitch::Hz(hz) => hz,
            StepPitch::Note { note, octave } => note_to_freq(note, octave),
        }
    }
}

/// One sequencer step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// What to play.
    pub pitch: StepPitch,
    /// Gate length in quarter steps, `0..=4`. Zero mutes.
    pub duration: u8,
    /// Skip the attack and start the envelope at `accent_strength`.
    pub accent: bool,
    /// Initial level of an accented note.
    pub accent_strength: f32,
    /// Glide from the previous pitch instead of jumping.
    pub slide: bool,
}

impl Step {
    /// Half-step gate, no accent, no slide.
    pub fn new(pitch: StepPitch) -> Self {
        Self {
            pitch,
            duration: 2,
            accent: false,
            accent_strength: 1.0,
            slide: false,
        }
    }

    /// Muted step.
    pub fn rest() -> Self {
        Self {
            duration: 0,
            ..Self::new(StepPitch::Hz(0.0))
        }
    }

    /// Builder: duration class, clamped to `0..=4`.
    pub fn with_duration(mut self, duration: u8) -> Self {
        self.duration = duration.min(MAX_DURATION);
        self
    }

    /// Builder: accent at `strength`.
    pub fn with_accent(mut self, strength: f32) -> Self {
        self.accent = true;
        self.accent_strength = strength;
        self
    }

    /// Builder: slide into this step.
    pub fn with_slide(mut self) -> Self {
        self.slide = true;
        self
    }
}

type VcoEffects = Chain<Chain<LadderFilter, Chorus>, Echo>;

/// Monophonic voice of the sequencer.
///
/// Oscillator, ADSR, LFO-modulated ladder filter, chorus and feedback echo in
/// series. Pitch changes either jump or ramp linearly over the slide time.
#[derive(Debug, Clone)]
pub struct Vco {
    oscillator: Oscillator,
    envelope: AdsrEnvelope,
    pitch: LinearSmoothedParam,
    effects: VcoEffects,
    dt: f32,
    gain: f32,
}

impl Vco {
    /// Saw into a resonant low-pass, 60 ms slide.
    pub fn new(sample_rate: f32) -> Self {
        let mut ladder = LadderFilter::new(sample_rate);
        ladder.set_mode(LadderMode::LowPass);
        ladder.set_cutoff(1200.0);
        ladder.set_resonance(0.4);
        ladder.set_lfo(LfoWaveform::Sine, 0.5, 0.3);

        let mut chorus = Chorus::new(sample_rate);
        chorus.set_mix(0.25);

        let mut echo = Echo::new(sample_rate);
        echo.set_delay_time_ms(375.0);
        echo.set_feedback(0.35);
        echo.set_mix(0.2);

        let mut oscillator = Oscillator::new(OscillatorKind::Basic(WaveShape::Saw), sample_rate);
        oscillator.set_frequency(0.0);

        Self {
            oscillator,
            envelope: AdsrEnvelope::new(0.005, 0.15, 0.6, 0.1),
            pitch: LinearSmoothedParam::with_config(0.0, sample_rate, 60.0),
            effects: ladder.chain(chorus).chain(echo),
            dt: 1.0 / sample_rate,
            gain: 0.5,
        }
    }

    /// Replace the oscillator variant.
    pub fn set_oscillator(&mut self, kind: OscillatorKind) {
        *self.oscillator.kind_mut() = kind;
    }

    /// Glide time in milliseconds.
    pub fn set_slide_time_ms(&mut self, ms: f32) {
        self.pitch.set_transition_time_ms(ms);
    }

    /// Glide time in milliseconds.
    pub fn slide_time_ms(&self) -> f32 {
        self.pitch.transition_time_ms()
    }

    /// Output level before the final clamp.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    /// Current oscillator frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.pitch.get()
    }

    /// Frequency the pitch is heading to.
    pub fn target_frequency(&self) -> f32 {
        self.pitch.target()
    }

    /// Amplitude envelope.
    pub fn envelope(&self) -> &AdsrEnvelope {
        &self.envelope
    }

    /// Amplitude envelope.
    pub fn envelope_mut(&mut self) -> &mut AdsrEnvelope {
        &mut self.envelope
    }

    /// Ladder filter at the head of the effect chain.
    pub fn filter_mut(&mut self) -> &mut LadderFilter {
        self.effects.first_mut().first_mut()
    }

    /// Chorus stage.
    pub fn chorus_mut(&mut self) -> &mut Chorus {
        self.effects.first_mut().second_mut()
    }

    /// Echo stage.
    pub fn echo_mut(&mut self) -> &mut Echo {
        self.effects.second_mut()
    }

    /// Start a note. `accent` skips the attack and starts at that level.
    pub fn trigger(&mut self, frequency: f32, slide: bool, accent: Option<f32>) {
        if slide {
            self.pitch.set_target(frequency);
        } else {
            self.pitch.set_immediate(frequency);
        }
        match accent {
            Some(strength) => self.envelope.trigger_accent(strength),
            None => self.envelope.note_on(),
        }
    }

    /// Begin the release.
    pub fn release(&mut self) {
        self.envelope.note_off();
    }

    /// Force the oscillator to 0 Hz and release.
    pub fn mute(&mut self) {
        self.pitch.set_immediate(0.0);
        self.envelope.note_off();
    }

    /// Render one sample.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        self.oscillator.set_frequency(self.pitch.advance());
        let raw = self.oscillator.advance();
        let amp = self.envelope.advance(self.dt);
        sanitize_output(self.effects.process(raw * amp) * self.gain)
    }

    /// Clear oscillator phase and effect history.
    pub fn reset(&mut self) {
        self.oscillator.reset();
        self.effects.reset();
        self.envelope = AdsrEnvelope::new(
            self.envelope.attack(),
            self.envelope.decay(),
            self.envelope.sustain(),
            self.envelope.release(),
        );
        self.pitch.set_immediate(0.0);
    }
}

/// Looping step sequencer.
///
/// # Example
///
/// ```rust
/// use tonegrid_core::Transport;
/// use tonegrid_synth::{NoteName, Step, StepPitch, StepSequencer};
///
/// let mut transport = Transport::new(44100.0, 120.0);
/// let mut seq = StepSequencer::new(44100.0);
/// seq.set_steps(vec![
///     Step::new(StepPitch::Note { note: NoteName::A, octave: 2 }),
///     Step::rest(),
/// ]);
///
/// transport.play();
/// let mut buffer = [0.0f32; 256];
/// seq.render(&transport, &mut buffer);
/// transport.advance(buffer.len() as u64);
/// assert_eq!(seq.position(), Some(0));
/// ```
#[derive(Debug, Clone)]
pub struct StepSequencer {
    steps: Vec<Step>,
    position: Option<usize>,
    vco: Vco,
    sample_rate: f32,
    last_step: Option<u64>,
    gate_remaining: Option<u64>,
}

impl StepSequencer {
    /// Empty sequencer with a default [`Vco`].
    pub fn new(sample_rate: f32) -> Self {
        Self {
            steps: Vec::new(),
            position: None,
            vco: Vco::new(sample_rate),
            sample_rate,
            last_step: None,
            gate_remaining: None,
        }
    }

    /// Replace the pattern and rewind.
    pub fn set_steps(&mut self, steps: Vec<Step>) {
        self.steps = steps;
        self.position = None;
        self.last_step = None;
    }

    /// Current pattern.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Index of the step last played.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// The voice.
    pub fn vco(&self) -> &Vco {
        &self.vco
    }

    /// The voice.
    pub fn vco_mut(&mut self) -> &mut Vco {
        &mut self.vco
    }

    /// Move to the next step (wrapping) and play it.
    ///
    /// Returns the step played, or `None` for an empty pattern.
    pub fn tick(&mut self, step_length_secs: f32) -> Option<Step> {
        if self.steps.is_empty() {
            return None;
        }
        let next = self.position.map_or(0, |p| (p + 1) % self.steps.len());
        self.position = Some(next);
        let step = self.steps[next];

        if step.duration == 0 {
            self.vco.mute();
            self.gate_remaining = None;
            return Some(step);
        }

        let accent = step.accent.then_some(step.accent_strength);
        self.vco.trigger(step.pitch.frequency(), step.slide, accent);
        self.gate_remaining = if step.duration >= MAX_DURATION {
            None
        } else {
            let gate = f32::from(step.duration) / f32::from(MAX_DURATION) * step_length_secs;
            Some(((gate * self.sample_rate) as u64).max(1))
        };
        Some(step)
    }

    /// Render a mono buffer starting at the transport's current tick.
    ///
    /// Steps fire whenever the transport crosses a sixteenth boundary. The
    /// transport is not advanced; the caller owns it.
    pub fn render(&mut self, transport: &Transport, output: &mut [f32]) {
        let step_secs = transport.step_length_secs();
        let step_samples = f64::from(step_secs) * f64::from(transport.sample_rate());
        let playing = transport.is_playing() && step_samples > 0.0;

        for (offset, out) in output.iter_mut().enumerate() {
            if playing {
                let index = ((transport.tick() + offset as u64) as f64 / step_samples) as u64;
                if self.last_step != Some(index) {
                    self.last_step = Some(index);
                    self.tick(step_secs);
                }
            }
            if let Some(remaining) = self.gate_remaining.as_mut() {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    self.gate_remaining = None;
                    self.vco.release();
                }
            }
            *out = self.vco.next_sample();
        }
    }

    /// Release the VCO and rewind to the top of the pattern.
    pub fn stop(&mut self) {
        self.vco.release();
        self.gate_remaining = None;
        self.position = None;
        self.last_step = None;
    }
}
