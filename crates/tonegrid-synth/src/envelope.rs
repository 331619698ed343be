//! Amplitude envelopes.
//!
//! Two shapes share the [`Envelope`] contract:
//!
//! - [`ArEnvelope`] moves linearly towards 1 while held and towards 0 after
//!   release, at `dt/attack` and `dt/release` per tick.
//! - [`AdsrEnvelope`] is an explicit stage machine. Every stage ramps
//!   linearly from the amplitude it started at, so a release in the middle of
//!   the attack starts from where the attack had got to.
//!
//! Envelopes are advanced by elapsed time in seconds rather than by sample
//! count. All time constants are held at or above [`MIN_TIME`].

/// Shortest accepted stage time in seconds.
pub const MIN_TIME: f32 = 0.001;

/// Amplitude at or below which a released AR envelope counts as silent.
pub const SILENCE_THRESHOLD: f32 = 0.001;

fn clamp_time(secs: f32) -> f32 {
    if secs.is_finite() { secs.max(MIN_TIME) } else { MIN_TIME }
}

fn clamp_level(level: f32) -> f32 {
    if level.is_finite() { level.clamp(0.0, 1.0) } else { 0.0 }
}

/// Shared envelope contract.
pub trait Envelope {
    /// Start (or restart) the note from the current amplitude.
    fn note_on(&mut self);

    /// Begin the release from the current amplitude.
    fn note_off(&mut self);

    /// Advance by `dt` seconds and return the amplitude in `[0, 1]`.
    fn advance(&mut self, dt: f32) -> f32;

    /// Amplitude without advancing.
    fn level(&self) -> f32;

    /// `true` once the release has finished.
    fn is_silent(&self) -> bool;
}

/// Attack/release envelope.
///
/// # Example
///
/// ```rust
/// use tonegrid_synth::{ArEnvelope, Envelope};
///
/// let mut env = ArEnvelope::new(0.01, 0.1);
/// env.note_on();
/// for _ in 0..10 {
///     env.advance(0.001);
/// }
/// assert!((env.level() - 1.0).abs() < 1e-4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ArEnvelope {
    attack: f32,
    release: f32,
    amplitude: f32,
    target: f32,
}

impl ArEnvelope {
    /// Create a silent envelope.
    pub fn new(attack: f32, release: f32) -> Self {
        Self {
            attack: clamp_time(attack),
            release: clamp_time(release),
            amplitude: 0.0,
            target: 0.0,
        }
    }

    /// Attack time in seconds.
    pub fn set_attack(&mut self, secs: f32) {
        self.attack = clamp_time(secs);
    }

    /// Release time in seconds.
    pub fn set_release(&mut self, secs: f32) {
        self.release = clamp_time(secs);
    }

    /// Attack time in seconds.
    pub fn attack(&self) -> f32 {
        self.attack
    }

    /// Release time in seconds.
    pub fn release(&self) -> f32 {
        self.release
    }
}

impl Envelope for ArEnvelope {
    fn note_on(&mut self) {
        self.target = 1.0;
    }

    fn note_off(&mut self) {
        self.target = 0.0;
    }

    #[inline]
    fn advance(&mut self, dt: f32) -> f32 {
        if self.amplitude < self.target {
            self.amplitude += dt / self.attack;
        } else if self.amplitude > self.target {
            self.amplitude -= dt / self.release;
        }
        self.amplitude = clamp_level(self.amplitude);
        self.amplitude
    }

    fn level(&self) -> f32 {
        self.amplitude
    }

    fn is_silent(&self) -> bool {
        self.amplitude <= SILENCE_THRESHOLD && self.target == 0.0
    }
}

/// ADSR stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Not sounding.
    #[default]
    Idle,
    /// Ramping to 1.
    Attack,
    /// Ramping to the sustain level.
    Decay,
    /// Holding the sustain level.
    Sustain,
    /// Ramping to 0.
    Release,
}

/// Linear ADSR stage machine.
///
/// Attack and decay ramp from their start amplitude to their target over the
/// configured time. Release falls at a constant slope of `1 / release` per
/// second from wherever it starts, so a note released at half amplitude goes
/// quiet in half the release time.
///
/// # Example
///
/// ```rust
/// use tonegrid_synth::{AdsrEnvelope, Envelope, EnvelopeStage};
///
/// let mut env = AdsrEnvelope::new(0.01, 0.1, 0.7, 0.2);
/// env.note_on();
/// for _ in 0..200 {
///     env.advance(0.001);
/// }
/// assert_eq!(env.stage(), EnvelopeStage::Sustain);
/// assert!((env.level() - 0.7).abs() < 1e-6);
///
/// env.note_off();
/// for _ in 0..200 {
///     env.advance(0.001);
/// }
/// assert!(env.is_silent());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AdsrEnvelope {
    attack: f32,
    decay: f32,
    sustain: f32,
    release: f32,
    stage: EnvelopeStage,
    amplitude: f32,
    start: f32,
    elapsed: f32,
}

impl Default for AdsrEnvelope {
    fn default() -> Self {
        Self::new(0.01, 0.1, 0.7, 0.2)
    }
}

impl AdsrEnvelope {
    /// Times in seconds, sustain in `[0, 1]`.
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: clamp_time(attack),
            decay: clamp_time(decay),
            sustain: clamp_level(sustain),
            release: clamp_time(release),
            stage: EnvelopeStage::Idle,
            amplitude: 0.0,
            start: 0.0,
            elapsed: 0.0,
        }
    }

    /// Attack time in seconds.
    pub fn set_attack(&mut self, secs: f32) {
        self.attack = clamp_time(secs);
    }

    /// Decay time in seconds.
    pub fn set_decay(&mut self, secs: f32) {
        self.decay = clamp_time(secs);
    }

    /// Sustain level in `[0, 1]`.
    pub fn set_sustain(&mut self, level: f32) {
        self.sustain = clamp_level(level);
    }

    /// Release time in seconds.
    pub fn set_release(&mut self, secs: f32) {
        self.release = clamp_time(secs);
    }

    /// Attack time in seconds.
    pub fn attack(&self) -> f32 {
        self.attack
    }

    /// Decay time in seconds.
    pub fn decay(&self) -> f32 {
        self.decay
    }

    /// Sustain level.
    pub fn sustain(&self) -> f32 {
        self.sustain
    }

    /// Release time in seconds.
    pub fn release(&self) -> f32 {
        self.release
    }

    /// Current stage.
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Accented start: jump straight to `strength` and decay from there.
    pub fn trigger_accent(&mut self, strength: f32) {
        self.amplitude = clamp_level(strength);
        self.enter(EnvelopeStage::Decay);
    }

    fn enter(&mut self, stage: EnvelopeStage) {
        self.start = self.amplitude;
        self.elapsed = 0.0;
        self.stage = stage;
    }
}

impl Envelope for AdsrEnvelope {
    fn note_on(&mut self) {
        self.enter(EnvelopeStage::Attack);
    }

    fn note_off(&mut self) {
        if self.stage != EnvelopeStage::Idle {
            self.enter(EnvelopeStage::Release);
        }
    }

    #[inline]
    fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed += dt;
        match self.stage {
            EnvelopeStage::Idle => {
                self.amplitude = 0.0;
            }
            EnvelopeStage::Attack => {
                if self.elapsed >= self.attack {
                    self.amplitude = 1.0;
                    self.enter(EnvelopeStage::Decay);
                } else {
                    self.amplitude = self.start + (1.0 - self.start) * self.elapsed / self.attack;
                }
            }
            EnvelopeStage::Decay => {
                if self.elapsed >= self.decay {
                    self.amplitude = self.sustain;
                    self.enter(EnvelopeStage::Sustain);
                } else {
                    self.amplitude =
                        self.start + (self.sustain - self.start) * self.elapsed / self.decay;
                }
            }
            EnvelopeStage::Sustain => {
                self.amplitude = self.sustain;
            }
            EnvelopeStage::Release => {
                let level = self.start - self.elapsed / self.release;
                if level <= 0.0 || self.elapsed >= self.release {
                    self.amplitude = 0.0;
                    self.enter(EnvelopeStage::Idle);
                } else {
                    self.amplitude = level;
                }
            }
        }
        self.amplitude = clamp_level(self.amplitude);
        self.amplitude
    }

    fn level(&self) -> f32 {
        self.amplitude
    }

    fn is_silent(&self) -> bool {
        self.stage == EnvelopeStage::Idle
    }
}

/// Which envelope a voice is built with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeKind {
    /// [`ArEnvelope`], decay and sustain ignored.
    Ar,
    /// [`AdsrEnvelope`].
    #[default]
    Adsr,
}

/// Closed set of per-voice envelopes.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceEnvelope {
    /// Attack/release.
    Ar(ArEnvelope),
    /// Full ADSR.
    Adsr(AdsrEnvelope),
}

impl VoiceEnvelope {
    /// Build the requested shape.
    pub fn new(kind: EnvelopeKind, attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        match kind {
            EnvelopeKind::Ar => VoiceEnvelope::Ar(ArEnvelope::new(attack, release)),
            EnvelopeKind::Adsr => {
                VoiceEnvelope::Adsr(AdsrEnvelope::new(attack, decay, sustain, release))
            }
        }
    }
}

impl Envelope for VoiceEnvelope {
    fn note_on(&mut self) {
        match self {
            VoiceEnvelope::Ar(env) => env.note_on(),
            VoiceEnvelope::Adsr(env) => env.note_on(),
        }
    }

    fn note_off(&mut self) {
        match self {
            VoiceEnvelope::Ar(env) => env.note_off(),
            VoiceEnvelope::Adsr(env) => env.note_off(),
        }
    }

    #[inline]
    fn advance(&mut self, dt: f32) -> f32 {
        match self {
            VoiceEnvelope::Ar(env) => env.advance(dt),
            VoiceEnvelope::Adsr(env) => env.advance(dt),
        }
    }

    fn level(&self) -> f32 {
        match self {
            VoiceEnvelope::Ar(env) => env.level(),
            VoiceEnvelope::Adsr(env) => env.level(),
        }
    }

    fn is_silent(&self) -> bool {
        match self {
            VoiceEnvelope::Ar(env) => env.is_silent(),
            VoiceEnvelope::Adsr(env) => env.is_silent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 44100.0;

    fn run(env: &mut impl Envelope, seconds: f32) -> f32 {
        let ticks = (seconds / DT).ceil() as usize;
        let mut level = env.level();
        for _ in 0..ticks {
            level = env.advance(DT);
        }
        level
    }

    #[test]
    fn ar_ramps_and_goes_silent() {
        let mut env = ArEnvelope::new(0.01, 0.05);
        assert!(env.is_silent());
        env.note_on();
        assert!((run(&mut env, 0.011) - 1.0).abs() < 1e-6);
        assert!(!env.is_silent());
        env.note_off();
        assert!(!env.is_silent(), "just released");
        run(&mut env, 0.051);
        assert!(env.is_silent());
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn ar_release_mid_attack_starts_from_current_level() {
        let mut env = ArEnvelope::new(0.1, 0.1);
        env.note_on();
        let mid = run(&mut env, 0.05);
        env.note_off();
        let next = env.advance(DT);
        assert!(next < mid && mid - next < 1e-3);
    }

    #[test]
    fn adsr_settles_at_sustain() {
        let mut env = AdsrEnvelope::new(0.02, 0.05, 0.6, 0.1);
        env.note_on();
        run(&mut env, 0.08);
        assert_eq!(env.stage(), EnvelopeStage::Sustain);
        assert!((env.level() - 0.6).abs() < 1e-6);
        run(&mut env, 1.0);
        assert!((env.level() - 0.6).abs() < 1e-6, "sustain holds");
    }

    #[test]
    fn adsr_full_release_reaches_zero() {
        let mut env = AdsrEnvelope::new(0.01, 0.01, 1.0, 0.1);
        env.note_on();
        run(&mut env, 0.05);
        env.note_off();
        assert_eq!(env.stage(), EnvelopeStage::Release);
        run(&mut env, 0.101);
        assert!(env.is_silent());
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn adsr_release_mid_attack_is_proportional() {
        let mut env = AdsrEnvelope::new(0.1, 0.1, 0.8, 0.2);
        env.note_on();
        let at_release = run(&mut env, 0.05);
        assert!((at_release - 0.5).abs() < 0.01);

        env.note_off();
        let first = env.advance(DT);
        assert!(first <= at_release && at_release - first < 1e-3, "no jump to 1.0");

        let mut ticks = 1;
        while !env.is_silent() {
            env.advance(DT);
            ticks += 1;
        }
        let secs = ticks as f32 * DT;
        assert!((secs - 0.1).abs() < 0.002, "half amplitude took {secs}s");
    }

    #[test]
    fn retrigger_starts_attack_from_current_level() {
        let mut env = AdsrEnvelope::new(0.01, 0.01, 0.5, 0.5);
        env.note_on();
        run(&mut env, 0.05);
        env.note_off();
        run(&mut env, 0.1);
        let before = env.level();
        env.note_on();
        assert_eq!(env.stage(), EnvelopeStage::Attack);
        let after = env.advance(DT);
        assert!(after >= before && after - before < 0.01);
    }

    #[test]
    fn accent_skips_attack() {
        let mut env = AdsrEnvelope::new(0.5, 0.1, 0.4, 0.1);
        env.trigger_accent(0.9);
        assert_eq!(env.stage(), EnvelopeStage::Decay);
        let first = env.advance(DT);
        assert!(first > 0.89, "accent starts near strength, got {first}");
        run(&mut env, 0.11);
        assert!((env.level() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn times_are_clamped() {
        let env = AdsrEnvelope::new(0.0, -1.0, 2.0, f32::NAN);
        assert_eq!(env.attack(), MIN_TIME);
        assert_eq!(env.decay(), MIN_TIME);
        assert_eq!(env.sustain(), 1.0);
        assert_eq!(env.release(), MIN_TIME);
    }

    #[test]
    fn note_off_while_idle_stays_idle() {
        let mut env = AdsrEnvelope::default();
        env.note_off();
        assert_eq!(env.stage(), EnvelopeStage::Idle);
        assert_eq!(env.advance(DT), 0.0);
    }

    #[test]
    fn voice_envelope_dispatches() {
        let mut env = VoiceEnvelope::new(EnvelopeKind::Ar, 0.01, 0.5, 0.5, 0.01);
        env.note_on();
        assert!((run(&mut env, 0.02) - 1.0).abs() < 1e-6, "AR ignores sustain");
        env.note_off();
        run(&mut env, 0.02);
        assert!(env.is_silent());
    }
}
