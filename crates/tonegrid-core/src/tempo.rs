//! Musical time: note divisions and the shared transport.
//!
//! A single [`Transport`] owns tempo and play position. Sequencers and
//! arpeggiators borrow it each tick instead of reading a global, so several of
//! them stay locked to the same clock.

use libm::floorf;

/// Lowest accepted tempo.
pub const MIN_BPM: f32 = 20.0;
/// Highest accepted tempo.
pub const MAX_BPM: f32 = 400.0;

/// Note lengths relative to a quarter-note beat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NoteDivision {
    /// 2 beats.
    Half,
    /// 1 beat.
    #[default]
    Quarter,
    /// 1/2 beat.
    Eighth,
    /// 1/4 beat.
    Sixteenth,
    /// 1/8 beat.
    ThirtySecond,
    /// 3/4 beat.
    DottedEighth,
    /// 1/3 beat.
    TripletEighth,
    /// 1/6 beat.
    TripletSixteenth,
}

impl NoteDivision {
    /// Length in beats.
    pub fn beats(&self) -> f32 {
        match self {
            NoteDivision::Half => 2.0,
            NoteDivision::Quarter => 1.0,
            NoteDivision::Eighth => 0.5,
            NoteDivision::Sixteenth => 0.25,
            NoteDivision::ThirtySecond => 0.125,
            NoteDivision::DottedEighth => 0.75,
            NoteDivision::TripletEighth => 1.0 / 3.0,
            NoteDivision::TripletSixteenth => 1.0 / 6.0,
        }
    }

    /// Length in seconds at `bpm`.
    ///
    /// ```rust
    /// use tonegrid_core::NoteDivision;
    ///
    /// assert!((NoteDivision::Quarter.to_secs(120.0) - 0.5).abs() < 1e-6);
    /// assert!((NoteDivision::Sixteenth.to_secs(120.0) - 0.125).abs() < 1e-6);
    /// ```
    pub fn to_secs(&self, bpm: f32) -> f32 {
        self.beats() * 60.0 / clamp_bpm(bpm)
    }

    /// Repetition rate in Hz at `bpm`.
    pub fn to_hz(&self, bpm: f32) -> f32 {
        1.0 / self.to_secs(bpm)
    }

    /// Length in samples at `bpm` and `sample_rate`.
    pub fn to_samples(&self, bpm: f32, sample_rate: f32) -> f32 {
        self.to_secs(bpm) * sample_rate
    }
}

fn clamp_bpm(bpm: f32) -> f32 {
    if bpm.is_finite() {
        bpm.clamp(MIN_BPM, MAX_BPM)
    } else {
        120.0
    }
}

/// Transport state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportState {
    /// Position frozen.
    #[default]
    Stopped,
    /// Position advancing.
    Playing,
}

/// Shared tempo and position.
///
/// ```rust
/// use tonegrid_core::Transport;
///
/// let mut transport = Transport::new(48000.0, 120.0);
/// transport.play();
/// transport.advance(48000);
/// assert!((transport.beat_position() - 2.0).abs() < 1e-4);
/// assert!((transport.step_length_secs() - 0.125).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct Transport {
    bpm: f32,
    sample_rate: f32,
    tick: u64,
    state: TransportState,
}

impl Transport {
    /// Create a stopped transport at position 0.
    pub fn new(sample_rate: f32, bpm: f32) -> Self {
        Self {
            bpm: clamp_bpm(bpm),
            sample_rate,
            tick: 0,
            state: TransportState::Stopped,
        }
    }

    /// Set the tempo, clamped to `[MIN_BPM, MAX_BPM]`.
    pub fn set_bpm(&mut self, bpm: f32) {
        self.bpm = clamp_bpm(bpm);
    }

    /// Tempo in BPM.
    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// Set the sample rate used to convert ticks to time.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Start advancing.
    pub fn play(&mut self) {
        self.state = TransportState::Playing;
    }

    /// Freeze the position.
    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
    }

    /// Current state.
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// `true` while playing.
    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    /// Rewind to 0.
    pub fn reset(&mut self) {
        self.tick = 0;
    }

    /// Advance by `samples` if playing.
    pub fn advance(&mut self, samples: u64) {
        if self.is_playing() {
            self.tick = self.tick.wrapping_add(samples);
        }
    }

    /// Position in samples.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Position in seconds.
    pub fn seconds(&self) -> f64 {
        self.tick as f64 / f64::from(self.sample_rate)
    }

    /// Position in beats.
    pub fn beat_position(&self) -> f32 {
        (self.seconds() * f64::from(self.bpm) / 60.0) as f32
    }

    /// Fraction of the current beat, `[0, 1)`.
    pub fn beat_phase(&self) -> f32 {
        let beats = self.beat_position();
        beats - floorf(beats)
    }

    /// Sixteenth-note step length: `60 / bpm / 4` seconds.
    pub fn step_length_secs(&self) -> f32 {
        60.0 / self.bpm / 4.0
    }

    /// Length of `division` in seconds at the current tempo.
    pub fn division_secs(&self, division: NoteDivision) -> f32 {
        division.to_secs(self.bpm)
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(48000.0, 120.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_lengths() {
        assert!((NoteDivision::Eighth.to_secs(120.0) - 0.25).abs() < 1e-6);
        assert!((NoteDivision::DottedEighth.to_secs(120.0) - 0.375).abs() < 1e-6);
        assert!((NoteDivision::TripletEighth.to_hz(120.0) - 6.0).abs() < 1e-3);
        assert!((NoteDivision::Quarter.to_samples(60.0, 48000.0) - 48000.0).abs() < 1e-2);
    }

    #[test]
    fn stopped_transport_does_not_move() {
        let mut t = Transport::new(44100.0, 120.0);
        t.advance(1000);
        assert_eq!(t.tick(), 0);
        t.play();
        t.advance(1000);
        assert_eq!(t.tick(), 1000);
        t.stop();
        t.advance(1000);
        assert_eq!(t.tick(), 1000);
    }

    #[test]
    fn bpm_is_clamped() {
        let mut t = Transport::new(44100.0, 0.0);
        assert_eq!(t.bpm(), MIN_BPM);
        t.set_bpm(10_000.0);
        assert_eq!(t.bpm(), MAX_BPM);
        t.set_bpm(f32::NAN);
        assert_eq!(t.bpm(), 120.0);
    }

    #[test]
    fn step_length_is_a_sixteenth() {
        let t = Transport::new(44100.0, 150.0);
        assert!((t.step_length_secs() - 0.1).abs() < 1e-6);
        assert!((t.division_secs(NoteDivision::Sixteenth) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn beat_phase_wraps() {
        let mut t = Transport::new(1000.0, 60.0);
        t.play();
        t.advance(2500);
        assert!((t.beat_position() - 2.5).abs() < 1e-4);
        assert!((t.beat_phase() - 0.5).abs() < 1e-4);
    }
}
