//! Arpeggiator: one held key in, a metronomic stream of notes out.
//!
//! The arpeggiator does not own voices. It calls into a [`NoteSink`] (the
//! engine handle, a [`StealingPool`] or a [`VoicePool`] through [`PoolSink`])
//! and ends each note after its gate through a [`ReleaseSchedule`].

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use tonegrid_core::{NoteDivision, Transport, Xorshift32};

use crate::note::midi_to_freq;
use crate::pool::{StealingPool, VoicePool};
use crate::schedule::ReleaseSchedule;
use crate::voice::{Timbre, VoiceId};

/// Anything that can start and stop notes.
pub trait NoteSink {
    /// Start a note. `None` if it could not be started.
    fn note_on(&mut self, frequency: f32) -> Option<VoiceId>;

    /// Release a note started by [`NoteSink::note_on`].
    ///
    /// `false` means the release could not be delivered yet and should be
    /// retried. Unknown ids count as delivered.
    fn note_off(&mut self, id: VoiceId) -> bool;
}

impl NoteSink for StealingPool {
    fn note_on(&mut self, frequency: f32) -> Option<VoiceId> {
        Some(StealingPool::note_on(self, frequency))
    }

    fn note_off(&mut self, id: VoiceId) -> bool {
        StealingPool::note_off(self, id);
        true
    }
}

/// [`VoicePool`] paired with the timbre for new voices.
#[derive(Debug)]
pub struct PoolSink<'a> {
    /// Target pool.
    pub pool: &'a mut VoicePool,
    /// Settings for voices started through this sink.
    pub timbre: &'a Timbre,
}

impl NoteSink for PoolSink<'_> {
    fn note_on(&mut self, frequency: f32) -> Option<VoiceId> {
        Some(self.pool.add_voice(frequency, self.timbre))
    }

    fn note_off(&mut self, id: VoiceId) -> bool {
        self.pool.stop_voice(id);
        true
    }
}

/// Note selection pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArpMode {
    /// The held key over and over.
    Repeat,
    /// Walk up the scale across the octave range.
    #[default]
    ScaleUp,
    /// Walk down the scale across the octave range.
    ScaleDown,
    /// Chord tones ascending.
    ChordUp,
    /// Chord tones descending.
    ChordDown,
    /// Chord tones up then down, ends not repeated.
    ChordUpDown,
    /// Random chord tone each step.
    ChordRandom,
}

impl ArpMode {
    /// Every mode.
    pub const ALL: [ArpMode; 7] = [
        ArpMode::Repeat,
        ArpMode::ScaleUp,
        ArpMode::ScaleDown,
        ArpMode::ChordUp,
        ArpMode::ChordDown,
        ArpMode::ChordUpDown,
        ArpMode::ChordRandom,
    ];
}

/// Scales for the scale-walk modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scale {
    /// Ionian.
    #[default]
    Major,
    /// Aeolian.
    NaturalMinor,
    /// Minor with a raised sixth.
    Dorian,
    /// Five-note major.
    MajorPentatonic,
    /// Five-note minor.
    MinorPentatonic,
}

impl Scale {
    /// Semitone offsets of the degrees within one octave.
    pub fn intervals(self) -> &'static [i32] {
        match self {
            Scale::Major => &[0, 2, 4, 5, 7, 9, 11],
            Scale::NaturalMinor => &[0, 2, 3, 5, 7, 8, 10],
            Scale::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Scale::MajorPentatonic => &[0, 2, 4, 7, 9],
            Scale::MinorPentatonic => &[0, 3, 5, 7, 10],
        }
    }
}

/// Major triad.
pub const DEFAULT_CHORD: [i32; 3] = [0, 4, 7];

/// Tempo-locked arpeggiator.
///
/// # Example
///
/// ```rust
/// use tonegrid_core::{NoteDivision, Transport};
/// use tonegrid_synth::{ArpMode, Arpeggiator, StealingPool, Timbre};
///
/// let mut transport = Transport::new(44100.0, 120.0);
/// let mut pool = StealingPool::new(44100.0, 8, Timbre::default());
/// let mut arp = Arpeggiator::new(ArpMode::ChordUp);
/// arp.set_division(NoteDivision::Sixteenth);
/// arp.press(57);
///
/// transport.play();
/// arp.update(&transport, &mut pool);
/// assert_eq!(pool.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Arpeggiator {
    mode: ArpMode,
    scale: Scale,
    chord: Vec<i32>,
    octaves: u8,
    division: NoteDivision,
    gate: f32,
    root: Option<i32>,
    index: usize,
    next_time: Option<f64>,
    schedule: ReleaseSchedule,
    rng: Xorshift32,
}

impl Default for Arpeggiator {
    fn default() -> Self {
        Self::new(ArpMode::default())
    }
}

impl Arpeggiator {
    /// One octave, sixteenths, 50% gate, major scale, major triad.
    pub fn new(mode: ArpMode) -> Self {
        Self {
            mode,
            scale: Scale::default(),
            chord: DEFAULT_CHORD.to_vec(),
            octaves: 1,
            division: NoteDivision::Sixteenth,
            gate: 0.5,
            root: None,
            index: 0,
            next_time: None,
            schedule: ReleaseSchedule::with_capacity(16),
            rng: Xorshift32::default(),
        }
    }

    /// Reseed the random mode.
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.rng = Xorshift32::new(seed);
        self
    }

    /// Pattern. Restarts from the first note.
    pub fn set_mode(&mut self, mode: ArpMode) {
        self.mode = mode;
        self.index = 0;
    }

    /// Pattern.
    pub fn mode(&self) -> ArpMode {
        self.mode
    }

    /// Scale for the scale modes.
    pub fn set_scale(&mut self, scale: Scale) {
        self.scale = scale;
    }

    /// Scale for the scale modes.
    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// Chord as semitone offsets from the held key. Empty falls back to the root.
    pub fn set_chord(&mut self, offsets: &[i32]) {
        self.chord.clear();
        self.chord.extend_from_slice(offsets);
        if self.chord.is_empty() {
            self.chord.push(0);
        }
        self.index = 0;
    }

    /// Chord offsets.
    pub fn chord(&self) -> &[i32] {
        &self.chord
    }

    /// Octave range, clamped to `1..=4`.
    pub fn set_octaves(&mut self, octaves: u8) {
        self.octaves = octaves.clamp(1, 4);
    }

    /// Octave range.
    pub fn octaves(&self) -> u8 {
        self.octaves
    }

    /// Note interval.
    pub fn set_division(&mut self, division: NoteDivision) {
        self.division = division;
    }

    /// Note interval.
    pub fn division(&self) -> NoteDivision {
        self.division
    }

    /// Fraction of the interval each note sounds, clamped to `[0.05, 1]`.
    pub fn set_gate(&mut self, gate: f32) {
        self.gate = if gate.is_finite() { gate.clamp(0.05, 1.0) } else { 0.5 };
    }

    /// Gate fraction.
    pub fn gate(&self) -> f32 {
        self.gate
    }

    /// Hold a key (MIDI note). The first note plays on the next update.
    pub fn press(&mut self, root: i32) {
        self.root = Some(root);
        self.index = 0;
        self.next_time = None;
    }

    /// Held key.
    pub fn held(&self) -> Option<i32> {
        self.root
    }

    /// Let go of the key and end every sounding note.
    ///
    /// Releases the sink refuses stay pending and are retried by the next
    /// [`Arpeggiator::update`].
    pub fn release<S: NoteSink>(&mut self, sink: &mut S) {
        self.root = None;
        self.next_time = None;
        self.schedule.release_all(|id| sink.note_off(id));
    }

    /// Notes started but not yet released.
    pub fn pending(&self) -> usize {
        self.schedule.len()
    }

    /// Advance to the transport's current time.
    ///
    /// Ends notes whose gate has passed, then starts the next note if the
    /// interval has elapsed. Call once per control tick or audio buffer, and
    /// keep calling after [`Arpeggiator::release`] until [`Arpeggiator::pending`]
    /// reaches zero.
    pub fn update<S: NoteSink>(&mut self, transport: &Transport, sink: &mut S) {
        self.update_at(transport.seconds(), transport.bpm(), sink);
    }

    /// [`Arpeggiator::update`] with an explicit clock.
    pub fn update_at<S: NoteSink>(&mut self, now: f64, bpm: f32, sink: &mut S) {
        self.schedule.release_due(now, |id| sink.note_off(id));

        let Some(root) = self.root else {
            return;
        };
        let interval = f64::from(self.division.to_secs(bpm));
        let due = self.next_time.unwrap_or(now);
        if now < due {
            return;
        }

        let note = self.next_note(root);
        if let Some(id) = sink.note_on(midi_to_freq(note)) {
            self.schedule.schedule(now + interval * f64::from(self.gate), id);
        }
        // Late updates resync instead of bursting to catch up.
        let next = due + interval;
        self.next_time = Some(if next <= now { now + interval } else { next });
    }

    /// MIDI note for the current position, then step forward.
    fn next_note(&mut self, root: i32) -> i32 {
        let offset = match self.mode {
            ArpMode::Repeat => 0,
            ArpMode::ScaleUp | ArpMode::ScaleDown => {
                let steps = self.scale.intervals();
                let len = steps.len() * usize::from(self.octaves);
                let i = self.index % len;
                let i = if self.mode == ArpMode::ScaleDown { len - 1 - i } else { i };
                steps[i % steps.len()] + 12 * (i / steps.len()) as i32
            }
            ArpMode::ChordUp | ArpMode::ChordDown => {
                let len = self.chord_len();
                let i = self.index % len;
                let i = if self.mode == ArpMode::ChordDown { len - 1 - i } else { i };
                self.chord_tone(i)
            }
            ArpMode::ChordUpDown => {
                let len = self.chord_len();
                let period = if len > 1 { 2 * (len - 1) } else { 1 };
                let i = self.index % period;
                let i = if i < len { i } else { period - i };
                self.chord_tone(i)
            }
            ArpMode::ChordRandom => {
                let i = self.rng.next_index(self.chord_len());
                self.chord_tone(i)
            }
        };
        self.index = self.index.wrapping_add(1);
        root + offset
    }

    fn chord_len(&self) -> usize {
        self.chord.len() * usize::from(self.octaves)
    }

    fn chord_tone(&self, i: usize) -> i32 {
        self.chord[i % self.chord.len()] + 12 * (i / self.chord.len()) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::freq_to_midi;

    #[derive(Default)]
    struct Recorder {
        next: u64,
        on: Vec<(VoiceId, i32)>,
        off: Vec<VoiceId>,
    }

    impl NoteSink for Recorder {
        fn note_on(&mut self, frequency: f32) -> Option<VoiceId> {
            let id = VoiceId(self.next);
            self.next += 1;
            self.on.push((id, libm::roundf(freq_to_midi(frequency)) as i32));
            Some(id)
        }

        fn note_off(&mut self, id: VoiceId) -> bool {
            self.off.push(id);
            true
        }
    }

    /// Sink whose releases bounce until `accept_after` attempts have failed.
    #[derive(Default)]
    struct Congested {
        inner: Recorder,
        refused: usize,
        accept_after: usize,
    }

    impl NoteSink for Congested {
        fn note_on(&mut self, frequency: f32) -> Option<VoiceId> {
            self.inner.note_on(frequency)
        }

        fn note_off(&mut self, id: VoiceId) -> bool {
            if self.refused < self.accept_after {
                self.refused += 1;
                return false;
            }
            self.inner.note_off(id)
        }
    }

    /// Run `count` intervals of 0.125 s (sixteenths at 120 BPM).
    fn play(arp: &mut Arpeggiator, count: usize) -> Recorder {
        let mut sink = Recorder::default();
        arp.press(60);
        for n in 0..count {
            arp.update_at(n as f64 * 0.125, 120.0, &mut sink);
        }
        sink
    }

    fn notes(sink: &Recorder) -> Vec<i32> {
        sink.on.iter().map(|&(_, note)| note).collect()
    }

    #[test]
    fn repeat_plays_root() {
        let mut arp = Arpeggiator::new(ArpMode::Repeat);
        assert_eq!(notes(&play(&mut arp, 3)), vec![60, 60, 60]);
    }

    #[test]
    fn scale_up_walks_major_and_wraps() {
        let mut arp = Arpeggiator::new(ArpMode::ScaleUp);
        assert_eq!(
            notes(&play(&mut arp, 8)),
            vec![60, 62, 64, 65, 67, 69, 71, 60]
        );
    }

    #[test]
    fn scale_down_spans_octaves() {
        let mut arp = Arpeggiator::new(ArpMode::ScaleDown);
        arp.set_scale(Scale::MinorPentatonic);
        arp.set_octaves(2);
        assert_eq!(notes(&play(&mut arp, 3)), vec![82, 79, 77]);
    }

    #[test]
    fn chord_modes() {
        let mut up = Arpeggiator::new(ArpMode::ChordUp);
        assert_eq!(notes(&play(&mut up, 4)), vec![60, 64, 67, 60]);

        let mut down = Arpeggiator::new(ArpMode::ChordDown);
        assert_eq!(notes(&play(&mut down, 4)), vec![67, 64, 60, 67]);

        let mut updown = Arpeggiator::new(ArpMode::ChordUpDown);
        assert_eq!(notes(&play(&mut updown, 6)), vec![60, 64, 67, 64, 60, 64]);
    }

    #[test]
    fn random_stays_in_chord() {
        let mut arp = Arpeggiator::new(ArpMode::ChordRandom).with_seed(7);
        arp.set_octaves(2);
        for note in notes(&play(&mut arp, 64)) {
            assert!([60, 64, 67, 72, 76, 79].contains(&note), "unexpected {note}");
        }
    }

    #[test]
    fn gate_releases_before_next_note() {
        let mut arp = Arpeggiator::new(ArpMode::Repeat);
        let mut sink = Recorder::default();
        arp.press(60);
        arp.update_at(0.0, 120.0, &mut sink);
        arp.update_at(0.05, 120.0, &mut sink);
        assert!(sink.off.is_empty());
        arp.update_at(0.0625, 120.0, &mut sink);
        assert_eq!(sink.off, vec![VoiceId(0)]);
        assert_eq!(sink.on.len(), 1, "next note waits for the interval");
    }

    #[test]
    fn release_ends_pending_notes() {
        let mut arp = Arpeggiator::new(ArpMode::ChordUp);
        arp.set_gate(1.0);
        let mut sink = play(&mut arp, 2);
        assert_eq!(arp.pending(), 1);
        arp.release(&mut sink);
        assert_eq!(arp.pending(), 0);
        assert_eq!(sink.off.len(), 2);
        arp.update_at(10.0, 120.0, &mut sink);
        assert_eq!(sink.on.len(), 2, "nothing plays without a held key");
    }

    #[test]
    fn refused_gate_release_is_retried() {
        let mut arp = Arpeggiator::new(ArpMode::Repeat);
        let mut sink = Congested {
            accept_after: 2,
            ..Congested::default()
        };
        arp.press(60);
        arp.update_at(0.0, 120.0, &mut sink);
        arp.update_at(0.07, 120.0, &mut sink);
        arp.update_at(0.08, 120.0, &mut sink);
        assert!(sink.inner.off.is_empty());
        assert_eq!(arp.pending(), 1, "refused release stays scheduled");

        arp.update_at(0.09, 120.0, &mut sink);
        assert_eq!(sink.inner.off, vec![VoiceId(0)]);
        assert_eq!(arp.pending(), 0);
    }

    #[test]
    fn refused_release_on_key_up_is_retried() {
        let mut arp = Arpeggiator::new(ArpMode::Repeat);
        arp.set_gate(1.0);
        let mut sink = Congested {
            accept_after: 1,
            ..Congested::default()
        };
        arp.press(60);
        arp.update_at(0.0, 120.0, &mut sink);

        arp.release(&mut sink);
        assert_eq!(arp.pending(), 1);
        assert!(sink.inner.off.is_empty());

        arp.update_at(0.01, 120.0, &mut sink);
        assert_eq!(sink.inner.off, vec![VoiceId(0)], "retried before its gate ends");
        assert_eq!(arp.pending(), 0);
        assert_eq!(sink.inner.on.len(), 1, "no new notes after key up");
    }

    #[test]
    fn late_update_does_not_burst() {
        let mut arp = Arpeggiator::new(ArpMode::Repeat);
        let mut sink = Recorder::default();
        arp.press(60);
        arp.update_at(0.0, 120.0, &mut sink);
        arp.update_at(1.0, 120.0, &mut sink);
        arp.update_at(1.01, 120.0, &mut sink);
        assert_eq!(sink.on.len(), 2);
    }

    #[test]
    fn drives_a_voice_pool() {
        let mut pool = VoicePool::new(44100.0);
        let timbre = Timbre::default();
        let mut arp = Arpeggiator::new(ArpMode::ChordUp);
        arp.press(57);
        {
            let mut sink = PoolSink {
                pool: &mut pool,
                timbre: &timbre,
            };
            arp.update_at(0.0, 120.0, &mut sink);
            arp.update_at(0.125, 120.0, &mut sink);
        }
        assert_eq!(pool.len(), 2);
        let freqs: Vec<f32> = pool.iter().map(|v| v.frequency()).collect();
        assert!(freqs.iter().any(|f| (f - 220.0).abs() < 0.01));
    }
}
