//! Pitch helpers.
//!
//! Equal temperament with A4 (MIDI note 69) at 440 Hz. Octaves follow the
//! scientific convention where middle C is C4, MIDI note 60.

use core::fmt;
use core::str::FromStr;

/// Convert a MIDI note number to frequency in Hz.
///
/// Out-of-range notes are extrapolated rather than clamped.
#[inline]
pub fn midi_to_freq(note: i32) -> f32 {
    440.0 * libm::powf(2.0, (note as f32 - 69.0) / 12.0)
}

/// Convert frequency in Hz to a fractional MIDI note number.
#[inline]
pub fn freq_to_midi(freq: f32) -> f32 {
    69.0 + 12.0 * libm::log2f(freq / 440.0)
}

/// Frequency of `note` in `octave`.
///
/// ```rust
/// use tonegrid_synth::{NoteName, note_to_freq};
///
/// assert!((note_to_freq(NoteName::A, 4) - 440.0).abs() < 1e-3);
/// assert!((note_to_freq(NoteName::C, 4) - 261.626).abs() < 1e-2);
/// ```
#[inline]
pub fn note_to_freq(note: NoteName, octave: i32) -> f32 {
    midi_to_freq(note_to_midi(note, octave))
}

/// MIDI number of `note` in `octave`.
#[inline]
pub fn note_to_midi(note: NoteName, octave: i32) -> i32 {
    (octave + 1) * 12 + note.semitone()
}

/// The twelve pitch classes, spelled with sharps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(missing_docs)]
pub enum NoteName {
    #[default]
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl NoteName {
    /// All pitch classes from C upwards.
    pub const ALL: [NoteName; 12] = [
        NoteName::C,
        NoteName::CSharp,
        NoteName::D,
        NoteName::DSharp,
        NoteName::E,
        NoteName::F,
        NoteName::FSharp,
        NoteName::G,
        NoteName::GSharp,
        NoteName::A,
        NoteName::ASharp,
        NoteName::B,
    ];

    /// Semitones above C.
    pub fn semitone(self) -> i32 {
        self as i32
    }

    /// Pitch class of a MIDI note.
    pub fn from_midi(note: i32) -> Self {
        Self::ALL[note.rem_euclid(12) as usize]
    }

    /// Sharp spelling, e.g. `"F#"`.
    pub fn symbol(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::CSharp => "C#",
            NoteName::D => "D",
            NoteName::DSharp => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::FSharp => "F#",
            NoteName::G => "G",
            NoteName::GSharp => "G#",
            NoteName::A => "A",
            NoteName::ASharp => "A#",
            NoteName::B => "B",
        }
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unrecognized note name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseNoteError;

impl fmt::Display for ParseNoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected a note name such as C, F# or Bb")
    }
}

impl core::error::Error for ParseNoteError {}

impl FromStr for NoteName {
    type Err = ParseNoteError;

    /// Accepts a letter with an optional `#` or `b`, e.g. `"Eb"`, `"c#"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let base = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('C') => 0,
            Some('D') => 2,
            Some('E') => 4,
            Some('F') => 5,
            Some('G') => 7,
            Some('A') => 9,
            Some('B') => 11,
            _ => return Err(ParseNoteError),
        };
        let offset = match (chars.next(), chars.next()) {
            (None, _) => 0,
            (Some('#'), None) => 1,
            (Some('b'), None) => -1,
            _ => return Err(ParseNoteError),
        };
        Ok(NoteName::from_midi(base + offset))
    }
}
