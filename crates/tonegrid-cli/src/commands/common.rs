//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use clap::{Args, ValueEnum};
use tonegrid_config::{PatchPreset, Settings};
use tonegrid_synth::{
    ArpMode, Arpeggiator, NoteDivision, NoteName, OscillatorType, Scale, Timbre, midi_to_freq,
    note_to_midi,
};

/// Frames rendered per engine call when working offline.
pub const BLOCK_FRAMES: usize = 512;

/// Parse a MIDI note from a name with octave (`C4`, `F#2`, `Bb-1`) or a number.
pub fn parse_midi_note(s: &str) -> Result<i32, String> {
    let s = s.trim();
    if let Ok(number) = s.parse::<i32>() {
        return Ok(number);
    }
    let split = s
        .char_indices()
        .skip(1)
        .find(|(_, c)| c.is_ascii_digit() || *c == '-')
        .map(|(i, _)| i)
        .ok_or_else(|| format!("'{s}' has no octave (expected e.g. C4)"))?;
    let (name, octave) = s.split_at(split);
    let note: NoteName = name.parse().map_err(|e| format!("'{s}': {e}"))?;
    let octave: i32 = octave
        .parse()
        .map_err(|_| format!("'{s}': bad octave '{octave}'"))?;
    Ok(note_to_midi(note, octave))
}

/// Parse a pitch as Hz (`220`, `220hz`) or a note name with octave (`A3`).
pub fn parse_pitch(s: &str) -> Result<f32, String> {
    let trimmed = s.trim();
    let number = trimmed
        .strip_suffix("hz")
        .or_else(|| trimmed.strip_suffix("Hz"))
        .unwrap_or(trimmed);
    if let Ok(hz) = number.parse::<f32>() {
        return if hz.is_finite() && hz > 0.0 {
            Ok(hz)
        } else {
            Err(format!("'{s}' is not a positive frequency"))
        };
    }
    parse_midi_note(trimmed).map(midi_to_freq)
}

/// Parse an oscillator type name for clap.
pub fn parse_oscillator(s: &str) -> Result<OscillatorType, String> {
    s.parse::<OscillatorType>().map_err(|e| e.to_string())
}

/// Resolve the preset to play: the one named, the settings default, or `init`.
pub fn load_timbre(preset: Option<&str>, settings: &Settings) -> anyhow::Result<(String, Timbre)> {
    let name = preset
        .or(settings.default_preset.as_deref())
        .unwrap_or("init");
    let preset = PatchPreset::resolve(name).with_context(|| {
        format!("preset '{name}' not found; use 'tonegrid presets list' to see available presets")
    })?;
    let (timbre, warnings) = preset.to_timbre();
    for warning in &warnings {
        eprintln!("Warning: {warning}");
    }
    Ok((preset.name, timbre))
}

/// Arpeggiator patterns for CLI
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum CliArpMode {
    Repeat,
    #[default]
    ScaleUp,
    ScaleDown,
    ChordUp,
    ChordDown,
    ChordUpDown,
    ChordRandom,
}

impl From<CliArpMode> for ArpMode {
    fn from(m: CliArpMode) -> Self {
        match m {
            CliArpMode::Repeat => ArpMode::Repeat,
            CliArpMode::ScaleUp => ArpMode::ScaleUp,
            CliArpMode::ScaleDown => ArpMode::ScaleDown,
            CliArpMode::ChordUp => ArpMode::ChordUp,
            CliArpMode::ChordDown => ArpMode::ChordDown,
            CliArpMode::ChordUpDown => ArpMode::ChordUpDown,
            CliArpMode::ChordRandom => ArpMode::ChordRandom,
        }
    }
}

/// Scales for CLI
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum CliScale {
    #[default]
    Major,
    Minor,
    Dorian,
    MajorPentatonic,
    MinorPentatonic,
}

impl From<CliScale> for Scale {
    fn from(s: CliScale) -> Self {
        match s {
            CliScale::Major => Scale::Major,
            CliScale::Minor => Scale::NaturalMinor,
            CliScale::Dorian => Scale::Dorian,
            CliScale::MajorPentatonic => Scale::MajorPentatonic,
            CliScale::MinorPentatonic => Scale::MinorPentatonic,
        }
    }
}

/// Note divisions for CLI
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum CliDivision {
    #[value(name = "1/2")]
    Half,
    #[value(name = "1/4")]
    Quarter,
    #[value(name = "1/8")]
    Eighth,
    #[default]
    #[value(name = "1/16")]
    Sixteenth,
    #[value(name = "1/32")]
    ThirtySecond,
    #[value(name = "1/8d")]
    DottedEighth,
    #[value(name = "1/8t")]
    TripletEighth,
    #[value(name = "1/16t")]
    TripletSixteenth,
}

impl From<CliDivision> for NoteDivision {
    fn from(d: CliDivision) -> Self {
        match d {
            CliDivision::Half => NoteDivision::Half,
            CliDivision::Quarter => NoteDivision::Quarter,
            CliDivision::Eighth => NoteDivision::Eighth,
            CliDivision::Sixteenth => NoteDivision::Sixteenth,
            CliDivision::ThirtySecond => NoteDivision::ThirtySecond,
            CliDivision::DottedEighth => NoteDivision::DottedEighth,
            CliDivision::TripletEighth => NoteDivision::TripletEighth,
            CliDivision::TripletSixteenth => NoteDivision::TripletSixteenth,
        }
    }
}

/// Arpeggiator options shared by `render arp` and `play`.
#[derive(Args, Debug, Clone)]
pub struct ArpOptions {
    /// Held note, e.g. C3 or 48
    #[arg(value_parser = parse_midi_note, default_value = "C3")]
    pub root: i32,

    /// Note pattern
    #[arg(short, long, value_enum, default_value_t)]
    pub mode: CliArpMode,

    /// Scale for the scale modes
    #[arg(long, value_enum, default_value_t)]
    pub scale: CliScale,

    /// Chord offsets in semitones for the chord modes
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub chord: Option<Vec<i32>>,

    /// Octave range (1-4)
    #[arg(long, default_value = "1")]
    pub octaves: u8,

    /// Note length
    #[arg(short, long, value_enum, default_value_t)]
    pub division: CliDivision,

    /// Fraction of each step the note sounds (0.05-1)
    #[arg(short, long, default_value = "0.5")]
    pub gate: f32,

    /// Seed for the random mode
    #[arg(long, default_value = "1")]
    pub seed: u32,
}

impl ArpOptions {
    /// Build an arpeggiator holding `root`.
    pub fn build(&self) -> Arpeggiator {
        let mut arp = Arpeggiator::new(self.mode.into()).with_seed(self.seed);
        arp.set_scale(self.scale.into());
        if let Some(chord) = &self.chord {
            arp.set_chord(chord);
        }
        arp.set_octaves(self.octaves);
        arp.set_division(self.division.into());
        arp.set_gate(self.gate);
        arp.press(self.root);
        arp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midi_notes_parse() {
        assert_eq!(parse_midi_note("C4"), Ok(60));
        assert_eq!(parse_midi_note("A4"), Ok(69));
        assert_eq!(parse_midi_note("F#2"), Ok(42));
        assert_eq!(parse_midi_note("Bb3"), Ok(58));
        assert_eq!(parse_midi_note("C-1"), Ok(0));
        assert_eq!(parse_midi_note("64"), Ok(64));
        assert!(parse_midi_note("H2").is_err());
        assert!(parse_midi_note("C").is_err());
    }

    #[test]
    fn pitches_parse() {
        assert_eq!(parse_pitch("220"), Ok(220.0));
        assert_eq!(parse_pitch("110hz"), Ok(110.0));
        assert!((parse_pitch("A4").unwrap() - 440.0).abs() < 1e-3);
        assert!(parse_pitch("-5").is_err());
        assert!(parse_pitch("nope").is_err());
    }

    #[test]
    fn oscillator_names_parse() {
        assert_eq!(parse_oscillator("saw"), Ok(OscillatorType::Saw));
        assert!(parse_oscillator("kazoo").is_err());
    }

    #[test]
    fn arp_options_hold_root() {
        let options = ArpOptions {
            root: 48,
            mode: CliArpMode::ChordUp,
            scale: CliScale::Minor,
            chord: Some(vec![0, 3, 7]),
            octaves: 2,
            division: CliDivision::Eighth,
            gate: 0.25,
            seed: 9,
        };
        let arp = options.build();
        assert_eq!(arp.held(), Some(48));
        assert_eq!(arp.mode(), ArpMode::ChordUp);
        assert_eq!(arp.scale(), Scale::NaturalMinor);
        assert_eq!(arp.chord(), &[0, 3, 7]);
        assert_eq!(arp.octaves(), 2);
        assert_eq!(arp.gate(), 0.25);
    }
}
