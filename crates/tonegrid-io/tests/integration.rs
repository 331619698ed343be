//! Integration tests for tonegrid-io: rendered synth audio through WAV files.

use tempfile::NamedTempFile;
use tonegrid_io::{Error, WavFormat, WavSpec, read_wav, read_wav_info, write_wav};
use tonegrid_synth::{OscillatorType, SynthEngine, Timbre};

fn render_chord(sample_rate: f32, frames: usize, channels: usize) -> Vec<f32> {
    let (mut engine, mut handle) = SynthEngine::new(sample_rate, 8);
    handle.set_timbre(Timbre {
        osc_a: OscillatorType::Triangle.build(),
        ..Timbre::default()
    });
    for hz in [261.63, 329.63, 392.0] {
        handle.note_on(hz).unwrap();
    }
    let mut buffer = vec![0.0f32; frames * channels];
    engine.render(&mut buffer, channels);
    buffer
}

// ---------------------------------------------------------------------------
// 1. Rendered audio survives the file
// ---------------------------------------------------------------------------

#[test]
fn rendered_stereo_float_is_bit_exact() {
    let audio = render_chord(48000.0, 4800, 2);
    let spec = WavSpec::default();

    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &audio, spec).unwrap();
    let (loaded, loaded_spec) = read_wav(file.path()).unwrap();

    assert_eq!(loaded_spec, spec);
    assert_eq!(loaded, audio, "float WAV must not alter samples");
}

#[test]
fn rendered_channels_stay_identical_in_pcm() {
    let audio = render_chord(44100.0, 4410, 2);
    let spec = WavSpec {
        channels: 2,
        sample_rate: 44100,
        bits_per_sample: 16,
    };

    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &audio, spec).unwrap();
    let (loaded, _) = read_wav(file.path()).unwrap();

    for frame in loaded.chunks(2) {
        assert_eq!(frame[0], frame[1], "mono sum is written to every channel");
    }
    let peak = loaded.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(peak > 0.01, "chord should be audible, peak {peak}");
}

// ---------------------------------------------------------------------------
// 2. Metadata and errors
// ---------------------------------------------------------------------------

#[test]
fn info_matches_what_was_written() {
    let audio = render_chord(22050.0, 22050, 1);
    let spec = WavSpec {
        channels: 1,
        sample_rate: 22050,
        bits_per_sample: 32,
    };
    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &audio, spec).unwrap();

    let info = read_wav_info(file.path()).unwrap();
    assert_eq!(info.format, WavFormat::IeeeFloat);
    assert_eq!(info.num_frames, 22050);
    assert!((info.duration_secs - 1.0).abs() < 1e-9);
}

#[test]
fn reading_garbage_is_a_wav_error() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), b"definitely not RIFF").unwrap();
    assert!(matches!(read_wav(file.path()), Err(Error::Wav(_))));
}
