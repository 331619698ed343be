//! Audio I/O for tonegrid.
//!
//! This crate provides:
//!
//! - **WAV file I/O**: [`read_wav`] and [`write_wav`] for interleaved `f32` audio
//! - **Real-time output**: [`OutputStream`] drives a render callback on a cpal device
//! - **Devices**: [`list_devices`] and [`default_output_device`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tonegrid_io::{OutputStream, StreamConfig, WavSpec, write_wav};
//! use tonegrid_synth::SynthEngine;
//!
//! // Offline
//! let (mut engine, mut handle) = SynthEngine::new(48000.0, 16);
//! handle.note_on(220.0)?;
//! let mut buffer = vec![0.0; 48000 * 2];
//! engine.render(&mut buffer, 2);
//! write_wav("note.wav", &buffer, WavSpec::default())?;
//!
//! // Live
//! let mut stream = OutputStream::new(StreamConfig::default())?;
//! stream.run(move |data, channels| engine.render(data, channels))?;
//! ```

mod stream;
mod wav;

pub use stream::{
    AudioDevice, OutputStream, StreamConfig, default_output_device, list_devices, match_device,
};
pub use wav::{WavFormat, WavInfo, WavSpec, read_wav, read_wav_info, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested sample format is not supported.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
