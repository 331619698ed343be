//! Real-time audio output via cpal.

use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, Stream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Extract device name via `description()` (cpal 0.17+).
fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Output device information.
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Position in the host's output device list.
    pub index: usize,
    /// Human-readable device name.
    pub name: String,
    /// Default channel count.
    pub channels: u16,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Whether this is the host's default output.
    pub is_default: bool,
}

/// Output stream configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Buffer size in frames; 0 lets the host choose.
    pub buffer_size: u32,
    /// Output device index or name (uses default if `None`).
    pub device: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 512,
            device: None,
        }
    }
}

/// List output devices.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let default_name = host
        .default_output_device()
        .and_then(|d| device_name(&d).ok());

    let outputs = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?;

    let devices = outputs
        .enumerate()
        .filter_map(|(index, device)| {
            let name = device_name(&device).ok()?;
            let (channels, default_sample_rate) = device
                .default_output_config()
                .map(|c| (c.channels(), c.sample_rate()))
                .unwrap_or((2, 48000));
            Some(AudioDevice {
                index,
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
                channels,
                default_sample_rate,
            })
        })
        .collect();

    Ok(devices)
}

/// The host's default output device, if any.
pub fn default_output_device() -> Result<Option<AudioDevice>> {
    Ok(list_devices()?.into_iter().find(|d| d.is_default))
}

/// A running (or ready) output stream.
///
/// The callback receives an interleaved buffer and the channel count. It runs
/// on the audio thread and must not block or allocate.
pub struct OutputStream {
    device: Device,
    device_label: String,
    channels: u16,
    config: StreamConfig,
    running: Arc<AtomicBool>,
    stream: Option<Stream>,
}

impl OutputStream {
    /// Open the configured output device.
    pub fn new(config: StreamConfig) -> Result<Self> {
        let host = cpal::default_host();
        let device = match &config.device {
            Some(query) => find_output_device(&host, query)?,
            None => host.default_output_device().ok_or(Error::NoDevice)?,
        };
        let channels = device
            .default_output_config()
            .map_err(|e| Error::Stream(e.to_string()))?
            .channels();
        let device_label = device_name(&device).unwrap_or_else(|_| "unknown".to_string());

        Ok(Self {
            device,
            device_label,
            channels,
            config,
            running: Arc::new(AtomicBool::new(false)),
            stream: None,
        })
    }

    /// Configured sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Device channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Name of the opened device.
    pub fn device_name(&self) -> &str {
        &self.device_label
    }

    /// Shared flag that is `true` while the stream runs.
    ///
    /// Storing `false` (from a signal handler, say) makes [`run`](Self::run)
    /// return.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Build and start the stream without blocking.
    pub fn start<F>(&mut self, mut render: F) -> Result<()>
    where
        F: FnMut(&mut [f32], usize) + Send + 'static,
    {
        let stream_config = cpal::StreamConfig {
            channels: self.channels,
            sample_rate: self.config.sample_rate,
            buffer_size: if self.config.buffer_size == 0 {
                cpal::BufferSize::Default
            } else {
                cpal::BufferSize::Fixed(self.config.buffer_size)
            },
        };

        let channels = usize::from(self.channels);
        let callback_running = Arc::clone(&self.running);
        let stream = self
            .device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if callback_running.load(Ordering::Relaxed) {
                        render(data, channels);
                    } else {
                        data.fill(0.0);
                    }
                },
                |err| tracing::error!(error = %err, "output stream error"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        self.running.store(true, Ordering::SeqCst);
        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            device = %self.device_label,
            channels = self.channels,
            sample_rate = self.config.sample_rate,
            buffer_size = self.config.buffer_size,
            "output stream started"
        );
        self.stream = Some(stream);
        Ok(())
    }

    /// Start the stream and block until [`stop`](Self::stop) or the running
    /// flag is cleared.
    pub fn run<F>(&mut self, render: F) -> Result<()>
    where
        F: FnMut(&mut [f32], usize) + Send + 'static,
    {
        self.start(render)?;
        while self.running.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(50));
        }
        self.close();
        Ok(())
    }

    /// Stop the stream.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the stream is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            tracing::info!(device = %self.device_label, "output stream closed");
        }
    }
}

impl Drop for OutputStream {
    fn drop(&mut self) {
        self.stop();
        self.close();
    }
}

fn find_output_device(host: &Host, query: &str) -> Result<Device> {
    let devices: Vec<Device> = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .collect();
    let names: Vec<String> = devices
        .iter()
        .map(|d| device_name(d).unwrap_or_default())
        .collect();

    let index = match_device(&names, query)?;
    devices
        .into_iter()
        .nth(index)
        .ok_or_else(|| Error::DeviceNotFound(query.to_string()))
}

/// Pick a device by index, exact name, then case-insensitive substring.
///
/// Several substring matches pick the first and log a warning.
pub fn match_device(names: &[String], query: &str) -> Result<usize> {
    if let Ok(index) = query.parse::<usize>() {
        return if index < names.len() {
            Ok(index)
        } else {
            Err(Error::DeviceNotFound(format!(
                "output device index {} (only {} devices available)",
                index,
                names.len()
            )))
        };
    }

    if let Some(index) = names.iter().position(|n| n == query) {
        return Ok(index);
    }

    let wanted = query.to_lowercase();
    let matches: Vec<usize> = names
        .iter()
        .enumerate()
        .filter(|(_, n)| n.to_lowercase().contains(&wanted))
        .map(|(i, _)| i)
        .collect();

    match matches.as_slice() {
        [] => Err(Error::DeviceNotFound(format!(
            "no output device matching '{query}'"
        ))),
        [only] => Ok(*only),
        [first, ..] => {
            tracing::warn!(
                query,
                candidates = matches.len(),
                using = %names[*first],
                "device query is ambiguous"
            );
            Ok(*first)
        }
    }
}
