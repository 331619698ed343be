//! Real-time engine split into an audio side and a control side.
//!
//! [`SynthEngine`] lives on the audio thread and owns the [`VoicePool`].
//! [`SynthHandle`] lives on the control thread. It builds voices, hands them
//! over through a lock-free ring buffer and receives finished voices back
//! through a second one, so the audio callback never allocates or frees.
//!
//! ```text
//!  control thread                          audio thread
//!  ──────────────                          ────────────
//!  SynthHandle ── Command (rtrb) ────────▶ SynthEngine::render
//!       ▲                                       │
//!       └──────── finished Voice (rtrb) ────────┘
//! ```
//!
//! Master gain and the active voice count are shared through atomics.
//!
//! The handle counts every voice it has sent and not yet collected back, and
//! refuses new notes once that count reaches the engine capacity. The pool's
//! reserved slots therefore always cover every voice the audio side can hold.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use rtrb::{Consumer, Producer, RingBuffer};

use crate::arpeggiator::NoteSink;
use crate::pool::VoicePool;
use crate::voice::{Timbre, Voice, VoiceId};

/// Message from the control side, applied at the start of the next buffer.
#[derive(Debug)]
pub enum Command {
    /// Add a voice built on the control thread.
    NoteOn(Voice),
    /// Release one voice.
    NoteOff(VoiceId),
    /// Release every voice at a frequency.
    NoteOffFrequency(f32),
    /// Release everything.
    AllNotesOff,
}

/// Control-side failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// The command ring buffer is full; the audio side has not caught up.
    QueueFull,
    /// Every reserved voice slot is taken by a sounding or uncollected voice.
    VoiceLimit,
}

impl core::fmt::Display for EngineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EngineError::QueueFull => f.write_str("synth command queue is full"),
            EngineError::VoiceLimit => f.write_str("synth voice limit reached"),
        }
    }
}

impl std::error::Error for EngineError {}

#[derive(Debug)]
struct Shared {
    master_gain: AtomicU32,
    active_voices: AtomicUsize,
}

/// Audio side of the engine.
pub struct SynthEngine {
    pool: VoicePool,
    commands: Consumer<Command>,
    garbage: Producer<Voice>,
    shared: Arc<Shared>,
}

impl SynthEngine {
    /// Create an engine with room for `capacity` simultaneous voices.
    ///
    /// Released voices count until their tail ends and the handle collects
    /// them. The command queue holds twice `capacity` entries.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tonegrid_synth::SynthEngine;
    ///
    /// let (mut engine, mut handle) = SynthEngine::new(44100.0, 16);
    /// let id = handle.note_on(440.0).unwrap();
    ///
    /// let mut buffer = vec![0.0f32; 512];
    /// engine.render(&mut buffer, 2);
    /// assert_eq!(handle.active_voices(), 1);
    ///
    /// handle.note_off(id).unwrap();
    /// ```
    pub fn new(sample_rate: f32, capacity: usize) -> (Self, SynthHandle) {
        let capacity = capacity.max(1);
        let (command_tx, command_rx) = RingBuffer::new(capacity * 2);
        let (garbage_tx, garbage_rx) = RingBuffer::new(capacity);
        let shared = Arc::new(Shared {
            master_gain: AtomicU32::new(1.0f32.to_bits()),
            active_voices: AtomicUsize::new(0),
        });

        #[cfg(feature = "tracing")]
        tracing::debug!(sample_rate, capacity, "synth engine created");

        let engine = Self {
            pool: VoicePool::with_capacity(sample_rate, capacity),
            commands: command_rx,
            garbage: garbage_tx,
            shared: Arc::clone(&shared),
        };
        let handle = SynthHandle {
            commands: command_tx,
            garbage: garbage_rx,
            shared,
            next_id: 0,
            live: 0,
            capacity,
            timbre: Timbre::default(),
            sample_rate,
        };
        (engine, handle)
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.pool.sample_rate()
    }

    /// Voices currently in the pool.
    pub fn active_voices(&self) -> usize {
        self.pool.len()
    }

    /// Fill one interleaved buffer. Real-time safe.
    ///
    /// Pending commands are applied first. Every frame carries the same mono
    /// mix on all `channels`. Voices that finished during the buffer are
    /// removed afterwards and sent back to the control side.
    pub fn render(&mut self, output: &mut [f32], channels: usize) {
        while let Ok(command) = self.commands.pop() {
            match command {
                Command::NoteOn(voice) => {
                    if let Err(duplicate) = self.pool.insert(voice) {
                        let _ = self.garbage.push(duplicate);
                    }
                }
                Command::NoteOff(id) => {
                    self.pool.stop_voice(id);
                }
                Command::NoteOffFrequency(hz) => {
                    self.pool.stop_frequency(hz);
                }
                Command::AllNotesOff => self.pool.stop_all(),
            }
        }

        let gain = f32::from_bits(self.shared.master_gain.load(Ordering::Relaxed));
        self.pool.render_frames(output, channels, gain);

        let garbage = &mut self.garbage;
        self.pool.reap(|voice| {
            // Cannot fail: the handle never has more than `capacity` voices out.
            let _ = garbage.push(voice);
        });
        self.shared
            .active_voices
            .store(self.pool.len(), Ordering::Relaxed);
    }
}

/// Control side of the engine.
pub struct SynthHandle {
    commands: Producer<Command>,
    garbage: Consumer<Voice>,
    shared: Arc<Shared>,
    next_id: u64,
    live: usize,
    capacity: usize,
    timbre: Timbre,
    sample_rate: f32,
}

impl SynthHandle {
    /// Build a voice with the current timbre and queue it.
    ///
    /// Collects finished voices first. Fails with [`EngineError::VoiceLimit`]
    /// while `capacity` voices are still sounding or waiting for collection.
    pub fn note_on(&mut self, frequency: f32) -> Result<VoiceId, EngineError> {
        self.collect_garbage();
        if self.live >= self.capacity {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                frequency,
                capacity = self.capacity,
                "synth voice limit reached, note dropped"
            );
            return Err(EngineError::VoiceLimit);
        }
        if self.commands.is_full() {
            #[cfg(feature = "tracing")]
            tracing::warn!(frequency, "synth command queue full, note dropped");
            return Err(EngineError::QueueFull);
        }
        let id = VoiceId(self.next_id);
        self.next_id += 1;
        let voice = Voice::new(id, frequency, &self.timbre, self.sample_rate);
        self.send(Command::NoteOn(voice))?;
        self.live += 1;
        Ok(id)
    }

    /// Release one voice. Unknown ids are ignored by the engine.
    pub fn note_off(&mut self, id: VoiceId) -> Result<(), EngineError> {
        self.send(Command::NoteOff(id))
    }

    /// Release every voice at `frequency`.
    pub fn note_off_frequency(&mut self, frequency: f32) -> Result<(), EngineError> {
        self.send(Command::NoteOffFrequency(frequency))
    }

    /// Release everything.
    pub fn all_notes_off(&mut self) -> Result<(), EngineError> {
        self.send(Command::AllNotesOff)
    }

    /// Settings for voices started from now on.
    pub fn set_timbre(&mut self, timbre: Timbre) {
        self.timbre = timbre;
    }

    /// Current settings.
    pub fn timbre(&self) -> &Timbre {
        &self.timbre
    }

    /// Output gain applied to the mix before clamping.
    pub fn set_master_gain(&self, gain: f32) {
        let gain = if gain.is_finite() { gain.max(0.0) } else { 1.0 };
        self.shared
            .master_gain
            .store(gain.to_bits(), Ordering::Relaxed);
    }

    /// Output gain.
    pub fn master_gain(&self) -> f32 {
        f32::from_bits(self.shared.master_gain.load(Ordering::Relaxed))
    }

    /// Voice count as of the last rendered buffer.
    pub fn active_voices(&self) -> usize {
        self.shared.active_voices.load(Ordering::Relaxed)
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Voices sent to the engine and not yet collected back.
    pub fn live_voices(&self) -> usize {
        self.live
    }

    /// Maximum number of live voices.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop voices the engine has finished with. Returns how many.
    pub fn collect_garbage(&mut self) -> usize {
        let mut collected = 0;
        while let Ok(voice) = self.garbage.pop() {
            drop(voice);
            collected += 1;
        }
        self.live = self.live.saturating_sub(collected);
        collected
    }

    fn send(&mut self, command: Command) -> Result<(), EngineError> {
        self.commands
            .push(command)
            .map_err(|_| EngineError::QueueFull)
    }
}

impl NoteSink for SynthHandle {
    fn note_on(&mut self, frequency: f32) -> Option<VoiceId> {
        SynthHandle::note_on(self, frequency).ok()
    }

    fn note_off(&mut self, id: VoiceId) -> bool {
        SynthHandle::note_off(self, id).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arpeggiator::{ArpMode, Arpeggiator};

    const SR: f32 = 44100.0;

    fn quick() -> Timbre {
        Timbre {
            attack: 0.001,
            decay: 0.001,
            sustain: 0.8,
            release: 0.005,
            ..Timbre::default()
        }
    }

    #[test]
    fn commands_apply_at_next_buffer() {
        let (mut engine, mut handle) = SynthEngine::new(SR, 8);
        handle.note_on(440.0).unwrap();
        assert_eq!(engine.active_voices(), 0, "nothing applied before render");
        let mut buffer = [0.0f32; 64];
        engine.render(&mut buffer, 1);
        assert_eq!(engine.active_voices(), 1);
        assert_eq!(handle.active_voices(), 1);
    }

    #[test]
    fn queue_full_is_reported() {
        let (_engine, mut handle) = SynthEngine::new(SR, 2);
        handle.note_on(100.0).unwrap();
        for _ in 0..3 {
            handle.note_off(VoiceId(0)).unwrap();
        }
        assert_eq!(handle.note_off(VoiceId(0)), Err(EngineError::QueueFull));
        assert_eq!(handle.note_on(200.0), Err(EngineError::QueueFull));
        assert_eq!(handle.live_voices(), 1);
    }

    #[test]
    fn voice_limit_keeps_slab_within_reservation() {
        let (mut engine, mut handle) = SynthEngine::new(SR, 2);
        handle.set_timbre(quick());
        let reserved = engine.pool.capacity();

        handle.note_on(220.0).unwrap();
        handle.note_on(330.0).unwrap();
        assert_eq!(handle.note_on(440.0), Err(EngineError::VoiceLimit));
        assert_eq!(handle.note_on(550.0), Err(EngineError::VoiceLimit));

        let mut buffer = [0.0f32; 256];
        engine.render(&mut buffer, 2);
        assert_eq!(engine.active_voices(), 2);
        assert_eq!(engine.pool.capacity(), reserved, "render must not grow the slab");

        handle.all_notes_off().unwrap();
        for _ in 0..4 {
            engine.render(&mut buffer, 2);
        }
        assert_eq!(engine.active_voices(), 0);
        assert!(handle.note_on(440.0).is_ok(), "slots free up once collected");
        assert_eq!(handle.live_voices(), 1);
        engine.render(&mut buffer, 2);
        assert_eq!(engine.pool.capacity(), reserved);
    }

    #[test]
    fn arp_release_survives_a_full_queue() {
        let (mut engine, mut handle) = SynthEngine::new(SR, 4);
        handle.set_timbre(quick());
        let mut arp = Arpeggiator::new(ArpMode::Repeat);
        arp.set_gate(1.0);
        arp.press(69);
        arp.update_at(0.0, 120.0, &mut handle);

        let mut buffer = [0.0f32; 256];
        engine.render(&mut buffer, 1);
        assert_eq!(engine.active_voices(), 1);

        while handle.note_off_frequency(1.0).is_ok() {}
        arp.release(&mut handle);
        assert_eq!(arp.pending(), 1, "refused release stays scheduled");

        engine.render(&mut buffer, 1);
        arp.update_at(0.01, 120.0, &mut handle);
        assert_eq!(arp.pending(), 0);

        for _ in 0..20 {
            engine.render(&mut buffer, 1);
        }
        assert_eq!(engine.active_voices(), 0, "voice left sustain and finished");
        assert_eq!(handle.collect_garbage(), 1);
    }

    #[test]
    fn finished_voices_come_back_for_collection() {
        let (mut engine, mut handle) = SynthEngine::new(SR, 8);
        handle.set_timbre(quick());
        handle.note_on(220.0).unwrap();
        handle.note_on(330.0).unwrap();
        let mut buffer = [0.0f32; 256];
        engine.render(&mut buffer, 2);
        handle.all_notes_off().unwrap();
        engine.render(&mut buffer, 2);
        engine.render(&mut buffer, 2);
        assert_eq!(handle.active_voices(), 0);
        assert_eq!(handle.collect_garbage(), 2);
        assert_eq!(handle.collect_garbage(), 0);
    }

    #[test]
    fn master_gain_scales_output() {
        let (mut loud, mut loud_handle) = SynthEngine::new(SR, 4);
        let (mut quiet, mut quiet_handle) = SynthEngine::new(SR, 4);
        quiet_handle.set_master_gain(0.5);
        loud_handle.note_on(440.0).unwrap();
        quiet_handle.note_on(440.0).unwrap();
        let mut a = [0.0f32; 256];
        let mut b = [0.0f32; 256];
        loud.render(&mut a, 1);
        quiet.render(&mut b, 1);
        for (x, y) in a.iter().zip(&b) {
            assert!((x * 0.5 - y).abs() < 1e-6);
        }
        assert_eq!(quiet_handle.master_gain(), 0.5);
    }

    #[test]
    fn stop_by_frequency_through_queue() {
        let (mut engine, mut handle) = SynthEngine::new(SR, 8);
        handle.set_timbre(quick());
        handle.note_on(220.0).unwrap();
        handle.note_on(330.0).unwrap();
        handle.note_off_frequency(220.0).unwrap();
        let mut buffer = [0.0f32; 1024];
        engine.render(&mut buffer, 1);
        engine.render(&mut buffer, 1);
        assert_eq!(handle.active_voices(), 1);
    }
}
