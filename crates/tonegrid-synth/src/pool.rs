//! Voice pools.
//!
//! [`VoicePool`] is a slab of voice slots with a free list. Voices are summed
//! per frame, the clamped mix is written to every output channel, and finished
//! voices are only removed in a separate pass after the buffer.
//!
//! [`StealingPool`] is the fixed-size variant: once `max_voices` notes are
//! sounding, slot 0 (the oldest) is retargeted to the new frequency.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use tonegrid_core::sanitize_output;

use crate::voice::{Timbre, Voice, VoiceId};

/// Slots reserved by [`VoicePool::new`].
pub const DEFAULT_CAPACITY: usize = 32;

/// Slab of voices addressed by [`VoiceId`].
///
/// Slots and the free list are reserved up front. Growth past the reserved
/// capacity is allowed and allocates, so size the pool for the expected
/// polyphony plus release tails. [`crate::SynthEngine`] never lets its pool
/// grow.
///
/// # Example
///
/// ```rust
/// use tonegrid_synth::{Timbre, VoicePool};
///
/// let mut pool = VoicePool::new(44100.0);
/// let timbre = Timbre::default();
/// let a = pool.add_voice(220.0, &timbre);
/// pool.add_voice(330.0, &timbre);
///
/// let mut buffer = vec![0.0; 512];
/// pool.render(&mut buffer, 2);
/// assert_eq!(buffer[0], buffer[1]);
///
/// pool.stop_voice(a);
/// assert_eq!(pool.len(), 2, "released voices keep sounding");
/// ```
#[derive(Debug)]
pub struct VoicePool {
    slots: Vec<Option<Voice>>,
    free: Vec<usize>,
    active: usize,
    next_id: u64,
    sample_rate: f32,
}

impl VoicePool {
    /// Pool with [`DEFAULT_CAPACITY`] reserved slots.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_capacity(sample_rate, DEFAULT_CAPACITY)
    }

    /// Pool with `capacity` reserved slots.
    pub fn with_capacity(sample_rate: f32, capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
            active: 0,
            next_id: 0,
            sample_rate,
        }
    }

    /// Sample rate voices are rendered at.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Number of voices in the pool, released ones included.
    pub fn len(&self) -> usize {
        self.active
    }

    /// `true` if no voice is sounding.
    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Slots currently reserved.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Build a voice for `frequency` with a fresh id and add it.
    pub fn add_voice(&mut self, frequency: f32, timbre: &Timbre) -> VoiceId {
        let id = VoiceId(self.next_id);
        self.place(Voice::new(id, frequency, timbre, self.sample_rate))
    }

    /// Add a voice built elsewhere. Ids handed out afterwards stay above its id.
    ///
    /// A voice whose id is already in the pool is handed back untouched.
    pub fn insert(&mut self, voice: Voice) -> Result<VoiceId, Voice> {
        if self.contains(voice.id()) {
            return Err(voice);
        }
        Ok(self.place(voice))
    }

    fn place(&mut self, voice: Voice) -> VoiceId {
        let id = voice.id();
        self.next_id = self.next_id.max(id.0.wrapping_add(1));
        match self.free.pop() {
            Some(index) => self.slots[index] = Some(voice),
            None => self.slots.push(Some(voice)),
        }
        self.active += 1;
        id
    }

    /// Release one voice. Unknown ids are ignored.
    pub fn stop_voice(&mut self, id: VoiceId) -> bool {
        match self.get_mut(id) {
            Some(voice) => {
                voice.note_off();
                true
            }
            None => false,
        }
    }

    /// Release every voice at `frequency` (within tolerance). Returns how many.
    pub fn stop_frequency(&mut self, frequency: f32) -> usize {
        let mut released = 0;
        for voice in self.voices_mut() {
            if voice.matches_frequency(frequency) {
                voice.note_off();
                released += 1;
            }
        }
        released
    }

    /// Release everything.
    pub fn stop_all(&mut self) {
        for voice in self.voices_mut() {
            voice.note_off();
        }
    }

    /// Look up a voice.
    pub fn get(&self, id: VoiceId) -> Option<&Voice> {
        self.iter().find(|voice| voice.id() == id)
    }

    /// Look up a voice mutably.
    pub fn get_mut(&mut self, id: VoiceId) -> Option<&mut Voice> {
        self.voices_mut().find(|voice| voice.id() == id)
    }

    /// `true` if `id` is in the pool.
    pub fn contains(&self, id: VoiceId) -> bool {
        self.get(id).is_some()
    }

    /// Every voice, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.slots.iter().flatten()
    }

    fn voices_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.slots.iter_mut().flatten()
    }

    /// Mix interleaved frames into `output` without removing anything.
    pub fn render_frames(&mut self, output: &mut [f32], channels: usize, gain: f32) {
        let step = 1.0 / self.sample_rate;
        render_with(self.slots.iter_mut().flatten(), output, channels, gain, step);
    }

    /// Remove voices that have gone silent, handing each to `finished`.
    pub fn reap(&mut self, mut finished: impl FnMut(Voice)) -> usize {
        let mut removed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.as_ref().is_some_and(|voice| !voice.is_active()) {
                if let Some(voice) = slot.take() {
                    self.free.push(index);
                    finished(voice);
                    removed += 1;
                }
            }
        }
        self.active -= removed;
        removed
    }

    /// Render one buffer at unity gain, then drop finished voices.
    pub fn render(&mut self, output: &mut [f32], channels: usize) {
        self.render_frames(output, channels, 1.0);
        self.reap(drop);
    }
}

/// Sum every voice into each frame and write the clamped mix to all channels.
///
/// Voices are independent, so each one renders the whole buffer in turn into
/// channel 0 before the clamp. Trailing samples that do not fill a whole frame
/// are zeroed.
fn render_with<'a>(
    voices: impl Iterator<Item = &'a mut Voice>,
    output: &mut [f32],
    channels: usize,
    gain: f32,
    step: f32,
) {
    if channels == 0 {
        return;
    }
    output.fill(0.0);
    let frames = output.len() / channels;
    if frames == 0 {
        return;
    }
    for voice in voices {
        for frame in 0..frames {
            output[frame * channels] += voice.next_sample(step);
        }
    }
    for frame in output.chunks_exact_mut(channels) {
        let mixed = sanitize_output(frame[0] * gain);
        frame.fill(mixed);
    }
}

/// Fixed-size pool that steals slot 0 when full.
///
/// A note-on for a frequency that is already sounding retriggers that voice.
///
/// # Example
///
/// ```rust
/// use tonegrid_synth::{StealingPool, Timbre};
///
/// let mut pool = StealingPool::new(44100.0, 2, Timbre::default());
/// let first = pool.note_on(220.0);
/// pool.note_on(330.0);
/// let stolen = pool.note_on(440.0);
/// assert_eq!(stolen, first);
/// assert_eq!(pool.len(), 2);
/// ```
#[derive(Debug)]
pub struct StealingPool {
    voices: Vec<Voice>,
    max_voices: usize,
    next_id: u64,
    timbre: Timbre,
    sample_rate: f32,
}

impl StealingPool {
    /// Pool holding at most `max_voices` (at least 1).
    pub fn new(sample_rate: f32, max_voices: usize, timbre: Timbre) -> Self {
        let max_voices = max_voices.max(1);
        Self {
            voices: Vec::with_capacity(max_voices),
            max_voices,
            next_id: 0,
            timbre,
            sample_rate,
        }
    }

    /// Settings for voices created from now on.
    pub fn set_timbre(&mut self, timbre: Timbre) {
        self.timbre = timbre;
    }

    /// Current settings.
    pub fn timbre(&self) -> &Timbre {
        &self.timbre
    }

    /// Voice limit.
    pub fn max_voices(&self) -> usize {
        self.max_voices
    }

    /// Sounding voices.
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// `true` if nothing is sounding.
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Voices, oldest first.
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Start `frequency`, retriggering, allocating or stealing slot 0.
    pub fn note_on(&mut self, frequency: f32) -> VoiceId {
        if let Some(voice) = self.voices.iter_mut().find(|v| v.matches_frequency(frequency)) {
            voice.retrigger();
            return voice.id();
        }
        if self.voices.len() < self.max_voices {
            let id = VoiceId(self.next_id);
            self.next_id += 1;
            let voice = Voice::new(id, frequency, &self.timbre, self.sample_rate);
            self.voices.push(voice);
            return id;
        }
        // Full: the oldest slot takes the new note, even mid-release.
        let voice = &mut self.voices[0];
        voice.retarget(frequency);
        voice.id()
    }

    /// Release every voice at `frequency`.
    pub fn note_off_frequency(&mut self, frequency: f32) {
        for voice in &mut self.voices {
            if voice.matches_frequency(frequency) {
                voice.note_off();
            }
        }
    }

    /// Release one voice. Unknown ids are ignored.
    pub fn note_off(&mut self, id: VoiceId) {
        if let Some(voice) = self.voices.iter_mut().find(|v| v.id() == id) {
            voice.note_off();
        }
    }

    /// Render one buffer, then drop finished voices keeping slot order.
    pub fn render(&mut self, output: &mut [f32], channels: usize) {
        let step = 1.0 / self.sample_rate;
        render_with(self.voices.iter_mut(), output, channels, 1.0, step);
        self.voices.retain(Voice::is_active);
    }
}
