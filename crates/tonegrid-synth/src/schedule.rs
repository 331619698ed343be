//! Deadline list for ending notes.
//!
//! Instead of a timer per note, the control loop records `(deadline, id)`
//! pairs and asks for the expired ones once per tick.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::voice::VoiceId;

/// Pending note releases, keyed by deadline in seconds.
///
/// # Example
///
/// ```rust
/// use tonegrid_synth::{ReleaseSchedule, VoiceId};
///
/// let mut schedule = ReleaseSchedule::with_capacity(8);
/// schedule.schedule(0.5, VoiceId(1));
/// schedule.schedule(0.25, VoiceId(2));
///
/// let due: Vec<VoiceId> = schedule.due(0.3).collect();
/// assert_eq!(due, vec![VoiceId(2)]);
/// assert_eq!(schedule.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReleaseSchedule {
    pending: Vec<(f64, VoiceId)>,
    fired: Vec<VoiceId>,
}

impl ReleaseSchedule {
    /// Reserve room for `capacity` pending releases.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: Vec::with_capacity(capacity),
            fired: Vec::with_capacity(capacity),
        }
    }

    /// Release `id` once the clock reaches `deadline` seconds.
    pub fn schedule(&mut self, deadline: f64, id: VoiceId) {
        self.pending.push((deadline, id));
    }

    /// Drop any pending release for `id`.
    pub fn cancel(&mut self, id: VoiceId) {
        self.pending.retain(|&(_, pending)| pending != id);
    }

    /// Remove and yield every id whose deadline is at or before `now`,
    /// earliest first.
    pub fn due(&mut self, now: f64) -> impl Iterator<Item = VoiceId> + '_ {
        self.fired.clear();
        self.pending.sort_by(|a, b| a.0.total_cmp(&b.0));
        let split = self.pending.partition_point(|&(deadline, _)| deadline <= now);
        self.fired
            .extend(self.pending.drain(..split).map(|(_, id)| id));
        self.fired.drain(..)
    }

    /// Hand every id due at `now` to `release`, earliest first.
    ///
    /// Ids for which `release` returns `false` stay pending at their deadline
    /// and come up again on the next call. Returns how many were released.
    pub fn release_due(&mut self, now: f64, mut release: impl FnMut(VoiceId) -> bool) -> usize {
        self.pending.sort_by(|a, b| a.0.total_cmp(&b.0));
        let before = self.pending.len();
        self.pending
            .retain(|&(deadline, id)| deadline > now || !release(id));
        before - self.pending.len()
    }

    /// Hand every pending id to `release` regardless of deadline.
    ///
    /// Ids for which `release` returns `false` stay pending and become due
    /// immediately. Returns how many were released.
    pub fn release_all(&mut self, mut release: impl FnMut(VoiceId) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain_mut(|(deadline, id)| {
            if release(*id) {
                false
            } else {
                *deadline = f64::NEG_INFINITY;
                true
            }
        });
        before - self.pending.len()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<f64> {
        self.pending
            .iter()
            .map(|&(deadline, _)| deadline)
            .min_by(f64::total_cmp)
    }

    /// Pending releases.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop everything, returning the ids that were pending.
    pub fn clear(&mut self) -> impl Iterator<Item = VoiceId> + '_ {
        self.fired.clear();
        self.fired.extend(self.pending.drain(..).map(|(_, id)| id));
        self.fired.drain(..)
    }
}
