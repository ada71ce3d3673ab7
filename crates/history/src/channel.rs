use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};

use crate::buffer::RingBuffer;
use crate::sample::Sample;

/// Bounded, thread-safe history for a single channel.
///
/// All access goes through one mutex that is held only for the push/evict or
/// for copying samples out. Readers get owned data and never see a partially
/// applied append.
#[derive(Debug)]
pub struct ChannelBuffer {
    ring: Mutex<RingBuffer<Sample>>,
}

impl ChannelBuffer {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Mutex::new(RingBuffer::new(capacity)),
        }
    }

    /// Append a sample at the tail, evicting the oldest one when full.
    pub fn append(&self, timestamp: DateTime<Local>, value: f64) {
        self.push(Sample::new(timestamp, value));
    }

    /// Append an already built sample.
    pub fn push(&self, sample: Sample) {
        self.lock().push(sample);
    }

    /// Independent copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.lock().to_vec()
    }

    /// The newest sample still held, if any.
    pub fn latest(&self) -> Option<Sample> {
        self.lock().last().copied()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    // Every critical section leaves the ring consistent, so a panic on
    // another thread while holding the lock does not invalidate the data.
    fn lock(&self) -> MutexGuard<'_, RingBuffer<Sample>> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
