use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use crate::channel::ChannelBuffer;
use crate::sample::Sample;

/// Default per-channel history: 100 samples.
pub const DEFAULT_CAPACITY: usize = 100;

/// Map from channel name to its [`ChannelBuffer`].
///
/// Buffers are created on first write and live as long as the store. The map
/// itself sits behind an `RwLock` whose write side is only taken to insert a
/// never-seen channel; lookups of existing channels share the read side, and
/// sample data is guarded by each buffer's own lock.
///
/// The store is meant to be built once and shared as `Arc<ChannelStore>`
/// between the ingest path and the consumers.
#[derive(Debug)]
pub struct ChannelStore {
    channels: RwLock<HashMap<String, Arc<ChannelBuffer>>>,
    capacity: usize,
}

impl ChannelStore {
    /// Create a store with the default buffer capacity (100 samples).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a store whose buffers hold up to `capacity` samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "ChannelStore capacity must be > 0");
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Return the buffer for `channel`, creating it on first use.
    ///
    /// Every call for the same name returns a handle to the same buffer.
    pub fn get_or_create(&self, channel: &str) -> Arc<ChannelBuffer> {
        if let Some(buf) = self.get(channel) {
            return buf;
        }

        let mut channels = self
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Another writer may have created it between the two lock scopes.
        Arc::clone(channels.entry(channel.to_owned()).or_insert_with(|| {
            tracing::debug!(channel, capacity = self.capacity, "created channel buffer");
            Arc::new(ChannelBuffer::new(self.capacity))
        }))
    }

    /// Look up an existing buffer without creating it.
    pub fn get(&self, channel: &str) -> Option<Arc<ChannelBuffer>> {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(channel)
            .cloned()
    }

    /// Snapshot every known channel, keyed and ordered by name.
    ///
    /// Each snapshot is internally consistent. Channels are copied one after
    /// another, so there is no common instant across channels, and a channel
    /// created while this runs may or may not be included.
    pub fn snapshot_all(&self) -> BTreeMap<String, Vec<Sample>> {
        let buffers: Vec<(String, Arc<ChannelBuffer>)> = self
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, buf)| (name.clone(), Arc::clone(buf)))
            .collect();

        buffers
            .into_iter()
            .map(|(name, buf)| (name, buf.snapshot()))
            .collect()
    }

    /// Snapshot of one channel; empty if it was never written.
    pub fn snapshot(&self, channel: &str) -> Vec<Sample> {
        self.get(channel)
            .map(|buf| buf.snapshot())
            .unwrap_or_default()
    }

    /// Newest sample of one channel, if any.
    pub fn latest(&self, channel: &str) -> Option<Sample> {
        self.get(channel).and_then(|buf| buf.latest())
    }

    /// Names of all known channels, sorted.
    pub fn channel_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Capacity given to every buffer this store creates.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ChannelStore {
    fn default() -> Self {
        Self::new()
    }
}
