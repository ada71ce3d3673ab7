use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local};
use tracing::{debug, trace, warn};

use sensorboard_history::{ChannelStore, Sample};
use sensorboard_protocol::{channel_from_topic, decode_reading};

use crate::error::IngestError;

/// Counters describing what the ingest path has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Messages that produced a sample.
    pub accepted: u64,
    /// Messages dropped because the topic or payload was malformed.
    pub discarded: u64,
    /// Accepted messages whose `value` was missing or unusable and stored as `0.0`.
    pub defaulted: u64,
}

#[derive(Debug, Default)]
struct Counters {
    accepted: AtomicU64,
    discarded: AtomicU64,
    defaulted: AtomicU64,
}

/// Turns inbound `(topic, payload)` messages into samples.
///
/// Safe to call from whatever thread the transport delivers on. A bad message
/// is logged, counted, and dropped; it never stops later messages.
#[derive(Debug)]
pub struct IngestHandler {
    store: Arc<ChannelStore>,
    counters: Counters,
}

impl IngestHandler {
    pub fn new(store: Arc<ChannelStore>) -> Self {
        Self {
            store,
            counters: Counters::default(),
        }
    }

    /// Ingest one message, stamping it with the current wall-clock time.
    pub fn handle(&self, topic: &str, payload: &[u8]) {
        self.handle_at(topic, payload, Local::now());
    }

    /// Ingest one message received at `received_at`.
    pub fn handle_at(&self, topic: &str, payload: &[u8], received_at: DateTime<Local>) {
        match self.try_handle_at(topic, payload, received_at) {
            Ok(sample) => {
                trace!(topic, value = sample.value, "sample appended");
            }
            Err(e) => {
                self.counters.discarded.fetch_add(1, Ordering::Relaxed);
                warn!(topic, error = %e, "discarding sensor message");
            }
        }
    }

    /// Like [`handle_at`](Self::handle_at), but returns the outcome instead of
    /// logging it.
    pub fn try_handle_at(
        &self,
        topic: &str,
        payload: &[u8],
        received_at: DateTime<Local>,
    ) -> Result<Sample, IngestError> {
        let channel = channel_from_topic(topic)?;
        let reading = decode_reading(payload)?;

        if reading.defaulted {
            self.counters.defaulted.fetch_add(1, Ordering::Relaxed);
            debug!(topic, "payload has no usable value, recording 0.0");
        }

        let sample = Sample::new(received_at, reading.value);
        self.store.get_or_create(channel).push(sample);
        self.counters.accepted.fetch_add(1, Ordering::Relaxed);
        Ok(sample)
    }

    pub fn stats(&self) -> IngestStats {
        IngestStats {
            accepted: self.counters.accepted.load(Ordering::Relaxed),
            discarded: self.counters.discarded.load(Ordering::Relaxed),
            defaulted: self.counters.defaulted.load(Ordering::Relaxed),
        }
    }

    /// The store this handler writes into.
    pub fn store(&self) -> &Arc<ChannelStore> {
        &self.store
    }
}
