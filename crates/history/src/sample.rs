use chrono::{DateTime, Local};

/// One timestamped reading.
///
/// Samples are plain values: they are created at ingest, copied out to
/// readers, and only ever removed from a buffer by eviction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Wall-clock receive time.
    pub timestamp: DateTime<Local>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Local>, value: f64) -> Self {
        Self { timestamp, value }
    }
}
