use sensorboard_protocol::{ProtocolError, channel_from_topic};

/// A tracked channel and how to present it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    /// Channel name as stored, e.g. `temperature`.
    pub name: String,
    /// Human-readable label, e.g. `Temperature`.
    pub label: String,
    /// Unit suffix, e.g. `°C`. May be empty.
    pub unit: String,
}

impl ChannelSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            unit: unit.into(),
        }
    }

    /// Derive the channel name from a subscription topic, the same way the
    /// ingest path does. An empty `label` falls back to the channel name.
    pub fn from_topic(topic: &str, label: &str, unit: &str) -> Result<Self, ProtocolError> {
        let name = channel_from_topic(topic)?;
        let label = if label.is_empty() { name } else { label };
        Ok(Self::new(name, label, unit))
    }
}
