use crate::constants::{CHANNEL_SEGMENT, TOPIC_SEPARATOR};
use crate::error::ProtocolError;

/// Extracts the channel name from a sensor topic.
///
/// The channel is the fourth `/`-delimited segment, so
/// `sensors/esp32/esp32_living_room/temperature` yields `temperature`.
/// Any further segments are ignored.
pub fn channel_from_topic(topic: &str) -> Result<&str, ProtocolError> {
    match topic.split(TOPIC_SEPARATOR).nth(CHANNEL_SEGMENT) {
        Some("") => Err(ProtocolError::EmptyChannel(topic.to_owned())),
        Some(channel) => Ok(channel),
        None => Err(ProtocolError::TopicTooShort {
            topic: topic.to_owned(),
            segments: topic.split(TOPIC_SEPARATOR).count(),
            needed: CHANNEL_SEGMENT + 1,
        }),
    }
}
