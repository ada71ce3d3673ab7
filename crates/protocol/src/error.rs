//! Protocol error types.

/// Errors produced while interpreting an inbound sensor message.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("topic {topic:?} has {segments} segments, need at least {needed}")]
    TopicTooShort {
        topic: String,
        segments: usize,
        needed: usize,
    },

    #[error("topic {0:?} has an empty channel segment")]
    EmptyChannel(String),

    #[error("payload is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,
}
