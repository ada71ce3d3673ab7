//! Ingest error types.

use sensorboard_protocol::ProtocolError;

/// Errors produced on the ingest path.
///
/// None of these escape to the transport: [`IngestHandler::handle`] logs and
/// counts them, and the delivery loop carries on with the next message.
///
/// [`IngestHandler::handle`]: crate::IngestHandler::handle
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("malformed message: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("subscribe to {topic:?} failed: {reason}")]
    Subscribe { topic: String, reason: String },
}
