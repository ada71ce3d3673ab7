//! Bridge between a transport's notifications and the [`IngestHandler`].
//!
//! The transport pushes [`Delivery`] events into an mpsc channel from its own
//! task; [`delivery_loop`] is the single consumer and therefore the single
//! writer of the channel store.

use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::IngestError;
use crate::handler::IngestHandler;

/// Notifications a transport delivers to the ingest path.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// A (re)connection to the broker was established.
    Connected,
    /// An inbound publish, stamped when the transport received it.
    Message {
        topic: String,
        payload: Vec<u8>,
        received_at: DateTime<Local>,
    },
}

impl Delivery {
    /// A message received just now.
    pub fn message(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self::Message {
            topic: topic.into(),
            payload: payload.into(),
            received_at: Local::now(),
        }
    }
}

/// Subscribes the transport to a topic.
///
/// Called from the delivery loop on every [`Delivery::Connected`], so it must
/// not block.
pub trait Subscriber: Send + Sync {
    fn subscribe(&self, topic: &str) -> Result<(), IngestError>;
}

/// Consume deliveries until the sender side closes or `cancel` fires.
///
/// Every `Connected` re-subscribes to all `topics`; a failed subscription is
/// logged and the loop keeps going. Messages are handed to
/// [`IngestHandler::handle_at`] with the transport's receive time, so time
/// spent queued does not shift the sample timestamps.
pub async fn delivery_loop<S: Subscriber>(
    handler: Arc<IngestHandler>,
    subscriber: S,
    topics: Vec<String>,
    mut rx: mpsc::Receiver<Delivery>,
    cancel: CancellationToken,
) {
    debug!(topics = topics.len(), "delivery loop started");

    loop {
        let delivery = tokio::select! {
            _ = cancel.cancelled() => break,
            delivery = rx.recv() => match delivery {
                Some(d) => d,
                None => break,
            },
        };

        match delivery {
            Delivery::Connected => {
                for topic in &topics {
                    match subscriber.subscribe(topic) {
                        Ok(()) => info!(topic = %topic, "subscribed"),
                        Err(e) => warn!(topic = %topic, error = %e, "subscription failed"),
                    }
                }
            }
            Delivery::Message {
                topic,
                payload,
                received_at,
            } => handler.handle_at(&topic, &payload, received_at),
        }
    }

    let stats = handler.stats();
    info!(
        accepted = stats.accepted,
        discarded = stats.discarded,
        defaulted = stats.defaulted,
        "delivery loop stopped"
    );
}
