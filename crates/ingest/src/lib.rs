//! Ingest path for sensor readings.
//!
//! [`IngestHandler`] turns `(topic, payload)` messages into samples in a
//! shared [`ChannelStore`](sensorboard_history::ChannelStore);
//! [`delivery_loop`] feeds it from a transport's [`Delivery`] channel and
//! subscribes to the configured topics whenever the transport connects.

pub mod delivery;
pub mod error;
pub mod handler;

pub use delivery::{Delivery, Subscriber, delivery_loop};
pub use error::IngestError;
pub use handler::{IngestHandler, IngestStats};
