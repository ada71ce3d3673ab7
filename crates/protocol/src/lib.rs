//! Wire conventions shared by the sensorboard crates.
//!
//! Sensor readings arrive as MQTT publishes on topics shaped like
//! `sensors/<platform>/<device>/<channel>` with a JSON object payload carrying
//! a numeric `value` field.

pub mod constants;
pub mod error;
pub mod payload;
pub mod topic;

pub use error::ProtocolError;
pub use payload::{Reading, decode_reading};
pub use topic::channel_from_topic;
