//! Bounded in-memory history of sensor samples.
//!
//! A [`ChannelStore`] owns one [`ChannelBuffer`] per channel. Each buffer has
//! its own lock, so writers and readers of different channels never contend,
//! and every read hands back an owned copy of the samples.

pub mod buffer;
pub mod channel;
pub mod sample;
pub mod store;

pub use buffer::RingBuffer;
pub use channel::ChannelBuffer;
pub use sample::Sample;
pub use store::{ChannelStore, DEFAULT_CAPACITY};
