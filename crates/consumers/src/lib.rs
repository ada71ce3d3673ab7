//! Periodic readers of sensor channel history.
//!
//! Two consumers run on independent timers and only ever read the shared
//! [`ChannelStore`](sensorboard_history::ChannelStore):
//!
//! - [`RenderConsumer`] snapshots every channel and redraws a [`View`].
//! - [`ReportConsumer`] writes one line with the latest value per channel.
//!
//! Both are driven by [`spawn_periodic`], which knows nothing about drawing,
//! so the snapshot logic can be exercised without any graphics.

mod channel;
mod chart;
mod render;
mod report;
mod ticker;

pub use channel::ChannelSpec;
pub use chart::{TextChart, sparkline};
pub use render::{RenderConsumer, Series, View};
pub use report::{ReportConsumer, format_report};
pub use ticker::{Tick, spawn_periodic};
