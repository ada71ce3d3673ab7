use std::fmt::Write as _;
use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Local};

use sensorboard_history::{ChannelStore, Sample};

use crate::channel::ChannelSpec;
use crate::ticker::Tick;

/// Shown in place of a value for a channel that has no samples yet.
const NO_DATA: &str = "N/A";

/// Format one report line.
///
/// ```text
/// [14:03:07] Temperature: 21.5 °C | Humidity: N/A %
/// ```
pub fn format_report(at: DateTime<Local>, readings: &[(&ChannelSpec, Option<Sample>)]) -> String {
    let mut line = format!("[{}]", at.format("%H:%M:%S"));
    for (i, (spec, sample)) in readings.iter().enumerate() {
        line.push_str(if i == 0 { " " } else { " | " });
        let _ = write!(line, "{}: ", spec.label);
        match sample {
            Some(s) => {
                let _ = write!(line, "{:.1}", s.value);
            }
            None => line.push_str(NO_DATA),
        }
        if !spec.unit.is_empty() {
            line.push(' ');
            line.push_str(&spec.unit);
        }
    }
    line
}

/// Writes one line with the latest sample of each tracked channel per tick.
pub struct ReportConsumer<W> {
    store: Arc<ChannelStore>,
    channels: Vec<ChannelSpec>,
    out: W,
}

impl<W: Write + Send + 'static> ReportConsumer<W> {
    pub fn new(store: Arc<ChannelStore>, channels: Vec<ChannelSpec>, out: W) -> Self {
        Self {
            store,
            channels,
            out,
        }
    }

    /// Build the line for time `at` from the store's current contents.
    pub fn line_at(&self, at: DateTime<Local>) -> String {
        let readings: Vec<(&ChannelSpec, Option<Sample>)> = self
            .channels
            .iter()
            .map(|spec| (spec, self.store.latest(&spec.name)))
            .collect();
        format_report(at, &readings)
    }

    /// Consume the reporter, returning its output sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send + 'static> Tick for ReportConsumer<W> {
    fn tick(&mut self) {
        let line = self.line_at(Local::now());
        if let Err(e) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            tracing::warn!(error = %e, "failed to write report line");
        }
    }
}
