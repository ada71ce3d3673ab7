use std::sync::Arc;

use sensorboard_history::{ChannelStore, Sample};

use crate::channel::ChannelSpec;
use crate::ticker::Tick;

/// One channel's samples prepared for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub spec: ChannelSpec,
    /// Never empty; oldest first.
    pub points: Vec<Sample>,
}

impl Series {
    pub fn title(&self) -> String {
        format!("{} Over Time", self.spec.label)
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.points.last()
    }
}

/// A drawing surface the render consumer redraws every frame.
pub trait View: Send + 'static {
    /// Drop everything drawn for the previous frame.
    fn clear(&mut self);

    /// Add one series to the current frame.
    fn draw(&mut self, series: &Series);

    /// Show the finished frame.
    fn present(&mut self) -> std::io::Result<()>;
}

/// Redraws a [`View`] from a full store snapshot on every tick.
///
/// Configured channels are drawn first, in configuration order, followed by
/// any other channels the store has learned about, sorted by name. Channels
/// without samples are left out of the frame.
pub struct RenderConsumer<V> {
    store: Arc<ChannelStore>,
    channels: Vec<ChannelSpec>,
    view: V,
    frames: u64,
}

impl<V: View> RenderConsumer<V> {
    pub fn new(store: Arc<ChannelStore>, channels: Vec<ChannelSpec>, view: V) -> Self {
        Self {
            store,
            channels,
            view,
            frames: 0,
        }
    }

    /// Build the series for one frame from a fresh snapshot.
    pub fn frame(&self) -> Vec<Series> {
        let mut snapshot = self.store.snapshot_all();
        let mut series = Vec::with_capacity(snapshot.len());

        for spec in &self.channels {
            if let Some(points) = snapshot.remove(&spec.name) {
                series.push(Series {
                    spec: spec.clone(),
                    points,
                });
            }
        }
        // Remaining channels were never configured; label them by name.
        for (name, points) in snapshot {
            series.push(Series {
                spec: ChannelSpec::new(name.clone(), name, ""),
                points,
            });
        }

        series.retain(|s| !s.points.is_empty());
        series
    }

    /// Number of frames presented so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn view(&self) -> &V {
        &self.view
    }
}

impl<V: View> Tick for RenderConsumer<V> {
    fn tick(&mut self) {
        // The snapshot is fully copied before any drawing starts.
        let series = self.frame();

        self.view.clear();
        for s in &series {
            self.view.draw(s);
        }
        match self.view.present() {
            Ok(()) => self.frames += 1,
            Err(e) => tracing::warn!(error = %e, "failed to present frame"),
        }
    }
}
