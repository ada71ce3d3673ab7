//! sensorboard entry point.
//!
//! Subscribes to the configured sensor topics, keeps a bounded history per
//! channel, redraws a terminal chart on stderr and prints one report line per
//! tick on stdout.

mod config;
mod mqtt;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use sensorboard_consumers::{RenderConsumer, ReportConsumer, TextChart, spawn_periodic};
use sensorboard_history::ChannelStore;
use sensorboard_ingest::{IngestHandler, delivery_loop};

use config::DashboardConfig;

/// Deliveries buffered between the MQTT pump and the ingest loop.
const DELIVERY_QUEUE: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries report lines only.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting sensorboard");

    let config_arg = std::env::args_os().nth(1).map(PathBuf::from);
    let cfg = DashboardConfig::load(config_arg.as_deref())?;
    let channels = cfg.channel_specs()?;

    let store = Arc::new(ChannelStore::with_capacity(cfg.history.capacity));
    let handler = Arc::new(IngestHandler::new(Arc::clone(&store)));
    let cancel = CancellationToken::new();

    let (client, eventloop) = mqtt::client(&cfg.broker);
    let (tx, rx) = mpsc::channel(DELIVERY_QUEUE);

    let mut transport = tokio::spawn(mqtt::pump(eventloop, tx, cancel.clone()));
    let ingest = tokio::spawn(delivery_loop(
        Arc::clone(&handler),
        mqtt::MqttSubscriber::new(client.clone()),
        cfg.topics(),
        rx,
        cancel.clone(),
    ));

    let report = spawn_periodic(
        "report",
        ReportConsumer::new(Arc::clone(&store), channels.clone(), std::io::stdout()),
        cfg.report_interval(),
        cancel.clone(),
    );
    let render = cfg.render.enabled.then(|| {
        let chart = TextChart::new(std::io::stderr(), cfg.render.width);
        spawn_periodic(
            "render",
            RenderConsumer::new(Arc::clone(&store), channels, chart),
            cfg.render_interval(),
            cancel.clone(),
        )
    });

    tracing::info!(
        host = %cfg.broker.host,
        port = cfg.broker.port,
        topics = cfg.channels.len(),
        "connecting to broker"
    );

    let outcome = tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            tracing::info!("interrupted, shutting down");
            Ok(())
        }
        res = &mut transport => res?,
    };

    cancel.cancel();
    if let Err(e) = client.disconnect().await {
        tracing::debug!(error = %e, "disconnect request not sent");
    }

    let _ = report.await;
    if let Some(render) = render {
        let _ = render.await;
    }
    let _ = ingest.await;
    if !transport.is_finished() {
        let _ = transport.await;
    }

    let stats = handler.stats();
    tracing::info!(
        accepted = stats.accepted,
        discarded = stats.discarded,
        defaulted = stats.defaulted,
        channels = store.channel_ids().len(),
        "sensorboard stopped"
    );

    outcome
}
