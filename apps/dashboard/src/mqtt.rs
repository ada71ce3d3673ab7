//! MQTT transport built on `rumqttc`.
//!
//! [`pump`] drives the client's event loop and forwards connection and publish
//! notifications to the ingest path as [`Delivery`] events. Subscribing is
//! left to the delivery loop through [`MqttSubscriber`], so subscriptions are
//! renewed on every (re)connect.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use sensorboard_ingest::{Delivery, IngestError, Subscriber};

use crate::config::BrokerConfig;

/// Requests the client may queue before `try_subscribe` reports it full.
const CLIENT_QUEUE: usize = 16;

/// Pause between reconnect attempts after the first connection was made.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Build a client and its event loop from broker settings.
pub fn client(broker: &BrokerConfig) -> (AsyncClient, EventLoop) {
    let client_id = broker.client_id();
    let mut options = MqttOptions::new(client_id.as_str(), broker.host.as_str(), broker.port);
    options.set_keep_alive(Duration::from_secs(broker.keep_alive_secs));
    if !broker.username.is_empty() {
        options.set_credentials(broker.username.as_str(), broker.password.as_str());
    }
    debug!(client_id = %client_id, host = %broker.host, port = broker.port, "mqtt client configured");
    AsyncClient::new(options, CLIENT_QUEUE)
}

/// Subscribes through a `rumqttc` client without waiting on the network.
#[derive(Clone)]
pub struct MqttSubscriber {
    client: AsyncClient,
}

impl MqttSubscriber {
    pub fn new(client: AsyncClient) -> Self {
        Self { client }
    }
}

impl Subscriber for MqttSubscriber {
    fn subscribe(&self, topic: &str) -> Result<(), IngestError> {
        self.client
            .try_subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| IngestError::Subscribe {
                topic: topic.to_owned(),
                reason: e.to_string(),
            })
    }
}

/// Poll the event loop until cancelled, forwarding deliveries to `tx`.
///
/// Failing to reach the broker before the first ConnAck is returned as an
/// error. Once connected, errors are logged and the event loop reconnects on
/// the next poll.
pub async fn pump(
    mut eventloop: EventLoop,
    tx: mpsc::Sender<Delivery>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let mut connected_once = false;

    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = eventloop.poll() => event,
        };

        let delivery = match event {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                info!(code = ?ack.code, "connected to broker");
                connected_once = true;
                Delivery::Connected
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                Delivery::message(publish.topic, publish.payload.to_vec())
            }
            Ok(_) => continue,
            Err(e) if !connected_once => {
                return Err(anyhow::anyhow!("failed to connect to MQTT broker: {e}"));
            }
            Err(e) => {
                warn!(error = %e, "broker connection lost, reconnecting");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(RECONNECT_DELAY) => continue,
                }
            }
        };

        if tx.send(delivery).await.is_err() {
            debug!("delivery receiver closed");
            break;
        }
    }

    Ok(())
}
