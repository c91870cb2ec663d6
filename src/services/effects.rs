//! Forwards round events to an MQTT broker for sound boards and light signs.

use std::time::Duration;

use rumqttc::{AsyncClient, MqttOptions, QoS};
use tokio::{
    sync::broadcast::error::RecvError,
    task::JoinHandle,
    time::sleep,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::EffectsConfig,
    state::events::{EventHub, RoundEvent},
};

const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Spawn the publisher task. It stops once the hub is dropped.
pub fn spawn_publisher(config: &EffectsConfig, events: &EventHub) -> JoinHandle<()> {
    let client_id = format!("cluequiz-effects-{}", Uuid::new_v4());
    let mut options = MqttOptions::new(client_id, config.host.clone(), config.port);
    options.set_keep_alive(Duration::from_secs(30));

    let (client, mut event_loop) = AsyncClient::new(options, 32);
    let mut rx = events.subscribe();
    let topic = config.topic.clone();
    info!(host = %config.host, port = config.port, %topic, "publishing round events");

    tokio::spawn(async move {
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Ok(event) => publish(&client, &topic, &event),
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "effects publisher lagging"),
                    Err(RecvError::Closed) => break,
                },
                polled = event_loop.poll() => {
                    if let Err(err) = polled {
                        warn!(error = %err, "effects broker unreachable");
                        sleep(RETRY_DELAY).await;
                    }
                }
            }
        }
        debug!("effects publisher stopped");
    })
}

fn publish(client: &AsyncClient, topic: &str, event: &RoundEvent) {
    let payload = match event.to_json() {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to encode round event");
            return;
        }
    };
    if let Err(err) = client.try_publish(topic, QoS::AtMostOnce, false, payload) {
        warn!(error = %err, "failed to queue round event");
    }
}
