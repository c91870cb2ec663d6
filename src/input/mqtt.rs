use std::{fs, path::Path, sync::Arc, time::Duration};

use rumqttc::{
    AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, TlsConfiguration, Transport,
};
use rustls::{ClientConfig, RootCertStore};
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
    time::sleep,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::MqttInputConfig,
    input::{InputError, InputSource, SourceKind},
    state::board::PlayerId,
};

/// Topic remote buzzers publish their presses to.
pub const BUTTON_TOPIC: &str = "cluequiz/pressed_button";

const QUEUE_CAPACITY: usize = 64;
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Buzzes received from a broker, queued by a background task.
pub struct RemoteSource {
    presses: mpsc::Receiver<PlayerId>,
    task: JoinHandle<()>,
}

impl RemoteSource {
    /// Connect to the broker with client-certificate TLS and start listening.
    ///
    /// The broker is verified against `cafile` when configured, otherwise against the system
    /// trust store. Must be called from within a tokio runtime. Only unusable TLS material
    /// fails here; connection problems are retried in the background.
    pub fn connect(config: &MqttInputConfig) -> Result<Self, InputError> {
        let tls = tls_configuration(config)?;

        let client_id = format!("cluequiz-{}", Uuid::new_v4());
        let mut options = MqttOptions::new(client_id, config.host.clone(), config.port);
        options.set_keep_alive(Duration::from_secs(10));
        options.set_transport(Transport::tls_with_config(tls));

        let (client, event_loop) = AsyncClient::new(options, 10);
        let (tx, presses) = mpsc::channel(QUEUE_CAPACITY);
        info!(host = %config.host, port = config.port, "connecting to remote buzzers");
        let task = tokio::spawn(run_event_loop(client, event_loop, tx));

        Ok(Self { presses, task })
    }
}

impl InputSource for RemoteSource {
    fn read(&mut self) -> Option<PlayerId> {
        self.presses.try_recv().ok()
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Remote
    }
}

impl Drop for RemoteSource {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>, InputError> {
    fs::read(path).map_err(|source| InputError::Certificate {
        path: path.to_path_buf(),
        source,
    })
}

fn tls_configuration(config: &MqttInputConfig) -> Result<TlsConfiguration, InputError> {
    let cert = read_pem(&config.certfile)?;
    let key = read_pem(&config.keyfile)?;

    match &config.cafile {
        Some(cafile) => Ok(TlsConfiguration::Simple {
            ca: read_pem(cafile)?,
            alpn: None,
            client_auth: Some((cert, key)),
        }),
        None => system_trust(config, &cert, &key),
    }
}

fn system_trust(
    config: &MqttInputConfig,
    cert: &[u8],
    key: &[u8],
) -> Result<TlsConfiguration, InputError> {
    let pem_error = |path: &Path, source| InputError::Certificate {
        path: path.to_path_buf(),
        source,
    };

    let certs = rustls_pemfile::certs(&mut &cert[..])
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| pem_error(&config.certfile, source))?;
    if certs.is_empty() {
        return Err(InputError::Pem {
            path: config.certfile.clone(),
            expected: "a certificate",
        });
    }
    let key = rustls_pemfile::private_key(&mut &key[..])
        .map_err(|source| pem_error(&config.keyfile, source))?
        .ok_or_else(|| InputError::Pem {
            path: config.keyfile.clone(),
            expected: "a private key",
        })?;

    let mut roots = RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs().map_err(InputError::TrustStore)?;
    let (added, ignored) = roots.add_parsable_certificates(native);
    debug!(added, ignored, "loaded system trust store");

    let client = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_client_auth_cert(certs, key)?;
    Ok(TlsConfiguration::Rustls(Arc::new(client)))
}

async fn run_event_loop(
    client: AsyncClient,
    mut event_loop: EventLoop,
    tx: mpsc::Sender<PlayerId>,
) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("remote buzzers connected");
                // subscriptions do not survive a reconnect
                if let Err(err) = client.subscribe(BUTTON_TOPIC, QoS::AtMostOnce).await {
                    warn!(error = %err, "failed to subscribe to remote buzzers");
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let Some(player) = parse_button(&publish.topic, &publish.payload) else {
                    debug!(topic = %publish.topic, "ignoring unexpected message");
                    continue;
                };
                match tx.try_send(player) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        warn!(%player, "remote buzz queue full, dropping")
                    }
                    Err(TrySendError::Closed(_)) => return,
                }
            }
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "remote buzzer connection failed");
                sleep(RETRY_DELAY).await;
            }
        }
    }
}

/// Player pressing a remote button, if the message is a valid press.
pub fn parse_button(topic: &str, payload: &[u8]) -> Option<PlayerId> {
    if topic != BUTTON_TOPIC {
        return None;
    }
    match payload {
        [byte] => PlayerId::from_button(*byte),
        _ => None,
    }
}
