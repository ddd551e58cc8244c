//! MQTT transport for AquaNode
//!
//! ## Design
//!
//! `rumqttc`'s synchronous [`Connection`] blocks while it waits on the
//! network, so it runs on a worker thread. The worker owns the event loop
//! and publishes what it learns:
//!
//! ```text
//!  worker thread                         scheduler thread
//!  ─────────────                         ────────────────
//!  connection.iter() ──▶ link / broker ──▶ link_ready(), broker_ready()
//!                        AtomicBools
//!                   ──▶ mpsc channel ───▶ drained by poll() / try_connect_*
//!                       (faults, session up, commands)
//!  Client::try_publish ◀───────────────── publish()
//! ```
//!
//! `rumqttc` reconnects by itself on the next loop iteration, so a connect
//! attempt from the gate only starts the worker (once) and otherwise reports
//! what the worker has seen since the previous attempt.
//!
//! With [`MqttConfig::tls`] the session runs over TLS (rustls, platform
//! root certificates), which is how the deployed brokers listen on
//! [`DEFAULT_TLS_PORT`].
//!
//! Publishes are retained so a late subscriber sees the last reading.
//! Messages on the command topic are logged and kept in a short backlog.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use aquanode_core::config::TelemetryConfig;
use aquanode_core::Connectivity;
use log::{debug, info, warn};
use rumqttc::{Client, ClientError, ConnectReturnCode, Connection, ConnectionError, Event, MqttOptions, Packet, Transport};

pub use rumqttc::QoS;

use crate::{ConnectionStats, ConnectorError};

/// Plain TCP broker port
pub const DEFAULT_PORT: u16 = 1883;

/// TLS broker port
pub const DEFAULT_TLS_PORT: u16 = 8883;

/// Keep-alive used by the node firmware's client
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Requests the client may queue before `publish` reports `BufferFull`
pub const DEFAULT_REQUEST_CAPACITY: usize = 10;

/// Pause between worker reconnect attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// MQTT 3.1.1 guarantees brokers accept ids up to this length
pub const MAX_CLIENT_ID_LEN: usize = 23;

/// Commands kept for [`MqttConnectivity::take_commands`]
pub const COMMAND_BACKLOG: usize = 16;

/// Broker address, identity and topics
#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    /// `(username, password)`
    pub credentials: Option<(String, String)>,
    pub keep_alive: Duration,
    /// Connect over TLS instead of plain TCP
    pub tls: bool,
    pub data_topic: String,
    pub command_topic: String,
    /// Publish readings as retained messages
    pub retain: bool,
    pub qos: QoS,
    pub request_capacity: usize,
    pub retry_delay: Duration,
}

impl MqttConfig {
    /// Settings for a node, taking client id and topics from its telemetry config
    pub fn for_node(host: impl Into<String>, port: u16, telemetry: &TelemetryConfig) -> Self {
        Self {
            host: host.into(),
            port,
            client_id: telemetry.device_id.as_str().to_owned(),
            credentials: None,
            keep_alive: DEFAULT_KEEP_ALIVE,
            tls: false,
            data_topic: telemetry.data_topic.as_str().to_owned(),
            command_topic: telemetry.command_topic.as_str().to_owned(),
            retain: true,
            qos: QoS::AtMostOnce,
            request_capacity: DEFAULT_REQUEST_CAPACITY,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    pub fn keep_alive_secs(mut self, secs: u64) -> Self {
        self.keep_alive = Duration::from_secs(secs);
        self
    }

    /// Verify the broker against the platform's root certificates
    pub fn tls(mut self) -> Self {
        self.tls = true;
        self
    }

    pub fn qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn validate(&self) -> Result<(), ConnectorError> {
        if self.host.is_empty() {
            return Err(ConnectorError::Config("broker host is empty".into()));
        }
        if self.port == 0 {
            return Err(ConnectorError::Config("broker port is zero".into()));
        }
        if self.client_id.is_empty() || self.client_id.len() > MAX_CLIENT_ID_LEN {
            return Err(ConnectorError::Config(format!(
                "client id must be 1..={MAX_CLIENT_ID_LEN} bytes, got {}",
                self.client_id.len()
            )));
        }
        if self.keep_alive < Duration::from_secs(1) {
            return Err(ConnectorError::Config("keep-alive below one second".into()));
        }
        if self.data_topic.is_empty() || self.command_topic.is_empty() {
            return Err(ConnectorError::Config("empty topic".into()));
        }
        if self.request_capacity == 0 {
            return Err(ConnectorError::Config("request capacity is zero".into()));
        }
        Ok(())
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(self.client_id.clone(), self.host.clone(), self.port);
        options.set_keep_alive(self.keep_alive);
        options.set_clean_session(true);
        if self.tls {
            options.set_transport(Transport::tls_with_default_config());
        }
        if let Some((username, password)) = &self.credentials {
            options.set_credentials(username.clone(), password.clone());
        }
        options
    }
}

/// A message received on the command topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl Command {
    pub fn payload_lossy(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Which layer a worker error took down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    Link,
    Broker,
}

fn layer_of(error: &ConnectionError) -> Layer {
    match error {
        ConnectionError::Io(_) | ConnectionError::NetworkTimeout | ConnectionError::FlushTimeout => {
            Layer::Link
        }
        _ => Layer::Broker,
    }
}

fn fault_for(error: &ConnectionError) -> ConnectorError {
    match error {
        ConnectionError::ConnectionRefused(code) => ConnectorError::BrokerRefused(format!("{code:?}")),
        e if layer_of(e) == Layer::Link => ConnectorError::LinkLost(e.to_string()),
        e => ConnectorError::Protocol(e.to_string()),
    }
}

#[derive(Debug)]
enum WorkerEvent {
    SessionUp,
    Fault(Layer, ConnectorError),
    Command(Command),
}

/// Flags shared with the worker
#[derive(Debug, Default)]
struct Session {
    link: AtomicBool,
    broker: AtomicBool,
    running: AtomicBool,
    stop: AtomicBool,
}

impl Session {
    fn set(&self, link: bool, broker: bool) {
        self.link.store(link, Ordering::Release);
        self.broker.store(broker, Ordering::Release);
    }
}

struct Worker {
    session: Arc<Session>,
    events: Sender<WorkerEvent>,
    subscriber: Client,
    command_topic: String,
    qos: QoS,
    retry_delay: Duration,
}

impl Worker {
    fn run(self, mut connection: Connection) {
        for notification in connection.iter() {
            if self.session.stop.load(Ordering::Acquire) {
                break;
            }
            match notification {
                Ok(Event::Incoming(Packet::ConnAck(ack))) if ack.code == ConnectReturnCode::Success => {
                    self.session.set(true, true);
                    if let Err(e) = self.subscriber.try_subscribe(self.command_topic.as_str(), self.qos) {
                        warn!("subscribe to {} failed: {e}", self.command_topic);
                    }
                    let _ = self.events.send(WorkerEvent::SessionUp);
                }
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    self.session.set(true, false);
                    let fault = ConnectorError::BrokerRefused(format!("{:?}", ack.code));
                    let _ = self.events.send(WorkerEvent::Fault(Layer::Broker, fault));
                }
                Ok(Event::Incoming(Packet::Publish(message))) => {
                    let _ = self.events.send(WorkerEvent::Command(Command {
                        topic: message.topic.clone(),
                        payload: message.payload.to_vec(),
                    }));
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    self.session.broker.store(false, Ordering::Release);
                }
                Ok(_) => {}
                Err(e) => {
                    let layer = layer_of(&e);
                    // A refused session still had a working TCP connection
                    let link_up = matches!(e, ConnectionError::ConnectionRefused(_));
                    self.session.set(link_up, false);
                    let _ = self.events.send(WorkerEvent::Fault(layer, fault_for(&e)));
                    thread::sleep(self.retry_delay);
                }
            }
        }
        self.session.set(false, false);
        self.session.running.store(false, Ordering::Release);
        debug!("mqtt worker exited");
    }
}

/// [`Connectivity`] over an MQTT broker
///
/// Nothing touches the network until the gate first calls
/// `try_connect_link`.
pub struct MqttConnectivity {
    config: MqttConfig,
    client: Option<Client>,
    session: Arc<Session>,
    events: Option<Receiver<WorkerEvent>>,
    link_fault: Option<ConnectorError>,
    broker_fault: Option<ConnectorError>,
    commands: VecDeque<Command>,
    sessions: u32,
    stats: ConnectionStats,
}

impl MqttConnectivity {
    pub fn new(config: MqttConfig) -> Result<Self, ConnectorError> {
        config.validate()?;
        Ok(Self {
            config,
            client: None,
            session: Arc::new(Session::default()),
            events: None,
            link_fault: None,
            broker_fault: None,
            commands: VecDeque::with_capacity(COMMAND_BACKLOG),
            sessions: 0,
            stats: ConnectionStats::default(),
        })
    }

    pub fn config(&self) -> &MqttConfig {
        &self.config
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    /// Worker thread is alive
    pub fn is_running(&self) -> bool {
        self.client.is_some() && self.session.running.load(Ordering::Acquire)
    }

    /// Commands received since the last call, oldest first
    pub fn take_commands(&mut self) -> Vec<Command> {
        self.drain();
        self.commands.drain(..).collect()
    }

    fn start(&mut self) -> Result<(), ConnectorError> {
        let (client, connection) = Client::new(self.config.options(), self.config.request_capacity);
        let (tx, rx) = mpsc::channel();
        let session = Arc::new(Session::default());
        session.running.store(true, Ordering::Release);

        let worker = Worker {
            session: Arc::clone(&session),
            events: tx,
            subscriber: client.clone(),
            command_topic: self.config.command_topic.clone(),
            qos: self.config.qos,
            retry_delay: self.config.retry_delay,
        };
        thread::Builder::new()
            .name(format!("mqtt-{}", self.config.client_id))
            .spawn(move || worker.run(connection))
            .map_err(|e| ConnectorError::Protocol(format!("spawn worker: {e}")))?;

        info!(
            "connecting to {}://{}:{} as {}",
            if self.config.tls { "mqtts" } else { "mqtt" },
            self.config.host,
            self.config.port,
            self.config.client_id
        );
        self.client = Some(client);
        self.session = session;
        self.events = Some(rx);
        Ok(())
    }

    /// Forget a dead worker so the next link attempt spawns a new one
    fn reap(&mut self) {
        self.client = None;
        self.events = None;
        self.session = Arc::new(Session::default());
    }

    fn drain(&mut self) {
        let pending: Vec<WorkerEvent> = match self.events.as_ref() {
            Some(events) => events.try_iter().collect(),
            None => return,
        };
        for event in pending {
            match event {
                WorkerEvent::SessionUp => {
                    self.sessions += 1;
                    if self.sessions > 1 {
                        self.stats.reconnections += 1;
                    }
                    self.link_fault = None;
                    self.broker_fault = None;
                    info!("mqtt session established ({} so far)", self.sessions);
                }
                WorkerEvent::Fault(layer, fault) => {
                    warn!("mqtt {layer:?} fault: {fault}");
                    self.stats.last_error = Some(fault.to_string());
                    match layer {
                        Layer::Link => self.link_fault = Some(fault),
                        Layer::Broker => self.broker_fault = Some(fault),
                    }
                }
                WorkerEvent::Command(command) => {
                    info!("command on {}: {}", command.topic, command.payload_lossy());
                    self.stats.commands_received += 1;
                    if self.commands.len() == COMMAND_BACKLOG {
                        self.commands.pop_front();
                    }
                    self.commands.push_back(command);
                }
            }
        }
    }
}

impl Connectivity for MqttConnectivity {
    type Error = ConnectorError;

    fn link_ready(&self) -> bool {
        self.session.link.load(Ordering::Acquire)
    }

    fn broker_ready(&self) -> bool {
        self.link_ready() && self.session.broker.load(Ordering::Acquire)
    }

    fn try_connect_link(&mut self) -> nb::Result<(), ConnectorError> {
        if self.client.is_none() {
            self.start().map_err(nb::Error::Other)?;
            return Err(nb::Error::WouldBlock);
        }
        self.drain();
        if self.link_ready() {
            return Ok(());
        }
        if let Some(fault) = self.link_fault.take() {
            return Err(nb::Error::Other(fault));
        }
        if !self.session.running.load(Ordering::Acquire) {
            self.reap();
            return Err(nb::Error::Other(ConnectorError::WorkerStopped));
        }
        Err(nb::Error::WouldBlock)
    }

    fn try_connect_broker(&mut self) -> nb::Result<(), ConnectorError> {
        self.drain();
        if self.broker_ready() {
            return Ok(());
        }
        if !self.link_ready() {
            return Err(nb::Error::Other(ConnectorError::NotConnected));
        }
        match self.broker_fault.take() {
            Some(fault) => Err(nb::Error::Other(fault)),
            None => Err(nb::Error::WouldBlock),
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), ConnectorError> {
        let client = match self.client.as_ref() {
            Some(client) if self.broker_ready() => client,
            _ => {
                self.stats.messages_failed += 1;
                return Err(ConnectorError::NotConnected);
            }
        };

        match client.try_publish(topic, self.config.qos, self.config.retain, payload.to_vec()) {
            Ok(()) => {
                self.stats.messages_sent += 1;
                self.stats.bytes_sent += payload.len() as u64;
                Ok(())
            }
            Err(e) => {
                let error = match e {
                    ClientError::TryRequest(_) => ConnectorError::BufferFull,
                    ClientError::Request(_) => ConnectorError::WorkerStopped,
                };
                self.stats.messages_failed += 1;
                self.stats.last_error = Some(error.to_string());
                Err(error)
            }
        }
    }

    fn poll(&mut self) {
        self.drain();
    }
}

impl Drop for MqttConnectivity {
    fn drop(&mut self) {
        self.session.stop.store(true, Ordering::Release);
        if let Some(client) = self.client.take() {
            let _ = client.try_disconnect();
        }
    }
}
