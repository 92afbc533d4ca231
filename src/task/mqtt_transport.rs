//! Broker session over an `embassy-net` TCP socket
//!
//! The MQTT protocol is handled by `rust-mqtt`. A client is built around the
//! long-lived socket for each operation; once CONNACK is in, a QoS 0
//! publisher keeps no client state between packets.
//!
//! Connection upkeep (reconnects, keep-alive) is done by the core
//! [`MqttLink`] that wraps this session.

use defmt::{info, Debug2Format};
use embassy_net::tcp::{ConnectError, TcpSocket};
use embassy_net::Stack;
use embassy_time::{with_timeout, Delay, Duration, Instant};
use fwe_node_core::config::{AgentAddress, FRAME_CEILING};
use fwe_node_core::mqtt::{BrokerSession, ConnectOptions, MqttLink};
use rust_mqtt::client::client::MqttClient;
use rust_mqtt::client::client_config::{ClientConfig, MqttVersion};
use rust_mqtt::packet::v5::publish_packet::QualityOfService;
use rust_mqtt::packet::v5::reason_codes::ReasonCode;
use rust_mqtt::utils::rng_generator::CountingRng;
use static_cell::{ConstStaticCell, StaticCell};

use crate::system::config::BROKER_CONNECT_TIMEOUT;

/// Socket receive buffer; the broker only ever sends tiny packets
const SOCKET_RX_BUFFER_SIZE: usize = 512;

/// Socket send buffer; large frames are streamed through it
const SOCKET_TX_BUFFER_SIZE: usize = 8192;

/// Socket inactivity timeout
const SOCKET_TIMEOUT: Duration = Duration::from_secs(10);

/// Outgoing packet buffer: a whole image PUBLISH has to fit
const MQTT_TX_BUFFER_SIZE: usize = FRAME_CEILING + 1024;

/// Incoming packet buffer (CONNACK, PINGRESP)
const MQTT_RX_BUFFER_SIZE: usize = 256;

const MAX_PROPERTIES: usize = 5;

/// The node's MQTT transport
pub type MqttTransport = MqttLink<BrokerConnection, fn() -> u64, Delay>;

/// Milliseconds since boot
pub fn uptime_ms() -> u64 {
    Instant::now().as_millis()
}

/// Creates the transport; nothing is connected until `open()`.
pub fn new(stack: Stack<'static>, agent: AgentAddress, options: ConnectOptions<'static>) -> MqttTransport {
    let keep_alive_secs = options.keep_alive_secs;
    MqttLink::new(
        BrokerConnection::new(stack, agent, options),
        uptime_ms as fn() -> u64,
        Delay,
        keep_alive_secs,
    )
}

/// Errors of the broker connection
#[derive(Debug)]
pub enum BrokerError {
    /// TCP connect failed
    Tcp(ConnectError),
    /// The broker did not answer in time
    Timeout,
    /// The MQTT client reported a failure
    Mqtt(ReasonCode),
}

impl defmt::Format for BrokerError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            BrokerError::Tcp(e) => defmt::write!(f, "TCP connect failed: {:?}", e),
            BrokerError::Timeout => defmt::write!(f, "broker timed out"),
            BrokerError::Mqtt(code) => defmt::write!(f, "MQTT error: {}", Debug2Format(code)),
        }
    }
}

/// TCP socket plus the MQTT packet buffers
pub struct BrokerConnection {
    socket: TcpSocket<'static>,
    agent: AgentAddress,
    options: ConnectOptions<'static>,
    mqtt_tx: &'static mut [u8],
    mqtt_rx: &'static mut [u8],
}

impl BrokerConnection {
    fn new(stack: Stack<'static>, agent: AgentAddress, options: ConnectOptions<'static>) -> Self {
        static SOCKET_RX: StaticCell<[u8; SOCKET_RX_BUFFER_SIZE]> = StaticCell::new();
        static SOCKET_TX: StaticCell<[u8; SOCKET_TX_BUFFER_SIZE]> = StaticCell::new();
        // too large to be built on the stack
        static MQTT_TX: ConstStaticCell<[u8; MQTT_TX_BUFFER_SIZE]> = ConstStaticCell::new([0; MQTT_TX_BUFFER_SIZE]);
        static MQTT_RX: ConstStaticCell<[u8; MQTT_RX_BUFFER_SIZE]> = ConstStaticCell::new([0; MQTT_RX_BUFFER_SIZE]);

        let mut socket = TcpSocket::new(
            stack,
            SOCKET_RX.init([0; SOCKET_RX_BUFFER_SIZE]),
            SOCKET_TX.init([0; SOCKET_TX_BUFFER_SIZE]),
        );
        socket.set_timeout(Some(SOCKET_TIMEOUT));

        Self {
            socket,
            agent,
            options,
            mqtt_tx: MQTT_TX.take(),
            mqtt_rx: MQTT_RX.take(),
        }
    }

    /// MQTT client speaking over the current socket
    fn client(&mut self) -> MqttClient<'_, &mut TcpSocket<'static>, MAX_PROPERTIES, CountingRng> {
        let mut config = ClientConfig::new(MqttVersion::MQTTv5, CountingRng(20000));
        config.add_client_id(self.options.client_id);
        config.keep_alive = self.options.keep_alive_secs;
        if let Some(username) = self.options.username {
            config.add_username(username);
        }
        if let Some(password) = self.options.password {
            config.add_password(password);
        }

        let tx_len = self.mqtt_tx.len();
        let rx_len = self.mqtt_rx.len();
        MqttClient::new(
            &mut self.socket,
            &mut *self.mqtt_tx,
            tx_len,
            &mut *self.mqtt_rx,
            rx_len,
            config,
        )
    }
}

impl BrokerSession for BrokerConnection {
    type Error = BrokerError;

    async fn connect(&mut self) -> Result<(), BrokerError> {
        // drop whatever is left of the previous connection
        self.socket.abort();
        let _ = self.socket.flush().await;

        with_timeout(
            BROKER_CONNECT_TIMEOUT,
            self.socket.connect((self.agent.ip, self.agent.port)),
        )
        .await
        .map_err(|_| BrokerError::Timeout)?
        .map_err(BrokerError::Tcp)?;

        let mut client = self.client();
        with_timeout(BROKER_CONNECT_TIMEOUT, client.connect_to_broker())
            .await
            .map_err(|_| BrokerError::Timeout)?
            .map_err(BrokerError::Mqtt)?;

        info!(
            "Connected to broker {}:{} as {}",
            Debug2Format(&self.agent.ip),
            self.agent.port,
            self.options.client_id
        );
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), BrokerError> {
        self.client()
            .send_message(topic, payload, QualityOfService::QoS0, false)
            .await
            .map_err(BrokerError::Mqtt)
    }

    async fn ping(&mut self) -> Result<(), BrokerError> {
        let mut client = self.client();
        with_timeout(BROKER_CONNECT_TIMEOUT, client.send_ping())
            .await
            .map_err(|_| BrokerError::Timeout)?
            .map_err(BrokerError::Mqtt)
    }

    async fn disconnect(&mut self) -> Result<(), BrokerError> {
        let result = self.client().disconnect().await.map_err(BrokerError::Mqtt);
        self.socket.close();
        result
    }
}
