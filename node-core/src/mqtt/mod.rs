//! Publishing through an MQTT broker
//!
//! The MQTT protocol itself is spoken by the client crate the firmware wraps
//! in a [`BrokerSession`]. What stays here is specific to the node: turning
//! messages into CDR payloads and the per-tick connection upkeep done by
//! [`MqttLink`].

mod link;

pub use link::MqttLink;

use crate::fmt::Loggable;
use crate::msg::cdr::CdrError;

/// What the node sends in CONNECT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectOptions<'a> {
    /// Client identifier, the node name
    pub client_id: &'a str,
    /// Keep-alive period in seconds; `0` turns keep-alive off
    pub keep_alive_secs: u16,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
}

/// One connection to the broker, as offered by an MQTT client
#[allow(async_fn_in_trait)]
pub trait BrokerSession {
    type Error: Loggable;

    /// Opens a fresh connection and session, dropping any previous one.
    ///
    /// Covers the transport handshake and CONNECT/CONNACK. Implementations
    /// bound it with their own connect timeout.
    async fn connect(&mut self) -> Result<(), Self::Error>;

    /// QoS 0 publish of a complete payload.
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error>;

    /// Sends PINGREQ and waits for the PINGRESP.
    async fn ping(&mut self) -> Result<(), Self::Error>;

    /// Sends DISCONNECT and closes the connection.
    async fn disconnect(&mut self) -> Result<(), Self::Error>;
}

/// Errors of the MQTT link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError<E> {
    /// The broker session failed; it is reopened on the next spin
    Session(E),
    /// No session is established
    NotConnected,
    /// Message serialization failed
    Encode(CdrError),
}

impl<E> From<CdrError> for LinkError<E> {
    fn from(e: CdrError) -> Self {
        LinkError::Encode(e)
    }
}
