//! Node-side MQTT link
//!
//! Implements [`Transport`] on top of a [`BrokerSession`].
//!
//! # Spin policy
//! Each `spin_some` call does at most one piece of connection upkeep:
//! - a session that is down is reopened, with the session's own connect
//!   timeout rather than the time slice, so a slow broker only makes the
//!   tick longer;
//! - otherwise a PINGREQ goes out once half the keep-alive period passed
//!   without traffic; a ping that fails or goes unanswered drops the session.
//!
//! Whatever is left of the slice is then slept away.
//!
//! Every sent packet counts as keep-alive traffic.

use alloc::vec::Vec;
use embedded_hal_async::delay::DelayNs;

use super::{BrokerSession, LinkError};
use crate::msg::cdr::{CdrError, CdrWriter};
use crate::msg::{Message, MAX_HEAD_LEN};
use crate::time::Clock;
use crate::topic::Publisher;
use crate::transport::Transport;

/// Publishes node messages through a broker session
pub struct MqttLink<B, C, D> {
    session: B,
    clock: C,
    delay: D,
    keep_alive_ms: u64,
    connected: bool,
    last_activity_ms: u64,
    payload: Vec<u8>,
}

impl<B, C, D> MqttLink<B, C, D>
where
    B: BrokerSession,
    C: Clock,
    D: DelayNs,
{
    /// Creates the link; nothing is connected until [`open`](Self::open).
    pub fn new(session: B, clock: C, delay: D, keep_alive_secs: u16) -> Self {
        Self {
            session,
            clock,
            delay,
            keep_alive_ms: u64::from(keep_alive_secs) * 1000,
            connected: false,
            last_activity_ms: 0,
            payload: Vec::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn session(&self) -> &B {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut B {
        &mut self.session
    }

    /// Opens a fresh broker session, dropping any old one.
    pub async fn open(&mut self) -> Result<(), LinkError<B::Error>> {
        self.connected = false;
        self.session.connect().await.map_err(LinkError::Session)?;
        self.connected = true;
        self.last_activity_ms = self.clock.now_ms();
        info!("Broker session open");
        Ok(())
    }

    /// Says goodbye to the broker.
    pub async fn shutdown(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        if let Err(e) = self.session.disconnect().await {
            warn!("DISCONNECT failed: {:?}", e);
        }
    }

    fn ping_due(&self, now_ms: u64) -> bool {
        self.keep_alive_ms > 0 && now_ms.saturating_sub(self.last_activity_ms) >= self.keep_alive_ms / 2
    }

    /// Lays out the CDR head followed by the message tail in the payload buffer.
    fn encode<M: Message>(&mut self, message: &M) -> Result<(), CdrError> {
        let mut head = [0u8; MAX_HEAD_LEN];
        let mut writer = CdrWriter::new(&mut head)?;
        message.encode_head(&mut writer)?;

        // clear() keeps the capacity, so the buffer only grows
        self.payload.clear();
        self.payload.extend_from_slice(writer.as_bytes());
        self.payload.extend_from_slice(message.tail());
        Ok(())
    }

    async fn keep_alive(&mut self, now_ms: u64) -> Result<(), LinkError<B::Error>> {
        if !self.ping_due(now_ms) {
            return Ok(());
        }
        match self.session.ping().await {
            Ok(()) => {
                self.last_activity_ms = self.clock.now_ms();
                trace!("PINGRESP received");
                Ok(())
            }
            Err(e) => {
                warn!("Keep-alive ping failed, session lost");
                self.connected = false;
                Err(LinkError::Session(e))
            }
        }
    }
}

impl<B, C, D> Transport for MqttLink<B, C, D>
where
    B: BrokerSession,
    C: Clock,
    D: DelayNs,
{
    type Error = LinkError<B::Error>;

    async fn publish<M: Message>(&mut self, publisher: &Publisher<M>, message: &M) -> Result<(), Self::Error> {
        if !self.connected {
            return Err(LinkError::NotConnected);
        }
        self.encode(message)?;

        match self.session.publish(publisher.topic(), &self.payload).await {
            Ok(()) => {
                self.last_activity_ms = self.clock.now_ms();
                trace!("PUBLISH {} ({} bytes)", publisher.topic(), self.payload.len());
                Ok(())
            }
            Err(e) => {
                self.connected = false;
                Err(LinkError::Session(e))
            }
        }
    }

    async fn spin_some(&mut self, budget_ms: u64) -> Result<(), Self::Error> {
        let started = self.clock.now_ms();

        if !self.connected {
            info!("Broker session down, reconnecting");
            return self.open().await;
        }

        self.keep_alive(started).await?;

        let spent = self.clock.now_ms().saturating_sub(started);
        if spent < budget_ms {
            let rest = u32::try_from(budget_ms - spent).unwrap_or(u32::MAX);
            self.delay.delay_ms(rest).await;
        }
        Ok(())
    }
}
