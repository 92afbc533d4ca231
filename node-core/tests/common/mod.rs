#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal_async::delay::DelayNs;
use fwe_node_core::msg::cdr::CdrWriter;
use fwe_node_core::msg::{Message, MAX_HEAD_LEN};
use fwe_node_core::mqtt::BrokerSession;
use fwe_node_core::{Clock, Encoding, FrameInfo, FrameSource, Publisher, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeError;

/// Shared, manually driven uptime
#[derive(Debug, Clone, Default)]
pub struct FakeClock(Rc<Cell<u64>>);

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, ms: u64) {
        self.0.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}

/// Delay that sleeps on the fake clock and remembers every pause
#[derive(Default)]
pub struct FakeDelay {
    pub clock: FakeClock,
    pub slept_ms: Vec<u32>,
}

impl FakeDelay {
    pub fn new(clock: FakeClock) -> Self {
        Self {
            clock,
            slept_ms: Vec::new(),
        }
    }
}

impl DelayNs for FakeDelay {
    async fn delay_ns(&mut self, ns: u32) {
        let ms = ns / 1_000_000;
        self.slept_ms.push(ms);
        self.clock.advance(u64::from(ms));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.slept_ms.push(ms);
        self.clock.advance(u64::from(ms));
    }
}

/// Camera stand-in serving queued frames
#[derive(Default)]
pub struct FakeSource {
    frames: VecDeque<(Vec<u8>, Encoding)>,
    held: Option<Vec<u8>>,
    pub fail_reads: bool,
    /// Time a capture takes on `clock`
    pub capture_ms: u64,
    /// Time a copy takes on `clock`
    pub copy_ms: u64,
    pub clock: FakeClock,
    pub acquires: usize,
    pub reads: usize,
    pub releases: usize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_jpeg(&mut self, len: usize) -> &mut Self {
        self.push(len, Encoding::Jpeg)
    }

    pub fn push(&mut self, len: usize, encoding: Encoding) -> &mut Self {
        let data = (0..len).map(|i| (i % 251) as u8).collect();
        self.frames.push_back((data, encoding));
        self
    }

    pub fn is_holding(&self) -> bool {
        self.held.is_some()
    }
}

impl FrameSource for FakeSource {
    type Error = FakeError;

    async fn acquire(&mut self) -> Result<FrameInfo, FakeError> {
        assert!(self.held.is_none(), "previous frame was never released");
        self.acquires += 1;
        self.clock.advance(self.capture_ms);
        let (data, encoding) = self.frames.pop_front().ok_or(FakeError)?;
        let info = FrameInfo {
            len: data.len(),
            encoding,
        };
        self.held = Some(data);
        Ok(info)
    }

    async fn read(&mut self, dst: &mut [u8]) -> Result<(), FakeError> {
        self.reads += 1;
        self.clock.advance(self.copy_ms);
        if self.fail_reads {
            return Err(FakeError);
        }
        let held = self.held.as_ref().ok_or(FakeError)?;
        dst.copy_from_slice(held);
        Ok(())
    }

    async fn release(&mut self) {
        self.releases += 1;
        self.held = None;
    }
}

/// One message handed to the transport
#[derive(Debug, Clone)]
pub struct Sent {
    pub topic: String,
    pub type_name: &'static str,
    pub head: Vec<u8>,
    pub tail: Vec<u8>,
}

impl Sent {
    /// Little-endian u32 at `offset` of the encoded head
    pub fn head_u32(&self, offset: usize) -> u32 {
        u32::from_le_bytes(self.head[offset..offset + 4].try_into().unwrap())
    }
}

/// Transport stand-in recording every publish
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Vec<Sent>,
    pub spins: usize,
    pub fail_publish: bool,
    pub fail_spin: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_topic(&self, topic: &str) -> Vec<&Sent> {
        self.sent.iter().filter(|s| s.topic == topic).collect()
    }
}

impl Transport for RecordingTransport {
    type Error = FakeError;

    async fn publish<M: Message>(&mut self, publisher: &Publisher<M>, message: &M) -> Result<(), FakeError> {
        if self.fail_publish {
            return Err(FakeError);
        }
        let mut buf = [0u8; MAX_HEAD_LEN];
        let mut writer = CdrWriter::new(&mut buf).unwrap();
        message.encode_head(&mut writer).unwrap();
        self.sent.push(Sent {
            topic: publisher.topic().to_string(),
            type_name: M::TYPE_NAME,
            head: writer.as_bytes().to_vec(),
            tail: message.tail().to_vec(),
        });
        Ok(())
    }

    async fn spin_some(&mut self, _budget_ms: u64) -> Result<(), FakeError> {
        self.spins += 1;
        if self.fail_spin {
            return Err(FakeError);
        }
        Ok(())
    }
}

/// What the fake broker saw
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerCall {
    Connect,
    Publish { topic: String, payload: Vec<u8> },
    Ping,
    Disconnect,
}

/// Broker session stand-in with scripted failures
///
/// The call log is shared so a test can inspect it while the link owns the session.
#[derive(Default)]
pub struct FakeBroker {
    pub calls: Rc<RefCell<Vec<BrokerCall>>>,
    pub clock: FakeClock,
    /// Time a connect takes on `clock`
    pub connect_ms: u64,
    /// Outcomes of the next connects; an empty script means success
    pub connect_results: VecDeque<Result<(), FakeError>>,
    pub fail_publish: bool,
    pub fail_ping: bool,
}

impl FakeBroker {
    pub fn new(clock: FakeClock) -> Self {
        Self {
            clock,
            ..Self::default()
        }
    }
}

impl BrokerSession for FakeBroker {
    type Error = FakeError;

    async fn connect(&mut self) -> Result<(), FakeError> {
        self.calls.borrow_mut().push(BrokerCall::Connect);
        self.clock.advance(self.connect_ms);
        self.connect_results.pop_front().unwrap_or(Ok(()))
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), FakeError> {
        self.calls.borrow_mut().push(BrokerCall::Publish {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        });
        if self.fail_publish {
            return Err(FakeError);
        }
        Ok(())
    }

    async fn ping(&mut self) -> Result<(), FakeError> {
        self.calls.borrow_mut().push(BrokerCall::Ping);
        if self.fail_ping {
            return Err(FakeError);
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), FakeError> {
        self.calls.borrow_mut().push(BrokerCall::Disconnect);
        Ok(())
    }
}
