//! Node context and the cooperative loop body
//!
//! The node owns both collaborators and all loop state. One call to
//! [`Node::tick`] is one iteration of the steady-state loop:
//! 1. give the transport its time slice,
//! 2. publish counter and speed,
//! 3. run the frame throttle once.

use crate::capture::FrameSource;
use crate::config::NodeConfig;
use crate::telemetry::{TelemetrySample, TelemetryTick};
use crate::throttle::{FrameOutcome, FrameThrottle, ImagePublisher};
use crate::time::Clock;
use crate::transport::Transport;

/// What one loop iteration did
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    pub telemetry: TelemetrySample,
    pub frame: FrameOutcome,
}

/// Everything the loop needs, in one place
pub struct Node<S, T, C> {
    source: S,
    transport: T,
    clock: C,
    telemetry: TelemetryTick,
    image_publisher: ImagePublisher,
    throttle: FrameThrottle,
    spin_budget_ms: u64,
}

impl<S, T, C> Node<S, T, C>
where
    S: FrameSource,
    T: Transport,
    C: Clock,
{
    pub fn new(
        config: &NodeConfig,
        source: S,
        transport: T,
        clock: C,
        telemetry: TelemetryTick,
        image_publisher: ImagePublisher,
    ) -> Self {
        Self {
            source,
            transport,
            clock,
            telemetry,
            image_publisher,
            throttle: FrameThrottle::new(config),
            spin_budget_ms: config.spin_budget_ms,
        }
    }

    /// Runs one loop iteration.
    pub async fn tick(&mut self) -> TickReport {
        if let Err(e) = self.transport.spin_some(self.spin_budget_ms).await {
            warn!("Transport spin failed: {:?}", e);
        }

        let telemetry = self.telemetry.tick(&mut self.transport).await;

        let frame = self
            .throttle
            .maybe_publish_frame(
                &mut self.source,
                &mut self.transport,
                &self.image_publisher,
                &self.clock,
            )
            .await;

        TickReport { telemetry, frame }
    }

    pub fn throttle(&self) -> &FrameThrottle {
        &self.throttle
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
