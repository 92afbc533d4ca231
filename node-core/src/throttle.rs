//! Frame publication throttle
//!
//! Bounds how often camera frames go out and how large they may be, and keeps
//! one grow-only buffer for the frame bytes across ticks.
//!
//! # Per-tick behaviour
//! - The tick counter is incremented first; only ticks where the counter is a
//!   multiple of the divisor try to publish (every 5th tick by default).
//! - A capture failure ends the tick; there is no retry until the next publish tick.
//! - Frames that are not JPEG or exceed the ceiling are released unread.
//! - The image is stamped with the clock read right after the frame was copied.
//! - The held frame is released after the publish attempt, whatever its result.
//!
//! All failures are soft: they are logged and reported as [`FrameOutcome::Skipped`].

use crate::buffer::ReusableBuffer;
use crate::capture::{Encoding, FrameSource};
use crate::config::NodeConfig;
use crate::msg::{CompressedImage, Header};
use crate::time::{Clock, Time};
use crate::topic::Publisher;
use crate::transport::Transport;

/// Publisher type for camera frames
pub type ImagePublisher = Publisher<CompressedImage<'static>>;

/// Why a publish tick did not forward a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SkipReason {
    /// The camera did not deliver a frame
    CaptureFailed,
    /// The frame was not JPEG
    WrongEncoding,
    /// The frame exceeded the ceiling
    Oversized { len: usize },
    /// Copying the frame out of the camera failed
    CopyFailed,
    /// The transport rejected the message
    PublishFailed,
}

/// Result of one throttle call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameOutcome {
    /// Not a publish tick
    NotDue,
    /// A frame of `len` bytes was handed to the transport
    Published { len: usize },
    Skipped(SkipReason),
}

/// Throttle state: tick counter plus the reusable frame buffer
pub struct FrameThrottle {
    counter: u32,
    divisor: u32,
    ceiling: usize,
    frame_id: &'static str,
    format: &'static str,
    buffer: ReusableBuffer,
}

impl FrameThrottle {
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            counter: 0,
            divisor: config.frame_publish_divisor.max(1),
            ceiling: config.frame_ceiling,
            frame_id: config.frame_id,
            format: config.image_format,
            buffer: ReusableBuffer::new(),
        }
    }

    /// Continues counting from `counter`, e.g. after a warm restart.
    ///
    /// The counter wraps at `u32::MAX`; `0` counts as a publish tick again.
    pub fn starting_at(mut self, counter: u32) -> Self {
        self.counter = counter;
        self
    }

    /// Ticks seen so far (wrapping)
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// The reusable frame buffer
    pub fn buffer(&self) -> &ReusableBuffer {
        &self.buffer
    }

    /// Runs the throttle for one scheduler tick.
    ///
    /// Must be called exactly once per tick.
    pub async fn maybe_publish_frame<S, T, C>(
        &mut self,
        source: &mut S,
        transport: &mut T,
        publisher: &ImagePublisher,
        clock: &C,
    ) -> FrameOutcome
    where
        S: FrameSource,
        T: Transport,
        C: Clock,
    {
        self.counter = self.counter.wrapping_add(1);
        if self.counter % self.divisor != 0 {
            return FrameOutcome::NotDue;
        }

        let info = match source.acquire().await {
            Ok(info) => info,
            Err(e) => {
                warn!("Frame capture failed: {:?}", e);
                return FrameOutcome::Skipped(SkipReason::CaptureFailed);
            }
        };

        let outcome = if info.encoding != Encoding::Jpeg {
            warn!("Frame is not JPEG ({:?}), skipping", info.encoding);
            FrameOutcome::Skipped(SkipReason::WrongEncoding)
        } else {
            info!("Frame captured: {} bytes", info.len);
            self.forward(info.len, source, transport, publisher, clock).await
        };

        // the frame goes back to the camera whatever happened to it
        source.release().await;
        outcome
    }

    async fn forward<S, T, C>(
        &mut self,
        len: usize,
        source: &mut S,
        transport: &mut T,
        publisher: &ImagePublisher,
        clock: &C,
    ) -> FrameOutcome
    where
        S: FrameSource,
        T: Transport,
        C: Clock,
    {
        if len > self.ceiling {
            warn!("Frame too large: {} bytes > {} bytes, skipping", len, self.ceiling);
            return FrameOutcome::Skipped(SkipReason::Oversized { len });
        }

        let (slot, grown) = self.buffer.stage(len);
        if grown {
            debug!("Frame buffer reallocated: {} bytes", len);
        }
        if let Err(e) = source.read(slot).await {
            self.buffer.clear();
            warn!("Frame copy failed: {:?}", e);
            return FrameOutcome::Skipped(SkipReason::CopyFailed);
        }

        let image = CompressedImage {
            header: Header {
                stamp: Time::from_millis(clock.now_ms()),
                frame_id: self.frame_id,
            },
            format: self.format,
            data: self.buffer.as_slice(),
        };

        match transport.publish(publisher, &image).await {
            Ok(()) => {
                info!("Image published: {} bytes", len);
                FrameOutcome::Published { len }
            }
            Err(e) => {
                warn!("Image publish failed: {:?}", e);
                FrameOutcome::Skipped(SkipReason::PublishFailed)
            }
        }
    }
}
