//! Camera capture collaborator
//!
//! A source hands out one frame at a time. The frame stays held by the source
//! (its bytes live in the camera's own memory) until [`FrameSource::release`]
//! is called, so at most one frame is ever outstanding.

use crate::fmt::Loggable;

/// Pixel encoding of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Encoding {
    Jpeg,
    Rgb565,
    Yuv422,
}

/// Metadata of the held frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameInfo {
    /// Length of the frame in bytes
    pub len: usize,
    pub encoding: Encoding,
}

/// Something that captures compressed frames
#[allow(async_fn_in_trait)]
pub trait FrameSource {
    type Error: Loggable;

    /// Captures the next frame and holds it until [`release`](Self::release).
    async fn acquire(&mut self) -> Result<FrameInfo, Self::Error>;

    /// Copies the held frame into `dst`, which is exactly `FrameInfo::len` long.
    async fn read(&mut self, dst: &mut [u8]) -> Result<(), Self::Error>;

    /// Gives the held frame back to the source.
    async fn release(&mut self);
}
