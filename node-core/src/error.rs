//! Fatal set-up errors
//!
//! Anything that goes wrong while bringing the node up is unrecoverable: the
//! entry point logs it and resets the chip. Failures after set-up are soft and
//! never take this path.

use crate::camera::CameraError;
use crate::topic::TopicError;

/// Set-up step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetupStage {
    /// Wireless link and IP configuration
    Transport,
    /// Broker session (after all retries)
    Session,
    /// Node identity
    Node,
    /// One of the publishers
    Publisher,
    /// Camera bring-up
    Camera,
}

/// What went wrong in a set-up step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetupErrorKind {
    /// Gave up after this many attempts
    RetriesExhausted(u8),
    /// Invalid topic name
    Topic(TopicError),
    /// Node name unusable as client identifier
    InvalidNodeName,
    /// Driver reported an error code
    Code(i32),
    /// Timed out waiting
    Timeout,
    /// Broker address or port does not parse
    InvalidAddress,
}

/// Unrecoverable set-up failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetupError {
    pub stage: SetupStage,
    pub kind: SetupErrorKind,
}

impl SetupError {
    pub const fn new(stage: SetupStage, kind: SetupErrorKind) -> Self {
        Self { stage, kind }
    }

    /// Numeric code for the diagnostic log line, negative like the driver codes
    pub fn code(&self) -> i32 {
        match self.kind {
            SetupErrorKind::Code(code) => code,
            SetupErrorKind::RetriesExhausted(_) => -2,
            SetupErrorKind::Timeout => -3,
            SetupErrorKind::Topic(_) | SetupErrorKind::InvalidNodeName | SetupErrorKind::InvalidAddress => -11,
        }
    }
}

impl From<TopicError> for SetupError {
    fn from(e: TopicError) -> Self {
        Self::new(SetupStage::Publisher, SetupErrorKind::Topic(e))
    }
}

impl<E> From<CameraError<E>> for SetupError {
    fn from(e: CameraError<E>) -> Self {
        let kind = match e {
            CameraError::NotIdle | CameraError::CaptureTimeout => SetupErrorKind::Timeout,
            CameraError::UnknownSensor(id) => SetupErrorKind::Code(-i32::from(id)),
            CameraError::Spi(_) | CameraError::EmptyFrame | CameraError::NoFrame => SetupErrorKind::Code(-1),
        };
        Self::new(SetupStage::Camera, kind)
    }
}
