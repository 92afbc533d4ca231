//! Hardware independent core of the camera node
//!
//! Everything the firmware does between "the network is up" and "bytes leave
//! on the socket" lives here, so it can be exercised on the host:
//! - [`throttle`]: every 5th tick a JPEG frame goes out, bounded in size
//! - [`telemetry`]: counter and simulated speed on every tick
//! - [`node`]: the loop body tying both to the transport
//! - [`bootstrap`]: session retries and publisher creation
//! - [`msg`] and [`mqtt`]: CDR encoding and broker connection upkeep
//! - [`camera`]: the ArduCAM Mega SPI driver
//!
//! Hardware and the network are reached only through the [`FrameSource`],
//! [`Transport`] and [`mqtt::BrokerSession`] traits, the [`Clock`], and the
//! `embedded-hal-async` traits underneath them.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

// must come first so the logging macros are visible to the other modules
mod fmt;

pub mod bootstrap;
pub mod buffer;
pub mod camera;
pub mod capture;
pub mod config;
pub mod error;
pub mod msg;
pub mod mqtt;
pub mod node;
pub mod telemetry;
pub mod throttle;
pub mod time;
pub mod topic;
pub mod transport;

pub use capture::{Encoding, FrameInfo, FrameSource};
pub use config::NodeConfig;
pub use error::{SetupError, SetupErrorKind, SetupStage};
pub use fmt::Loggable;
pub use node::{Node, TickReport};
pub use throttle::{FrameOutcome, FrameThrottle, ImagePublisher, SkipReason};
pub use time::{Clock, Time};
pub use topic::{Publisher, TopicError};
pub use transport::Transport;
