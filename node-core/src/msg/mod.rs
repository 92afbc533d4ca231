//! Message shapes published by the node
//!
//! Each message encodes a small CDR head into a scratch buffer. Bulk payload
//! (the image bytes) is exposed separately through [`Message::tail`] so the
//! transport can stream it straight from the frame buffer.

pub mod cdr;

use crate::time::Time;
use cdr::{CdrError, CdrWriter};

/// Upper bound for any encoded message head
pub const MAX_HEAD_LEN: usize = 192;

/// A message that can be put on the bus
pub trait Message {
    /// Fully qualified interface type name
    const TYPE_NAME: &'static str;

    /// Encodes everything but the bulk tail.
    fn encode_head(&self, w: &mut CdrWriter<'_>) -> Result<(), CdrError>;

    /// Bytes appended verbatim after the head.
    fn tail(&self) -> &[u8] {
        &[]
    }
}

/// `std_msgs/Int32`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Int32 {
    pub data: i32,
}

impl Message for Int32 {
    const TYPE_NAME: &'static str = "std_msgs/msg/Int32";

    fn encode_head(&self, w: &mut CdrWriter<'_>) -> Result<(), CdrError> {
        w.write_i32(self.data)
    }
}

/// `std_msgs/Float32`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Float32 {
    pub data: f32,
}

impl Message for Float32 {
    const TYPE_NAME: &'static str = "std_msgs/msg/Float32";

    fn encode_head(&self, w: &mut CdrWriter<'_>) -> Result<(), CdrError> {
        w.write_f32(self.data)
    }
}

/// `std_msgs/Header`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Header<'a> {
    pub stamp: Time,
    pub frame_id: &'a str,
}

/// `sensor_msgs/CompressedImage`, borrowing its payload
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompressedImage<'a> {
    pub header: Header<'a>,
    pub format: &'a str,
    pub data: &'a [u8],
}

impl Message for CompressedImage<'_> {
    const TYPE_NAME: &'static str = "sensor_msgs/msg/CompressedImage";

    fn encode_head(&self, w: &mut CdrWriter<'_>) -> Result<(), CdrError> {
        w.write_i32(self.header.stamp.sec)?;
        w.write_u32(self.header.stamp.nanosec)?;
        w.write_string(self.header.frame_id)?;
        w.write_string(self.format)?;
        w.write_sequence_len(self.data.len())
    }

    fn tail(&self) -> &[u8] {
        self.data
    }
}
