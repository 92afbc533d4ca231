//! CDR (little-endian) encoder for the message heads
//!
//! Layout follows the ROS 2 serialization: a 4-byte encapsulation header
//! (`CDR_LE`) followed by the body, where every primitive is aligned to its
//! own size relative to the start of the body. Strings are a `u32` length
//! (including the terminating NUL), the bytes and the NUL.

/// Encapsulation header for little-endian plain CDR
pub const ENCAPSULATION_CDR_LE: [u8; 4] = [0x00, 0x01, 0x00, 0x00];

/// Errors raised while encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CdrError {
    /// The head buffer cannot hold the encoded value
    BufferTooSmall,
    /// A string or sequence length does not fit the `u32` length prefix
    LengthOverflow,
}

/// Writes CDR primitives into a fixed buffer
pub struct CdrWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> CdrWriter<'a> {
    /// Starts a new message, writing the encapsulation header.
    pub fn new(buf: &'a mut [u8]) -> Result<Self, CdrError> {
        let mut writer = Self { buf, pos: 0 };
        writer.put(&ENCAPSULATION_CDR_LE)?;
        Ok(writer)
    }

    /// Number of bytes written so far, encapsulation included
    pub fn len(&self) -> usize {
        self.pos
    }

    /// Whether nothing but the encapsulation header has been written
    pub fn is_empty(&self) -> bool {
        self.pos <= ENCAPSULATION_CDR_LE.len()
    }

    /// Bytes written so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    pub fn write_i32(&mut self, value: i32) -> Result<(), CdrError> {
        self.align(4)?;
        self.put(&value.to_le_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), CdrError> {
        self.align(4)?;
        self.put(&value.to_le_bytes())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<(), CdrError> {
        self.align(4)?;
        self.put(&value.to_le_bytes())
    }

    pub fn write_string(&mut self, value: &str) -> Result<(), CdrError> {
        let len = u32::try_from(value.len() + 1).map_err(|_| CdrError::LengthOverflow)?;
        self.write_u32(len)?;
        self.put(value.as_bytes())?;
        self.put(&[0])
    }

    /// Writes the element count of a byte sequence whose bytes follow the head.
    pub fn write_sequence_len(&mut self, len: usize) -> Result<(), CdrError> {
        let len = u32::try_from(len).map_err(|_| CdrError::LengthOverflow)?;
        self.write_u32(len)
    }

    fn align(&mut self, to: usize) -> Result<(), CdrError> {
        // alignment origin is the first byte after the encapsulation header
        let body = self.pos - ENCAPSULATION_CDR_LE.len();
        let pad = (to - body % to) % to;
        for _ in 0..pad {
            self.put(&[0])?;
        }
        Ok(())
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), CdrError> {
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            return Err(CdrError::BufferTooSmall);
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }
}
