//! Grow-only frame buffer
//!
//! The backing storage is always fully initialized, so its length is the
//! capacity. `size` marks how many leading bytes belong to the current frame.

use alloc::vec;
use alloc::vec::Vec;

/// Byte buffer reused across frames
#[derive(Debug, Default)]
pub struct ReusableBuffer {
    data: Vec<u8>,
    size: usize,
}

impl ReusableBuffer {
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            size: 0,
        }
    }

    /// Bytes the buffer can hold without reallocating
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes of the current frame
    pub fn size(&self) -> usize {
        self.size
    }

    /// Current frame contents
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.size]
    }

    /// Prepares room for a frame of `len` bytes and returns it for filling.
    ///
    /// Reallocates to exactly `len` only when the capacity is smaller; a
    /// larger buffer is kept as is. Returns whether a reallocation happened.
    pub fn stage(&mut self, len: usize) -> (&mut [u8], bool) {
        let grown = self.capacity() < len;
        if grown {
            // drop the old allocation first so peak usage stays at one buffer
            self.data = Vec::new();
            self.data = vec![0; len];
        }
        self.size = len;
        (&mut self.data[..len], grown)
    }

    /// Marks the buffer as holding no frame.
    pub fn clear(&mut self) {
        self.size = 0;
    }
}
