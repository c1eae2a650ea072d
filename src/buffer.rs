//! Fixed-size, indexed containers of signed 8-bit values.
//!
//! [`ByteBuffer`] is the only wire-level container exchanged with hooks and
//! with the program loader: source text, embedded input, and every buffer a
//! hook hands to [`crate::interpreter::Interpreter::feed`] is one of these.

use crate::error::BufferError;

/// A zero-initialised, fixed-size container of signed bytes.
///
/// The size is fixed at construction; there is no resizing operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ByteBuffer {
    data: Vec<i8>,
}

impl ByteBuffer {
    /// Allocates a buffer of `size` zero bytes. `size == 0` is valid and
    /// produces an empty buffer.
    pub fn new(size: u64) -> ByteBuffer {
        ByteBuffer {
            data: vec![0; size as usize],
        }
    }

    /// Builds a buffer directly from an owned vector of bytes, one cell per
    /// element.
    pub fn from_bytes(bytes: Vec<i8>) -> ByteBuffer {
        ByteBuffer { data: bytes }
    }

    /// The buffer's fixed size.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Reads the byte at `pos`.
    pub fn get_value(&self, pos: u64) -> Result<i8, BufferError> {
        self.data
            .get(pos as usize)
            .copied()
            .ok_or(BufferError::OutOfBounds {
                index: pos,
                size: self.size(),
            })
    }

    /// Writes `value` at `pos`.
    pub fn set_value(&mut self, pos: u64, value: i8) -> Result<(), BufferError> {
        let size = self.size();
        let slot = self
            .data
            .get_mut(pos as usize)
            .ok_or(BufferError::OutOfBounds { index: pos, size })?;
        *slot = value;
        Ok(())
    }

    /// Bulk-copies `bytes` into the buffer. `bytes.len()` must equal
    /// [`ByteBuffer::size`].
    pub fn set_contents(&mut self, bytes: &[i8]) -> Result<(), BufferError> {
        if bytes.len() as u64 != self.size() {
            return Err(BufferError::SizeMismatch {
                expected: self.size(),
                got: bytes.len(),
            });
        }
        self.data.copy_from_slice(bytes);
        Ok(())
    }

    /// Borrows the buffer's contents as a slice.
    pub fn as_slice(&self) -> &[i8] {
        &self.data
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(bytes: &[u8]) -> ByteBuffer {
        ByteBuffer {
            data: bytes.iter().map(|&b| b as i8).collect(),
        }
    }
}
