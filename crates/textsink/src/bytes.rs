use alloc::{vec, vec::Vec};
use core::fmt;

use bstr::BStr;

/// Growable contiguous byte storage with an explicit write cursor.
///
/// `position <= capacity` always holds. The buffer grows by reallocation
/// (the engine flushes pending bytes first) and never shrinks during a
/// stream's life; `clear` only resets the cursor.
pub struct ByteBuffer {
    storage: Vec<u8>,
    position: usize,
}

impl ByteBuffer {
    /// A buffer with `capacity` writable bytes and the cursor at zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: vec![0; capacity],
            position: 0,
        }
    }

    /// Total writable bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Current write cursor.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Writable bytes left before the buffer overflows.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.storage.len() - self.position
    }

    /// Appends one byte. The caller has already checked `remaining`.
    pub fn put(&mut self, byte: u8) {
        debug_assert!(self.remaining() >= 1);
        self.storage[self.position] = byte;
        self.position += 1;
    }

    /// Appends a byte slice. The caller has already checked `remaining`.
    pub fn put_slice(&mut self, bytes: &[u8]) {
        debug_assert!(self.remaining() >= bytes.len());
        self.storage[self.position..self.position + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len();
    }

    /// The bytes written since the last `clear`.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.storage[..self.position]
    }

    /// Resets the write cursor, keeping capacity.
    pub fn clear(&mut self) {
        self.position = 0;
    }

    /// Grows capacity to `capacity` if larger; pending bytes are preserved.
    pub fn grow_to(&mut self, capacity: usize) {
        if capacity > self.storage.len() {
            self.storage.resize(capacity, 0);
        }
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("capacity", &self.capacity())
            .field("pending", &BStr::new(self.pending()))
            .finish()
    }
}
