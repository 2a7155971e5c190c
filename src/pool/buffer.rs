//! Growable I/O buffer
//!
//! Resizable byte sequence used for request/response payloads and header
//! blocks. Storage is allocated on demand and released by [`IoBuffer::free`].

use bytes::BytesMut;
use std::ops::{Deref, DerefMut};

/// A growable payload buffer
#[derive(Debug, Default)]
pub struct IoBuffer {
    data: BytesMut,
}

impl IoBuffer {
    /// Create a buffer with the given initial capacity (0 = no allocation)
    pub fn new(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
        }
    }

    /// Ensure room for at least `size` bytes
    pub fn alloc(&mut self, size: usize) {
        if self.data.capacity() < size {
            self.data.reserve(size - self.data.len());
        }
    }

    /// Drop the contents and release the backing storage
    pub fn free(&mut self) {
        self.data = BytesMut::new();
    }

    /// Append bytes, growing as needed
    pub fn write(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Get the buffer's capacity
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Written bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Underlying storage for codecs that write in place
    pub fn as_bytes_mut(&mut self) -> &mut BytesMut {
        &mut self.data
    }
}

impl Deref for IoBuffer {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl DerefMut for IoBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}
