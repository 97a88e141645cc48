//! Read cursor over the payload of the chunk currently being drained.

use bytes::Bytes;

/// The payload of one chunk plus a read offset into it.
///
/// Keeps `offset <= len` at all times. The payload is an owned `Bytes`
/// handle moved out of the chunk record, so it stays valid no matter what
/// the chunk cursor does next.
#[derive(Debug, Clone, Default)]
pub struct ChunkBuffer {
    data: Bytes,
    offset: usize,
}

impl ChunkBuffer {
    /// Create a buffer positioned at the start of `data`.
    pub fn new(data: Bytes) -> Self {
        Self { data, offset: 0 }
    }

    /// Create a buffer positioned at `offset`.
    ///
    /// Returns `None` if `offset` lies beyond the end of `data`.
    pub fn with_offset(data: Bytes, offset: usize) -> Option<Self> {
        if offset > data.len() {
            return None;
        }
        Some(Self { data, offset })
    }

    /// Total payload length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current read offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes not yet read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Whether every byte has been read.
    pub fn is_exhausted(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Copy as many unread bytes as fit into `dst` and advance past them.
    ///
    /// Returns the number of bytes copied.
    pub fn copy_to(&mut self, dst: &mut [u8]) -> usize {
        let count = dst.len().min(self.remaining());
        dst[..count].copy_from_slice(&self.data[self.offset..self.offset + count]);
        self.offset += count;
        count
    }
}
