//! Record buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` as the byte accumulator. TCP hands us arbitrary
//! chunks: a record may span several reads and one read may carry several
//! records. Whatever trails the last complete record stays buffered for the
//! next push.
//!
//! After each push the buffer reports whether it drained to exactly zero
//! bytes. That is the *quiescence* hint used to trigger a completion check.
//! It is a heuristic, not an end-of-batch marker: a server pausing on a
//! record boundary looks the same as a server that is done.
//!
//! # Example
//!
//! ```ignore
//! use seqfeed_client::protocol::RecordBuffer;
//!
//! let mut buffer = RecordBuffer::new();
//! let decoded = buffer.push(&chunk);
//!
//! for record in decoded.records {
//!     tracker.insert(record);
//! }
//! if decoded.quiescent {
//!     // check for gaps
//! }
//! ```

use bytes::{Buf, BytesMut};

use super::wire_format::RECORD_SIZE;
use super::Record;

/// Default accumulator capacity.
const DEFAULT_CAPACITY: usize = 64 * 1024;

/// Result of a single push.
#[derive(Debug, Default)]
pub struct Decoded {
    /// Complete records extracted, in wire order.
    pub records: Vec<Record>,
    /// True if the accumulator is empty after extraction.
    pub quiescent: bool,
}

/// Buffer for accumulating incoming bytes and extracting complete records.
pub struct RecordBuffer {
    buffer: BytesMut,
}

impl RecordBuffer {
    /// Create a new record buffer with default capacity (64KB).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new record buffer with custom capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Push data into the buffer and extract all complete records.
    ///
    /// Partial trailing bytes are kept for the next push.
    pub fn push(&mut self, data: &[u8]) -> Decoded {
        self.buffer.extend_from_slice(data);

        let mut records = Vec::with_capacity(self.buffer.len() / RECORD_SIZE);
        while let Some(record) = self.try_extract_one() {
            records.push(record);
        }

        Decoded {
            records,
            quiescent: self.buffer.is_empty(),
        }
    }

    fn try_extract_one(&mut self) -> Option<Record> {
        let record = Record::decode(&self.buffer)?;
        self.buffer.advance(RECORD_SIZE);
        Some(record)
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// True while part of a record is waiting for more bytes.
    pub fn has_partial(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Drop any buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for RecordBuffer {
    fn default() -> Self {
        Self::new()
    }
}
