//! Wire format encoding and decoding.
//!
//! Two frame kinds travel over the socket:
//! ```text
//! Request (client -> server), 2 bytes:
//! ┌────────┬────────┐
//! │ Opcode │ Arg    │
//! │ 1 byte │ 1 byte │
//! └────────┴────────┘
//!
//! Record (server -> client), 17 bytes:
//! ┌─────────┬──────┬──────────┬──────────┬──────────┐
//! │ Symbol  │ Side │ Quantity │ Price    │ Sequence │
//! │ 4 bytes │ 1    │ int32 BE │ int32 BE │ int32 BE │
//! └─────────┴──────┴──────────┴──────────┴──────────┘
//! ```
//!
//! All multi-byte integers are Big Endian.

use crate::error::{FeedError, Result};

/// Record frame size in bytes (fixed, exactly 17).
pub const RECORD_SIZE: usize = 17;

/// Request frame size in bytes (fixed, exactly 2).
pub const REQUEST_SIZE: usize = 2;

/// Largest sequence number a resend request can carry.
pub const MAX_RESEND_SEQUENCE: i32 = u8::MAX as i32;

/// Request opcodes.
pub mod opcode {
    /// Ask the server to stream every record it has.
    pub const STREAM_ALL: u8 = 1;
    /// Ask the server to resend one record by sequence number.
    pub const RESEND: u8 = 2;
}

/// A client request frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Opcode 1, argument 0.
    StreamAll,
    /// Opcode 2, argument is the sequence to resend.
    Resend(u8),
}

impl Request {
    /// Build a resend request for `sequence`.
    ///
    /// The argument is a single unsigned byte, so anything outside
    /// `0..=255` is rejected rather than truncated.
    ///
    /// # Example
    ///
    /// ```
    /// use seqfeed_client::protocol::Request;
    ///
    /// assert_eq!(Request::resend(2).unwrap().encode(), [2, 2]);
    /// assert!(Request::resend(300).is_err());
    /// ```
    pub fn resend(sequence: i32) -> Result<Self> {
        u8::try_from(sequence)
            .map(Request::Resend)
            .map_err(|_| FeedError::ResendOutOfRange(sequence))
    }

    /// Opcode byte.
    #[inline]
    pub fn opcode(&self) -> u8 {
        match self {
            Request::StreamAll => opcode::STREAM_ALL,
            Request::Resend(_) => opcode::RESEND,
        }
    }

    /// Argument byte.
    #[inline]
    pub fn arg(&self) -> u8 {
        match self {
            Request::StreamAll => 0,
            Request::Resend(seq) => *seq,
        }
    }

    /// Encode to the 2-byte wire form.
    pub fn encode(&self) -> [u8; REQUEST_SIZE] {
        [self.opcode(), self.arg()]
    }

    /// Decode a request frame.
    ///
    /// Returns `None` if the buffer is too short, an error on an unknown opcode.
    pub fn decode(buf: &[u8]) -> Result<Option<Self>> {
        if buf.len() < REQUEST_SIZE {
            return Ok(None);
        }
        match buf[0] {
            opcode::STREAM_ALL => Ok(Some(Request::StreamAll)),
            opcode::RESEND => Ok(Some(Request::Resend(buf[1]))),
            other => Err(FeedError::Protocol(format!("Unknown opcode {}", other))),
        }
    }
}
