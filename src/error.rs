//! Error types for seqfeed-client.

use thiserror::Error;

/// Main error type for all feed operations.
#[derive(Debug, Error)]
pub enum FeedError {
    /// I/O error on the TCP transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (output only).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Protocol error (malformed frame, bad opcode, etc.).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Sequence number does not fit the single-byte resend argument.
    #[error("Sequence {0} cannot be encoded in a resend request (0..=255)")]
    ResendOutOfRange(i32),

    /// Transport went away while a request was queued.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Retry budget spent with sequences still missing.
    #[error("Max retry attempts reached ({attempts}), still missing {missing:?}")]
    RetriesExhausted { attempts: u32, missing: Vec<i32> },

    /// A partial frame sat in the accumulator past the stall timeout.
    #[error("Stalled frame: {buffered} bytes pending")]
    StalledFrame { buffered: usize },
}

/// Result type alias using FeedError.
pub type Result<T> = std::result::Result<T, FeedError>;
