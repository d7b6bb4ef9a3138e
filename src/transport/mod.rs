//! Transport module - TCP connection and its event stream.
//!
//! Every open connection is split into a reader task and a writer task.
//! Both report into a single per-connection channel of [`TransportEvent`]s,
//! which the connection manager drains one event at a time.

mod tcp;

pub use tcp::{connect, Connection};

use bytes::Bytes;

use crate::error::FeedError;

/// Events produced by an open transport.
#[derive(Debug)]
pub enum TransportEvent {
    /// A chunk of bytes, with arbitrary boundaries.
    Data(Bytes),
    /// Read or write failure.
    Error(FeedError),
    /// Peer closed the connection.
    Closed,
}
