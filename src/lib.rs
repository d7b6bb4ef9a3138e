//! # seqfeed-client
//!
//! Client for sequenced record feeds served over plain TCP.
//!
//! The server streams fixed-size 17-byte records, each carrying a
//! server-assigned sequence number. Some records never arrive, and the
//! connection may drop. This crate rebuilds the complete, ordered record set:
//!
//! - **Framing**: bytes are accumulated across reads and cut into records
//!   regardless of how TCP fragments them
//! - **Gap detection**: every sequence in `1..=max_seen` that has not arrived
//!   is requested again with a 2-byte resend frame
//! - **Reconnect**: on close with gaps, linear backoff and a bounded number
//!   of reconnects, replaying the outstanding resend requests
//!
//! ## Example
//!
//! ```ignore
//! use seqfeed_client::Client;
//!
//! #[tokio::main]
//! async fn main() {
//!     let records = Client::builder()
//!         .host("localhost")
//!         .port(3000)
//!         .build()
//!         .fetch()
//!         .await
//!         .unwrap();
//!
//!     println!("{} records", records.len());
//! }
//! ```

pub mod completion;
pub mod config;
pub mod error;
pub mod output;
pub mod protocol;
pub mod resend;
pub mod session;
pub mod tracker;
pub mod transport;

mod client;
mod writer;

pub use client::{Client, ClientBuilder};
pub use completion::Completion;
pub use config::ClientConfig;
pub use error::FeedError;
pub use output::{JsonFileSink, RecordSink, VecSink};
pub use protocol::Record;
pub use resend::ResendPlan;
pub use tracker::SequenceTracker;
