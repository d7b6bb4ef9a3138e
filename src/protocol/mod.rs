//! Protocol module - wire format, record codec, and framing.
//!
//! This module implements the binary feed protocol:
//! - 2-byte request encoding (stream-all, resend)
//! - 17-byte record decoding
//! - Record buffer for accumulating partial reads

mod frame_buffer;
mod record;
mod wire_format;

pub use frame_buffer::{Decoded, RecordBuffer};
pub use record::Record;
pub use wire_format::{opcode, Request, MAX_RESEND_SEQUENCE, RECORD_SIZE, REQUEST_SIZE};
