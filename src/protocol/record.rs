//! Record struct decoded from a 17-byte frame.
//!
//! # Example
//!
//! ```
//! use seqfeed_client::protocol::Record;
//!
//! let record = Record::new("MSFT", 'B', 50, 100, 1);
//! let bytes = record.encode();
//! assert_eq!(Record::decode(&bytes), Some(record));
//! ```

use serde::{Deserialize, Serialize};

use super::wire_format::RECORD_SIZE;

const SYMBOL_LEN: usize = 4;

/// Byte to char, one to one (Latin-1).
#[inline]
fn byte_char(b: u8) -> char {
    char::from(b)
}

/// Char to byte; chars outside Latin-1 become `?`.
#[inline]
fn char_byte(c: char) -> u8 {
    u8::try_from(c).unwrap_or(b'?')
}

/// One record of the feed.
///
/// Serialized field names follow the feed's JSON output format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Ticker symbol, trailing padding trimmed.
    pub symbol: String,
    /// Buy/sell indicator (`B` or `S` in practice).
    #[serde(rename = "buysellindicator")]
    pub side: char,
    /// Order quantity.
    pub quantity: i32,
    /// Order price.
    pub price: i32,
    /// Server-assigned sequence number.
    #[serde(rename = "packetSequence")]
    pub sequence: i32,
}

impl Record {
    /// Create a new record.
    pub fn new(symbol: &str, side: char, quantity: i32, price: i32, sequence: i32) -> Self {
        Self {
            symbol: symbol.to_string(),
            side,
            quantity,
            price,
            sequence,
        }
    }

    /// Decode a record from the head of `buf`.
    ///
    /// Returns `None` if fewer than 17 bytes are available. Text bytes map
    /// one to one onto chars, so any byte value survives decoding.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < RECORD_SIZE {
            return None;
        }
        let symbol: String = buf[0..SYMBOL_LEN].iter().copied().map(byte_char).collect();
        Some(Self {
            symbol: symbol.trim().to_string(),
            side: byte_char(buf[4]),
            quantity: i32::from_be_bytes([buf[5], buf[6], buf[7], buf[8]]),
            price: i32::from_be_bytes([buf[9], buf[10], buf[11], buf[12]]),
            sequence: i32::from_be_bytes([buf[13], buf[14], buf[15], buf[16]]),
        })
    }

    /// Encode to the 17-byte wire form.
    ///
    /// The symbol is space-padded (or cut) to 4 bytes. Only the server
    /// side of the protocol needs this; the client uses it for mock feeds.
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [b' '; RECORD_SIZE];
        for (slot, c) in buf[..SYMBOL_LEN].iter_mut().zip(self.symbol.chars()) {
            *slot = char_byte(c);
        }
        buf[4] = char_byte(self.side);
        buf[5..9].copy_from_slice(&self.quantity.to_be_bytes());
        buf[9..13].copy_from_slice(&self.price.to_be_bytes());
        buf[13..17].copy_from_slice(&self.sequence.to_be_bytes());
        buf
    }
}
