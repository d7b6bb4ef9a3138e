//! Sequence tracker - the set of received records and the highest sequence seen.
//!
//! Records are keyed by sequence number in a `BTreeMap`, so ordered output
//! and gap detection are both a single in-order walk of the keys.
//!
//! The missing set is never stored here: [`SequenceTracker::missing`]
//! derives it from the current state on every call.

use std::collections::BTreeMap;

use crate::protocol::Record;

/// Received records plus the running maximum sequence.
#[derive(Debug, Default)]
pub struct SequenceTracker {
    received: BTreeMap<i32, Record>,
    max_seen: i32,
}

impl SequenceTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a record by its sequence number.
    ///
    /// A later record with the same sequence replaces the earlier one.
    /// The maximum never decreases.
    pub fn insert(&mut self, record: Record) {
        self.max_seen = self.max_seen.max(record.sequence);
        self.received.insert(record.sequence, record);
    }

    /// Sequences in `1..=max_seen` that have not been received, ascending.
    ///
    /// Runs in O(received + missing).
    pub fn missing(&self) -> Vec<i32> {
        let mut missing = Vec::new();
        if self.max_seen < 1 {
            return missing;
        }
        let mut next = 1;
        for &seq in self.received.range(1..=self.max_seen).map(|(k, _)| k) {
            missing.extend(next..seq);
            next = seq + 1;
        }
        if next <= self.max_seen {
            missing.extend(next..=self.max_seen);
        }
        missing
    }

    /// True when no sequence in `1..=max_seen` is missing.
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// All records ascending by sequence number.
    pub fn ordered_records(&self) -> Vec<Record> {
        self.received.values().cloned().collect()
    }

    /// Highest sequence observed so far (0 before any record).
    #[inline]
    pub fn max_seen(&self) -> i32 {
        self.max_seen
    }

    /// Number of distinct sequences held.
    #[inline]
    pub fn len(&self) -> usize {
        self.received.len()
    }

    /// True before any record has arrived.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.received.is_empty()
    }

    /// Look up a record by sequence.
    pub fn get(&self, sequence: i32) -> Option<&Record> {
        self.received.get(&sequence)
    }
}
