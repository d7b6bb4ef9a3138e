//! Completion detector.
//!
//! Run after every quiescence hint. Either the stream is complete and the
//! ordered record list is ready, or a resend round is due.

use crate::protocol::Record;
use crate::resend::ResendPlan;
use crate::tracker::SequenceTracker;

/// Outcome of a completion check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Nothing missing; records ascending by sequence.
    Complete(Vec<Record>),
    /// Gaps remain; the snapshot and the resend round built from it.
    Incomplete { missing: Vec<i32>, plan: ResendPlan },
}

/// Evaluate the tracker's current state.
pub fn evaluate(tracker: &SequenceTracker) -> Completion {
    let missing = tracker.missing();
    if missing.is_empty() {
        return Completion::Complete(tracker.ordered_records());
    }
    tracing::info!(missing = ?missing, "requesting missing records");
    let plan = ResendPlan::from_snapshot(&missing);
    if plan.is_empty() {
        // Nothing to ask for: only the stream itself or a close can move on.
        tracing::warn!(
            missing = ?missing,
            "no resend request can cover the remaining gap; waiting on the transport"
        );
    }
    Completion::Incomplete { missing, plan }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Request;

    #[test]
    fn test_complete_is_ordered() {
        let mut tracker = SequenceTracker::new();
        for seq in [3, 1, 2] {
            tracker.insert(Record::new("X", 'B', 1, 1, seq));
        }

        match evaluate(&tracker) {
            Completion::Complete(records) => {
                let seqs: Vec<i32> = records.iter().map(|r| r.sequence).collect();
                assert_eq!(seqs, vec![1, 2, 3]);
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_gap_yields_resend_round() {
        let mut tracker = SequenceTracker::new();
        tracker.insert(Record::new("X", 'B', 1, 1, 1));
        tracker.insert(Record::new("X", 'B', 1, 1, 3));

        match evaluate(&tracker) {
            Completion::Incomplete { missing, plan } => {
                assert_eq!(missing, vec![2]);
                assert_eq!(plan.requests, vec![Request::Resend(2)]);
            }
            other => panic!("expected gap, got {:?}", other),
        }
    }

    #[test]
    fn test_gap_above_resend_range_yields_empty_round() {
        let mut tracker = SequenceTracker::new();
        for seq in (1..=255).chain([257]) {
            tracker.insert(Record::new("X", 'B', 1, 1, seq));
        }

        match evaluate(&tracker) {
            Completion::Incomplete { missing, plan } => {
                assert_eq!(missing, vec![256]);
                assert!(plan.is_empty());
                assert_eq!(plan.unrepresentable, vec![256]);
            }
            other => panic!("expected gap, got {:?}", other),
        }
    }
}
