//! Resend requester - turns a missing-sequence snapshot into request frames.
//!
//! One resend frame per missing sequence, ascending. No deduplication across
//! rounds: asking twice for the same record is harmless since the tracker's
//! insert is idempotent.

use crate::protocol::{Request, MAX_RESEND_SEQUENCE};

/// Requests for one resend round.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResendPlan {
    /// Encodable requests, ascending by sequence.
    pub requests: Vec<Request>,
    /// Sequences the single-byte argument cannot carry.
    pub unrepresentable: Vec<i32>,
}

impl ResendPlan {
    /// Build a plan from a missing-sequence snapshot.
    pub fn from_snapshot(snapshot: &[i32]) -> Self {
        let mut sorted = snapshot.to_vec();
        sorted.sort_unstable();

        let mut plan = Self::default();
        for seq in sorted {
            match Request::resend(seq) {
                Ok(req) => plan.requests.push(req),
                Err(_) => plan.unrepresentable.push(seq),
            }
        }

        if !plan.unrepresentable.is_empty() {
            tracing::warn!(
                unrepresentable = ?plan.unrepresentable,
                max = MAX_RESEND_SEQUENCE,
                "sequences outside the resend range cannot be re-requested"
            );
        }
        plan
    }

    /// True when the round has nothing to send.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
