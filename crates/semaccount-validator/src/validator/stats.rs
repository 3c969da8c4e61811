use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{RejectReason, ValidationOutcome};

#[derive(Default)]
pub struct ValidatorStats {
    accepted: AtomicU64,
    unknown_root: AtomicU64,
    invalid_proof: AtomicU64,
    nullifier_reused: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub accepted: u64,
    pub rejected_unknown_root: u64,
    pub rejected_invalid_proof: u64,
    pub rejected_nullifier_reused: u64,
}

impl StatsSnapshot {
    pub fn total(&self) -> u64 {
        self.accepted + self.rejected()
    }

    pub fn rejected(&self) -> u64 {
        self.rejected_unknown_root + self.rejected_invalid_proof + self.rejected_nullifier_reused
    }
}

impl ValidatorStats {
    pub fn record(&self, outcome: &ValidationOutcome) {
        let counter = match outcome {
            ValidationOutcome::Accepted => &self.accepted,
            ValidationOutcome::Rejected(RejectReason::UnknownRoot) => &self.unknown_root,
            ValidationOutcome::Rejected(RejectReason::InvalidProof) => &self.invalid_proof,
            ValidationOutcome::Rejected(RejectReason::NullifierReused) => &self.nullifier_reused,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected_unknown_root: self.unknown_root.load(Ordering::Relaxed),
            rejected_invalid_proof: self.invalid_proof.load(Ordering::Relaxed),
            rejected_nullifier_reused: self.nullifier_reused.load(Ordering::Relaxed),
        }
    }
}
