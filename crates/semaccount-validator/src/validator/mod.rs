//! Validation entry point.
//!
//! ```text
//! Received -> RootChecked -> ProofChecked -> NullifierChecked -> Accepted
//!     |            |              |                 |
//!     +------------+--------------+-----------------+----> Rejected(reason)
//! ```
//!
//! The operation hash is always recomputed here from the operation and the
//! domain; the signal claimed inside the proof envelope is never trusted.
//! Rejections never modify state: the only write is the nullifier mark on
//! the accepting path.

mod stats;

pub use stats::{StatsSnapshot, ValidatorStats};

use semaccount_crypto::{ProofEnvelope, ProofVerifier};
use semaccount_types::{
    DomainContext, OperationHash, ScopeId, SemaError, SemaResult, SignalHash, UserOperation,
    SIG_VALIDATION_FAILED, SIG_VALIDATION_SUCCESS,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::operation_hash::{operation_signal, user_operation_hash};
use crate::registry::ScopeRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    UnknownRoot,
    InvalidProof,
    NullifierReused,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRoot => write!(f, "unknown root"),
            Self::InvalidProof => write!(f, "invalid proof"),
            Self::NullifierReused => write!(f, "nullifier reused"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ValidationOutcome {
    Accepted,
    Rejected(RejectReason),
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Self::Accepted => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }

    /// ERC-4337 `validationData`: no time range, so just success or failure.
    pub fn validation_data(&self) -> u64 {
        match self {
            Self::Accepted => SIG_VALIDATION_SUCCESS,
            Self::Rejected(_) => SIG_VALIDATION_FAILED,
        }
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected(reason) => write!(f, "rejected ({})", reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationState {
    Received,
    RootChecked,
    ProofChecked,
    NullifierChecked,
    Accepted,
    Rejected(RejectReason),
}

impl ValidationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected(_))
    }
}

/// States one validation passed through, in order.
#[derive(Debug, Clone)]
pub struct ValidationTrace {
    pub operation_hash: OperationHash,
    pub states: Vec<ValidationState>,
}

impl ValidationTrace {
    fn new(operation_hash: OperationHash) -> Self {
        Self {
            operation_hash,
            states: vec![ValidationState::Received],
        }
    }

    fn advance(&mut self, next: ValidationState) {
        debug!(
            "Operation {}: {:?} -> {:?}",
            self.operation_hash,
            self.state(),
            next
        );
        self.states.push(next);
    }

    fn reject(&mut self, reason: RejectReason) -> ValidationOutcome {
        self.advance(ValidationState::Rejected(reason));
        ValidationOutcome::Rejected(reason)
    }

    pub fn state(&self) -> ValidationState {
        self.states
            .last()
            .copied()
            .unwrap_or(ValidationState::Received)
    }

    pub fn outcome(&self) -> Option<ValidationOutcome> {
        match self.state() {
            ValidationState::Accepted => Some(ValidationOutcome::Accepted),
            ValidationState::Rejected(reason) => Some(ValidationOutcome::Rejected(reason)),
            _ => None,
        }
    }
}

pub struct Validator {
    registry: Arc<ScopeRegistry>,
    verifier: Arc<dyn ProofVerifier>,
    stats: ValidatorStats,
}

impl Validator {
    pub fn new(registry: Arc<ScopeRegistry>, verifier: Arc<dyn ProofVerifier>) -> Self {
        Self {
            registry,
            verifier,
            stats: ValidatorStats::default(),
        }
    }

    pub fn registry(&self) -> &Arc<ScopeRegistry> {
        &self.registry
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub async fn validate(
        &self,
        op: &UserOperation,
        envelope: &ProofEnvelope,
        domain: &DomainContext,
    ) -> SemaResult<ValidationOutcome> {
        let trace = self.validate_traced(op, envelope, domain).await?;
        trace
            .outcome()
            .ok_or_else(|| SemaError::Internal("validation ended in a non-terminal state".into()))
    }

    pub async fn validate_traced(
        &self,
        op: &UserOperation,
        envelope: &ProofEnvelope,
        domain: &DomainContext,
    ) -> SemaResult<ValidationTrace> {
        let operation_hash = user_operation_hash(op, domain);
        let signal = operation_signal(op, domain);
        let mut trace = ValidationTrace::new(operation_hash);

        let outcome = self.run(&mut trace, envelope, signal).await?;
        self.stats.record(&outcome);
        info!(
            "Operation {} from {} in scope {}: {}",
            operation_hash, op.sender, envelope.scope, outcome
        );
        Ok(trace)
    }

    async fn run(
        &self,
        trace: &mut ValidationTrace,
        envelope: &ProofEnvelope,
        signal: SignalHash,
    ) -> SemaResult<ValidationOutcome> {
        let scope = envelope.scope;

        let Some(depth) = self.registry.known_root_depth(&scope, &envelope.root).await else {
            return Ok(trace.reject(RejectReason::UnknownRoot));
        };
        trace.advance(ValidationState::RootChecked);

        if !self.verify(envelope, signal, depth).await? {
            return Ok(trace.reject(RejectReason::InvalidProof));
        }
        trace.advance(ValidationState::ProofChecked);

        if !self
            .registry
            .consume_nullifier(&scope, &envelope.nullifier_hash)
            .await?
        {
            return Ok(trace.reject(RejectReason::NullifierReused));
        }
        trace.advance(ValidationState::NullifierChecked);
        trace.advance(ValidationState::Accepted);

        Ok(ValidationOutcome::Accepted)
    }

    /// Runs on the blocking pool, outside every lock.
    async fn verify(
        &self,
        envelope: &ProofEnvelope,
        signal: SignalHash,
        scope_depth: usize,
    ) -> SemaResult<bool> {
        if envelope.depth != scope_depth {
            debug!(
                "Proof declares depth {}, scope {} has depth {}",
                envelope.depth, envelope.scope, scope_depth
            );
            return Ok(false);
        }

        let verifier = self.verifier.clone();
        let proof = envelope.proof;
        let inputs = envelope.public_inputs(signal);

        tokio::task::spawn_blocking(move || verifier.verify(&proof, &inputs))
            .await
            .map_err(|e| SemaError::Internal(format!("Verification task failed: {}", e)))
    }

    /// Decode the proof envelope from `op.signature` and validate.
    ///
    /// A signature that does not decode is an invalid proof, not an error.
    pub async fn validate_user_op(
        &self,
        op: &UserOperation,
        domain: &DomainContext,
    ) -> SemaResult<ValidationOutcome> {
        match ProofEnvelope::from_abi_bytes(&op.signature) {
            Ok(envelope) => self.validate(op, &envelope, domain).await,
            Err(e) => Ok(self.reject_undecodable(op, domain, e)),
        }
    }

    /// Compact signature (`uint256[8] proof, uint256 nullifierHash`) for an
    /// account bound to `scope`; depth and root come from the scope itself.
    pub async fn validate_compact_user_op(
        &self,
        op: &UserOperation,
        scope: &ScopeId,
        domain: &DomainContext,
    ) -> SemaResult<ValidationOutcome> {
        let (depth, root) = match (
            self.registry.scope_depth(scope).await,
            self.registry.current_root(scope).await,
        ) {
            (Ok(depth), Ok(root)) => (depth, root),
            _ => {
                self.stats.record(&ValidationOutcome::Rejected(RejectReason::UnknownRoot));
                return Ok(ValidationOutcome::Rejected(RejectReason::UnknownRoot));
            }
        };

        match ProofEnvelope::from_compact(&op.signature, depth, root, *scope) {
            Ok(envelope) => self.validate(op, &envelope, domain).await,
            Err(e) => Ok(self.reject_undecodable(op, domain, e)),
        }
    }

    fn reject_undecodable(
        &self,
        op: &UserOperation,
        domain: &DomainContext,
        error: SemaError,
    ) -> ValidationOutcome {
        let outcome = ValidationOutcome::Rejected(RejectReason::InvalidProof);
        debug!(
            "Operation {}: signature does not decode: {}",
            user_operation_hash(op, domain),
            error
        );
        self.stats.record(&outcome);
        outcome
    }
}

#[cfg(test)]
mod tests;
