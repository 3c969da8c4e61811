use thiserror::Error;

use crate::word::{Commitment, NullifierHash, ScopeId};

#[derive(Error, Debug)]
pub enum SemaError {
    #[error("Scope {scope} is full: capacity {capacity} members")]
    CapacityExceeded { scope: ScopeId, capacity: u64 },

    #[error("Unknown scope: {0}")]
    UnknownScope(ScopeId),

    #[error("Scope already exists: {0}")]
    ScopeExists(ScopeId),

    #[error("Invalid tree depth {0}: must be between 1 and 32")]
    InvalidDepth(usize),

    #[error("Invalid commitment {0}: must be a non-zero field element")]
    InvalidCommitment(Commitment),

    #[error("Commitment {commitment} already registered in scope {scope}")]
    DuplicateMember { scope: ScopeId, commitment: Commitment },

    #[error("Nullifier {nullifier} already marked in scope {scope}")]
    NullifierAlreadyMarked { scope: ScopeId, nullifier: NullifierHash },

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type SemaResult<T> = Result<T, SemaError>;
