#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod error;
pub mod operation;
pub mod word;

pub use alloy_primitives::{Address, Bytes, U256};
pub use error::{SemaError, SemaResult};
pub use operation::{DomainContext, UserOperation};
pub use word::{Commitment, NullifierHash, OperationHash, Root, ScopeId, SignalHash, WORD_SIZE};

/// Smallest supported accumulator depth.
pub const MIN_TREE_DEPTH: usize = 1;

/// Largest supported accumulator depth (2^32 members).
pub const MAX_TREE_DEPTH: usize = 32;

/// Depth used by the reference deployment.
pub const DEFAULT_TREE_DEPTH: usize = 20;

/// ERC-4337 `validationData` for a successful validation.
pub const SIG_VALIDATION_SUCCESS: u64 = 0;

/// ERC-4337 `validationData` for a failed signature check.
pub const SIG_VALIDATION_FAILED: u64 = 1;

pub fn check_depth(depth: usize) -> SemaResult<usize> {
    if (MIN_TREE_DEPTH..=MAX_TREE_DEPTH).contains(&depth) {
        Ok(depth)
    } else {
        Err(SemaError::InvalidDepth(depth))
    }
}
