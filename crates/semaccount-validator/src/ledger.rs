//! Record of consumed nullifier hashes, keyed by `(scope, nullifier hash)`.
//!
//! Once marked, a pair stays marked forever. There is no unmark or expiry.

use parking_lot::RwLock;
use semaccount_types::{NullifierHash, ScopeId, SemaError, SemaResult, WORD_SIZE};
use sled::Tree;
use std::collections::HashSet;

use crate::storage::StoredNullifier;

pub trait NullifierLedger: Send + Sync {
    fn is_used(&self, scope: &ScopeId, nullifier: &NullifierHash) -> SemaResult<bool>;

    /// Fails with `NullifierAlreadyMarked` if the pair was already recorded.
    fn mark_used(&self, scope: &ScopeId, nullifier: &NullifierHash) -> SemaResult<()>;

    fn len(&self) -> SemaResult<u64>;
}

#[derive(Default)]
pub struct InMemoryNullifierLedger {
    used: RwLock<HashSet<(ScopeId, NullifierHash)>>,
}

impl InMemoryNullifierLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NullifierLedger for InMemoryNullifierLedger {
    fn is_used(&self, scope: &ScopeId, nullifier: &NullifierHash) -> SemaResult<bool> {
        Ok(self.used.read().contains(&(*scope, *nullifier)))
    }

    fn mark_used(&self, scope: &ScopeId, nullifier: &NullifierHash) -> SemaResult<()> {
        if self.used.write().insert((*scope, *nullifier)) {
            Ok(())
        } else {
            Err(SemaError::NullifierAlreadyMarked {
                scope: *scope,
                nullifier: *nullifier,
            })
        }
    }

    fn len(&self) -> SemaResult<u64> {
        Ok(self.used.read().len() as u64)
    }
}

/// Ledger persisted in the storage's `nullifiers` tree.
pub struct SledNullifierLedger {
    tree: Tree,
}

impl SledNullifierLedger {
    pub fn new(tree: Tree) -> Self {
        Self { tree }
    }

    fn key(scope: &ScopeId, nullifier: &NullifierHash) -> [u8; 2 * WORD_SIZE] {
        let mut key = [0u8; 2 * WORD_SIZE];
        key[..WORD_SIZE].copy_from_slice(scope.as_bytes());
        key[WORD_SIZE..].copy_from_slice(nullifier.as_bytes());
        key
    }
}

impl NullifierLedger for SledNullifierLedger {
    fn is_used(&self, scope: &ScopeId, nullifier: &NullifierHash) -> SemaResult<bool> {
        self.tree
            .contains_key(Self::key(scope, nullifier))
            .map_err(|e| SemaError::Storage(format!("Failed to read nullifier: {}", e)))
    }

    fn mark_used(&self, scope: &ScopeId, nullifier: &NullifierHash) -> SemaResult<()> {
        let record = StoredNullifier {
            marked_at: chrono::Utc::now().timestamp(),
        };
        let value = bincode::serialize(&record)
            .map_err(|e| SemaError::Storage(format!("Failed to serialize nullifier: {}", e)))?;

        self.tree
            .compare_and_swap(Self::key(scope, nullifier), None as Option<&[u8]>, Some(value))
            .map_err(|e| SemaError::Storage(format!("Failed to store nullifier: {}", e)))?
            .map_err(|_| SemaError::NullifierAlreadyMarked {
                scope: *scope,
                nullifier: *nullifier,
            })
    }

    fn len(&self) -> SemaResult<u64> {
        Ok(self.tree.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ValidatorStorage;

    fn exercise(ledger: &dyn NullifierLedger) {
        let scope = ScopeId::from_u64(2023);
        let other_scope = ScopeId::from_u64(2024);
        let nullifier = NullifierHash::from_bytes([7; 32]);

        assert!(!ledger.is_used(&scope, &nullifier).unwrap());
        ledger.mark_used(&scope, &nullifier).unwrap();
        assert!(ledger.is_used(&scope, &nullifier).unwrap());
        assert!(!ledger.is_used(&other_scope, &nullifier).unwrap());

        assert!(matches!(
            ledger.mark_used(&scope, &nullifier),
            Err(SemaError::NullifierAlreadyMarked { .. })
        ));
        assert!(ledger.is_used(&scope, &nullifier).unwrap());

        ledger.mark_used(&other_scope, &nullifier).unwrap();
        assert_eq!(ledger.len().unwrap(), 2);
    }

    #[test]
    fn test_in_memory_ledger() {
        exercise(&InMemoryNullifierLedger::new());
    }

    #[test]
    fn test_sled_ledger() {
        let storage = ValidatorStorage::in_memory().unwrap();
        exercise(&SledNullifierLedger::new(storage.nullifier_tree()));
    }

    #[test]
    fn test_sled_ledger_shares_tree() {
        let storage = ValidatorStorage::in_memory().unwrap();
        let first = SledNullifierLedger::new(storage.nullifier_tree());
        let second = SledNullifierLedger::new(storage.nullifier_tree());
        let scope = ScopeId::from_u64(1);
        let nullifier = NullifierHash::from_bytes([1; 32]);

        first.mark_used(&scope, &nullifier).unwrap();
        assert!(second.is_used(&scope, &nullifier).unwrap());
        assert!(second.mark_used(&scope, &nullifier).is_err());
    }
}
