//! Explicit per-scope state store shared by group management and validation.
//!
//! Each scope's accumulator sits behind its own async mutex. Insertions,
//! root checks and the nullifier check-then-mark all take that lock, so they
//! are linearized per scope while different scopes proceed independently.

use semaccount_crypto::MerklePath;
use semaccount_types::{
    check_depth, Commitment, NullifierHash, Root, ScopeId, SemaError, SemaResult,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::accumulator::{CommitmentAccumulator, DEFAULT_ROOT_HISTORY_SIZE};
use crate::ledger::{InMemoryNullifierLedger, NullifierLedger, SledNullifierLedger};
use crate::storage::{StoredScope, ValidatorStorage};

type ScopeHandle = Arc<Mutex<CommitmentAccumulator>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemberInsertion {
    pub leaf_index: u64,
    pub root: Root,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScopeInfo {
    pub scope: ScopeId,
    pub depth: usize,
    pub members: u64,
    pub capacity: u64,
    pub current_root: Root,
    pub known_roots: Vec<Root>,
}

pub struct ScopeRegistry {
    scopes: RwLock<HashMap<ScopeId, ScopeHandle>>,
    ledger: Arc<dyn NullifierLedger>,
    storage: Option<ValidatorStorage>,
    root_history_size: usize,
}

impl ScopeRegistry {
    /// Volatile registry with an in-memory ledger.
    pub fn new(root_history_size: usize) -> Self {
        Self::with_ledger(root_history_size, Arc::new(InMemoryNullifierLedger::new()))
    }

    pub fn with_ledger(root_history_size: usize, ledger: Arc<dyn NullifierLedger>) -> Self {
        Self {
            scopes: RwLock::new(HashMap::new()),
            ledger,
            storage: None,
            root_history_size,
        }
    }

    /// Registry backed by `storage`: scopes are rebuilt by replaying their
    /// stored members in leaf order and the ledger is the persistent one.
    pub fn open(storage: ValidatorStorage, root_history_size: usize) -> SemaResult<Self> {
        let mut scopes = HashMap::new();

        for record in storage.load_scopes()? {
            let mut accumulator =
                CommitmentAccumulator::new(record.scope, record.depth, root_history_size)?;
            for commitment in storage.load_members(&record.scope)? {
                accumulator.insert(commitment)?;
            }
            info!(
                "Restored scope {} (depth {}, {} members)",
                record.scope,
                record.depth,
                accumulator.len()
            );
            scopes.insert(record.scope, Arc::new(Mutex::new(accumulator)));
        }

        Ok(Self {
            scopes: RwLock::new(scopes),
            ledger: Arc::new(SledNullifierLedger::new(storage.nullifier_tree())),
            storage: Some(storage),
            root_history_size,
        })
    }

    pub fn root_history_size(&self) -> usize {
        self.root_history_size
    }

    async fn handle(&self, scope: &ScopeId) -> Option<ScopeHandle> {
        self.scopes.read().await.get(scope).cloned()
    }

    async fn require(&self, scope: &ScopeId) -> SemaResult<ScopeHandle> {
        self.handle(scope).await.ok_or(SemaError::UnknownScope(*scope))
    }

    pub async fn create_scope(&self, scope: ScopeId, depth: usize) -> SemaResult<()> {
        check_depth(depth)?;
        let mut scopes = self.scopes.write().await;
        if scopes.contains_key(&scope) {
            return Err(SemaError::ScopeExists(scope));
        }

        let accumulator = CommitmentAccumulator::new(scope, depth, self.root_history_size)?;
        if let Some(storage) = &self.storage {
            storage.store_scope(&StoredScope {
                scope,
                depth,
                created_at: chrono::Utc::now().timestamp(),
            })?;
        }

        scopes.insert(scope, Arc::new(Mutex::new(accumulator)));
        info!("Created scope {} with depth {}", scope, depth);
        Ok(())
    }

    pub async fn insert_member(
        &self,
        scope: &ScopeId,
        commitment: Commitment,
    ) -> SemaResult<MemberInsertion> {
        let handle = self.require(scope).await?;
        let mut accumulator = handle.lock().await;

        accumulator.check_insertable(&commitment)?;
        let leaf_index = accumulator.len();
        if let Some(storage) = &self.storage {
            storage.store_member(scope, leaf_index, &commitment)?;
        }
        let root = accumulator.insert(commitment)?;

        info!("Scope {}: inserted member at leaf {}", scope, leaf_index);
        Ok(MemberInsertion { leaf_index, root })
    }

    pub async fn current_root(&self, scope: &ScopeId) -> SemaResult<Root> {
        let handle = self.require(scope).await?;
        let accumulator = handle.lock().await;
        Ok(accumulator.current_root())
    }

    /// Unknown scopes know no roots.
    pub async fn is_known_root(&self, scope: &ScopeId, root: &Root) -> bool {
        match self.handle(scope).await {
            Some(handle) => handle.lock().await.is_known_root(root),
            None => false,
        }
    }

    /// Scope depth if `root` is currently known for `scope`.
    pub async fn known_root_depth(&self, scope: &ScopeId, root: &Root) -> Option<usize> {
        let handle = self.handle(scope).await?;
        let accumulator = handle.lock().await;
        accumulator.is_known_root(root).then(|| accumulator.depth())
    }

    pub async fn scope_depth(&self, scope: &ScopeId) -> SemaResult<usize> {
        let handle = self.require(scope).await?;
        let depth = handle.lock().await.depth();
        Ok(depth)
    }

    /// Path for `commitment` against the current root, `None` if it is not a member.
    pub async fn membership_path(
        &self,
        scope: &ScopeId,
        commitment: &Commitment,
    ) -> SemaResult<Option<MerklePath>> {
        let handle = self.require(scope).await?;
        let accumulator = handle.lock().await;
        Ok(accumulator
            .index_of(commitment)
            .and_then(|index| accumulator.membership_path(index)))
    }

    pub async fn is_nullifier_used(
        &self,
        scope: &ScopeId,
        nullifier: &NullifierHash,
    ) -> SemaResult<bool> {
        self.ledger.is_used(scope, nullifier)
    }

    /// Atomically check and mark `nullifier` for `scope`.
    ///
    /// Returns `false` when it was already used. The scope lock is held for
    /// the whole check-then-mark, so among concurrent callers with the same
    /// pair exactly one gets `true`.
    pub async fn consume_nullifier(
        &self,
        scope: &ScopeId,
        nullifier: &NullifierHash,
    ) -> SemaResult<bool> {
        let handle = self.require(scope).await?;
        let _guard = handle.lock().await;

        if self.ledger.is_used(scope, nullifier)? {
            warn!("Scope {}: nullifier {} reused", scope, nullifier);
            return Ok(false);
        }
        self.ledger.mark_used(scope, nullifier)?;
        Ok(true)
    }

    pub async fn scope_info(&self, scope: &ScopeId) -> SemaResult<ScopeInfo> {
        let handle = self.require(scope).await?;
        let accumulator = handle.lock().await;
        Ok(ScopeInfo {
            scope: *scope,
            depth: accumulator.depth(),
            members: accumulator.len(),
            capacity: accumulator.capacity(),
            current_root: accumulator.current_root(),
            known_roots: accumulator.known_roots().copied().collect(),
        })
    }

    pub async fn scopes(&self) -> Vec<ScopeId> {
        let mut scopes: Vec<ScopeId> = self.scopes.read().await.keys().copied().collect();
        scopes.sort();
        scopes
    }

    pub fn nullifiers_used(&self) -> SemaResult<u64> {
        self.ledger.len()
    }

    pub fn flush(&self) -> SemaResult<()> {
        match &self.storage {
            Some(storage) => storage.flush(),
            None => Ok(()),
        }
    }
}

impl Default for ScopeRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_HISTORY_SIZE)
    }
}
