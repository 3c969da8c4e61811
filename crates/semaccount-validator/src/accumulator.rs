//! Per-scope commitment accumulator with a bounded root history.

use semaccount_crypto::{fr_from_word, fr_to_word, IncrementalMerkleTree, MerklePath};
use semaccount_types::{check_depth, Commitment, Root, ScopeId, SemaError, SemaResult};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Roots retained per scope, current root included.
pub const DEFAULT_ROOT_HISTORY_SIZE: usize = 30;

pub struct CommitmentAccumulator {
    scope: ScopeId,
    tree: IncrementalMerkleTree,
    members: Vec<Commitment>,
    index: HashMap<Commitment, u64>,
    roots: VecDeque<Root>,
    history_size: usize,
}

impl CommitmentAccumulator {
    pub fn new(scope: ScopeId, depth: usize, history_size: usize) -> SemaResult<Self> {
        check_depth(depth)?;
        if history_size == 0 {
            return Err(SemaError::Config("root history size must be at least 1".into()));
        }

        Ok(Self {
            scope,
            tree: IncrementalMerkleTree::new(depth),
            members: Vec::new(),
            index: HashMap::new(),
            roots: VecDeque::with_capacity(history_size),
            history_size,
        })
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn depth(&self) -> usize {
        self.tree.depth()
    }

    pub fn capacity(&self) -> u64 {
        self.tree.capacity()
    }

    pub fn len(&self) -> u64 {
        self.members.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Checks everything `insert` checks, without mutating.
    pub fn check_insertable(&self, commitment: &Commitment) -> SemaResult<()> {
        if commitment.is_zero() || fr_from_word(commitment.as_bytes()).is_none() {
            return Err(SemaError::InvalidCommitment(*commitment));
        }

        if self.index.contains_key(commitment) {
            return Err(SemaError::DuplicateMember {
                scope: self.scope,
                commitment: *commitment,
            });
        }

        if self.tree.is_full() {
            return Err(SemaError::CapacityExceeded {
                scope: self.scope,
                capacity: self.capacity(),
            });
        }

        Ok(())
    }

    /// Append a member and return the new root.
    pub fn insert(&mut self, commitment: Commitment) -> SemaResult<Root> {
        self.check_insertable(&commitment)?;

        let leaf = fr_from_word(commitment.as_bytes())
            .ok_or(SemaError::InvalidCommitment(commitment))?;
        let leaf_index = self.tree.insert(leaf).ok_or(SemaError::CapacityExceeded {
            scope: self.scope,
            capacity: self.capacity(),
        })? as u64;

        self.members.push(commitment);
        self.index.insert(commitment, leaf_index);

        let root = Root::from_bytes(fr_to_word(&self.tree.root()));
        if self.roots.len() == self.history_size {
            self.roots.pop_front();
        }
        self.roots.push_back(root);

        debug!(
            "Scope {}: member {} at leaf {}, root {}",
            self.scope, commitment, leaf_index, root
        );
        Ok(root)
    }

    /// Current root; the empty-tree root when no member was ever inserted.
    pub fn current_root(&self) -> Root {
        self.roots
            .back()
            .copied()
            .unwrap_or_else(|| Root::from_bytes(fr_to_word(&self.tree.root())))
    }

    /// True for the current root and the roots that immediately preceded it,
    /// up to the history size. The empty-tree root is never known.
    pub fn is_known_root(&self, root: &Root) -> bool {
        self.roots.iter().rev().any(|known| known == root)
    }

    pub fn known_roots(&self) -> impl Iterator<Item = &Root> {
        self.roots.iter().rev()
    }

    pub fn index_of(&self, commitment: &Commitment) -> Option<u64> {
        self.index.get(commitment).copied()
    }

    pub fn member_at(&self, leaf_index: u64) -> Option<Commitment> {
        self.members.get(usize::try_from(leaf_index).ok()?).copied()
    }

    /// Path from `leaf_index` to the current root.
    pub fn membership_path(&self, leaf_index: u64) -> Option<MerklePath> {
        self.tree.path(usize::try_from(leaf_index).ok()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semaccount_crypto::{Fr, Identity};

    fn commitment(seed: &str) -> Commitment {
        Identity::from_seed(seed.as_bytes()).commitment()
    }

    fn accumulator(depth: usize, history: usize) -> CommitmentAccumulator {
        CommitmentAccumulator::new(ScopeId::from_u64(2023), depth, history).unwrap()
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(matches!(
            CommitmentAccumulator::new(ScopeId::from_u64(1), 0, 30),
            Err(SemaError::InvalidDepth(0))
        ));
        assert!(matches!(
            CommitmentAccumulator::new(ScopeId::from_u64(1), 33, 30),
            Err(SemaError::InvalidDepth(33))
        ));
        assert!(CommitmentAccumulator::new(ScopeId::from_u64(1), 20, 0).is_err());
    }

    #[test]
    fn test_current_root_known_after_every_insert() {
        let mut acc = accumulator(4, 30);
        let empty_root = acc.current_root();
        assert!(!acc.is_known_root(&empty_root));

        for i in 0..10 {
            let root = acc.insert(commitment(&format!("member-{}", i))).unwrap();
            assert_eq!(acc.current_root(), root);
            assert!(acc.is_known_root(&root));
        }
        assert_eq!(acc.len(), 10);
    }

    #[test]
    fn test_history_ages_out() {
        let mut acc = accumulator(4, 3);
        let mut roots = Vec::new();
        for i in 0..5 {
            roots.push(acc.insert(commitment(&format!("m{}", i))).unwrap());
        }

        assert!(!acc.is_known_root(&roots[0]));
        assert!(!acc.is_known_root(&roots[1]));
        assert!(acc.is_known_root(&roots[2]));
        assert!(acc.is_known_root(&roots[4]));
        assert_eq!(acc.known_roots().next(), Some(&roots[4]));
        assert_eq!(acc.known_roots().count(), 3);
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut acc = accumulator(1, 30);
        acc.insert(commitment("a")).unwrap();
        acc.insert(commitment("b")).unwrap();

        assert!(matches!(
            acc.insert(commitment("c")),
            Err(SemaError::CapacityExceeded { capacity: 2, .. })
        ));
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn test_invalid_and_duplicate_commitments() {
        let mut acc = accumulator(3, 30);

        assert!(matches!(
            acc.insert(Commitment::default()),
            Err(SemaError::InvalidCommitment(_))
        ));
        assert!(matches!(
            acc.insert(Commitment::from_bytes([0xff; 32])),
            Err(SemaError::InvalidCommitment(_))
        ));

        let c = commitment("dup");
        let root = acc.insert(c).unwrap();
        assert!(matches!(acc.insert(c), Err(SemaError::DuplicateMember { .. })));
        assert_eq!(acc.current_root(), root);
        assert_eq!(acc.len(), 1);
    }

    #[test]
    fn test_paths_stay_valid_for_existing_members() {
        let mut acc = accumulator(3, 30);
        let first = commitment("first");
        acc.insert(first).unwrap();
        acc.insert(commitment("second")).unwrap();
        acc.insert(commitment("third")).unwrap();

        let index = acc.index_of(&first).unwrap();
        assert_eq!(index, 0);
        assert_eq!(acc.member_at(index), Some(first));

        let path = acc.membership_path(index).unwrap();
        let leaf: Fr = fr_from_word(first.as_bytes()).unwrap();
        assert_eq!(Root::from_bytes(fr_to_word(&path.compute_root(leaf))), acc.current_root());
        assert!(acc.membership_path(3).is_none());
    }
}
