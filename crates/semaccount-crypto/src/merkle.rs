//! Fixed-depth incremental Poseidon Merkle tree.
//!
//! Leaves are appended left to right. Every insertion rewrites the single path
//! from the new leaf to the root, so all stored nodes always describe the
//! current tree and both insertion and path queries are O(depth).

use ark_bn254::Fr;
use ark_ff::Zero;

use crate::poseidon::poseidon_hash2;

/// Authentication path for one leaf, bottom-up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerklePath {
    pub leaf_index: u64,
    pub siblings: Vec<Fr>,
    /// `true` where the running node is the right child at that level.
    pub path_indices: Vec<bool>,
}

impl MerklePath {
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    pub fn compute_root(&self, leaf: Fr) -> Fr {
        self.siblings
            .iter()
            .zip(self.path_indices.iter())
            .fold(leaf, |current, (sibling, is_right)| {
                if *is_right {
                    poseidon_hash2(*sibling, current)
                } else {
                    poseidon_hash2(current, *sibling)
                }
            })
    }

    pub fn verify(&self, leaf: Fr, root: Fr) -> bool {
        self.compute_root(leaf) == root
    }
}

pub struct IncrementalMerkleTree {
    depth: usize,
    zeros: Vec<Fr>,
    nodes: Vec<Vec<Fr>>,
}

impl IncrementalMerkleTree {
    /// Empty tree; leaf zero value is `0`, `zeros[i + 1] = H(zeros[i], zeros[i])`.
    pub fn new(depth: usize) -> Self {
        let mut zeros = Vec::with_capacity(depth + 1);
        let mut current = Fr::zero();
        zeros.push(current);
        for _ in 0..depth {
            current = poseidon_hash2(current, current);
            zeros.push(current);
        }

        Self {
            depth,
            zeros,
            nodes: vec![Vec::new(); depth + 1],
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    pub fn len(&self) -> usize {
        self.nodes[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[0].is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() as u64 >= self.capacity()
    }

    pub fn root(&self) -> Fr {
        self.nodes[self.depth]
            .first()
            .copied()
            .unwrap_or(self.zeros[self.depth])
    }

    pub fn leaf(&self, index: usize) -> Option<Fr> {
        self.nodes[0].get(index).copied()
    }

    /// Append a leaf, returning its index, or `None` when the tree is full.
    pub fn insert(&mut self, leaf: Fr) -> Option<usize> {
        if self.is_full() {
            return None;
        }

        let index = self.len();
        self.nodes[0].push(leaf);

        let mut idx = index;
        let mut current = leaf;
        for level in 0..self.depth {
            current = if idx % 2 == 0 {
                poseidon_hash2(current, self.zeros[level])
            } else {
                poseidon_hash2(self.nodes[level][idx - 1], current)
            };
            idx /= 2;

            let parents = &mut self.nodes[level + 1];
            if idx < parents.len() {
                parents[idx] = current;
            } else {
                parents.push(current);
            }
        }

        Some(index)
    }

    pub fn path(&self, index: usize) -> Option<MerklePath> {
        if index >= self.len() {
            return None;
        }

        let mut siblings = Vec::with_capacity(self.depth);
        let mut path_indices = Vec::with_capacity(self.depth);
        let mut idx = index;

        for level in 0..self.depth {
            let sibling = self.nodes[level]
                .get(idx ^ 1)
                .copied()
                .unwrap_or(self.zeros[level]);
            siblings.push(sibling);
            path_indices.push(idx % 2 == 1);
            idx /= 2;
        }

        Some(MerklePath {
            leaf_index: index as u64,
            siblings,
            path_indices,
        })
    }
}
