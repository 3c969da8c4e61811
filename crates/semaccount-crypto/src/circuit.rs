//! Semaphore-shaped membership circuit.
//!
//! Public inputs, in allocation order:
//! `[root, nullifier_hash, signal_hash, external_nullifier]`.
//!
//! Private witnesses: identity nullifier, identity trapdoor, Merkle siblings
//! and path direction bits.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::constraints::CryptographicSpongeVar;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_r1cs_std::{
    alloc::AllocVar, boolean::Boolean, eq::EqGadget, fields::fp::FpVar,
    select::CondSelectGadget,
};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::identity::{scope_field, Identity};
use crate::merkle::MerklePath;
use crate::poseidon::canonical_config;
use semaccount_types::ScopeId;

pub const NUM_PUBLIC_INPUTS: usize = 4;

#[derive(Clone)]
pub struct MembershipCircuit {
    identity_nullifier: Option<Fr>,
    identity_trapdoor: Option<Fr>,
    path_elements: Vec<Option<Fr>>,
    path_indices: Vec<Option<bool>>,
    root: Option<Fr>,
    nullifier_hash: Option<Fr>,
    signal_hash: Option<Fr>,
    external_nullifier: Option<Fr>,
}

impl MembershipCircuit {
    pub fn new(
        identity: &Identity,
        path: &MerklePath,
        scope: &ScopeId,
        signal_hash: Fr,
    ) -> Self {
        let root = path.compute_root(identity.commitment_fr());

        Self {
            identity_nullifier: Some(identity.nullifier_fr()),
            identity_trapdoor: Some(identity.trapdoor_fr()),
            path_elements: path.siblings.iter().copied().map(Some).collect(),
            path_indices: path.path_indices.iter().copied().map(Some).collect(),
            root: Some(root),
            nullifier_hash: Some(identity.nullifier_hash_fr(scope)),
            signal_hash: Some(signal_hash),
            external_nullifier: Some(scope_field(scope)),
        }
    }

    /// Shape-only instance for key generation.
    pub fn empty(depth: usize) -> Self {
        Self {
            identity_nullifier: None,
            identity_trapdoor: None,
            path_elements: vec![None; depth],
            path_indices: vec![None; depth],
            root: None,
            nullifier_hash: None,
            signal_hash: None,
            external_nullifier: None,
        }
    }

    pub fn depth(&self) -> usize {
        self.path_elements.len()
    }

    pub fn public_inputs(&self) -> Option<Vec<Fr>> {
        Some(vec![
            self.root?,
            self.nullifier_hash?,
            self.signal_hash?,
            self.external_nullifier?,
        ])
    }
}

impl ConstraintSynthesizer<Fr> for MembershipCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let root = FpVar::new_input(cs.clone(), || {
            self.root.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let nullifier_hash = FpVar::new_input(cs.clone(), || {
            self.nullifier_hash.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let signal_hash = FpVar::new_input(cs.clone(), || {
            self.signal_hash.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let external_nullifier = FpVar::new_input(cs.clone(), || {
            self.external_nullifier.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let identity_nullifier = FpVar::new_witness(cs.clone(), || {
            self.identity_nullifier.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let identity_trapdoor = FpVar::new_witness(cs.clone(), || {
            self.identity_trapdoor.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let mut path_elements = Vec::with_capacity(self.path_elements.len());
        for sibling in &self.path_elements {
            path_elements.push(FpVar::new_witness(cs.clone(), || {
                sibling.ok_or(SynthesisError::AssignmentMissing)
            })?);
        }

        let mut path_indices = Vec::with_capacity(self.path_indices.len());
        for idx in &self.path_indices {
            path_indices.push(Boolean::new_witness(cs.clone(), || {
                idx.ok_or(SynthesisError::AssignmentMissing)
            })?);
        }

        let secret = poseidon_hash_circuit(
            cs.clone(),
            &[identity_nullifier.clone(), identity_trapdoor],
        )?;
        let commitment = poseidon_hash_circuit(cs.clone(), &[secret])?;

        let computed_root =
            compute_merkle_root_circuit(cs.clone(), &commitment, &path_elements, &path_indices)?;
        computed_root.enforce_equal(&root)?;

        let computed_nullifier =
            poseidon_hash_circuit(cs, &[external_nullifier, identity_nullifier])?;
        computed_nullifier.enforce_equal(&nullifier_hash)?;

        // Binds the signal into the constraint system so it cannot be swapped.
        let _signal_square = &signal_hash * &signal_hash;

        Ok(())
    }
}

pub fn poseidon_hash_circuit(
    cs: ConstraintSystemRef<Fr>,
    inputs: &[FpVar<Fr>],
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut sponge = PoseidonSpongeVar::new(cs, canonical_config());
    sponge.absorb(&inputs)?;

    let output = sponge.squeeze_field_elements(1)?;
    Ok(output[0].clone())
}

pub fn compute_merkle_root_circuit(
    cs: ConstraintSystemRef<Fr>,
    leaf: &FpVar<Fr>,
    path: &[FpVar<Fr>],
    indices: &[Boolean<Fr>],
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut current = leaf.clone();

    for (sibling, is_right) in path.iter().zip(indices.iter()) {
        let left = FpVar::conditionally_select(is_right, sibling, &current)?;
        let right = FpVar::conditionally_select(is_right, &current, sibling)?;

        current = poseidon_hash_circuit(cs.clone(), &[left, right])?;
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::hash_to_field;
    use crate::merkle::IncrementalMerkleTree;
    use ark_relations::r1cs::ConstraintSystem;

    fn satisfied(circuit: MembershipCircuit) -> bool {
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs.is_satisfied().unwrap()
    }

    fn member_setup(depth: usize) -> (Identity, MerklePath) {
        let identity = Identity::from_seed(b"circuit member");
        let mut tree = IncrementalMerkleTree::new(depth);
        tree.insert(Identity::from_seed(b"other").commitment_fr());
        let index = tree.insert(identity.commitment_fr()).unwrap();
        let path = tree.path(index).unwrap();
        assert!(path.verify(identity.commitment_fr(), tree.root()));
        (identity, path)
    }

    #[test]
    fn test_valid_witness_satisfies() {
        let (identity, path) = member_setup(3);
        let circuit = MembershipCircuit::new(
            &identity,
            &path,
            &ScopeId::from_u64(2023),
            hash_to_field(b"signal"),
        );
        assert_eq!(circuit.depth(), 3);
        assert_eq!(circuit.public_inputs().unwrap().len(), NUM_PUBLIC_INPUTS);
        assert!(satisfied(circuit));
    }

    #[test]
    fn test_wrong_root_unsatisfied() {
        let (identity, path) = member_setup(3);
        let mut circuit = MembershipCircuit::new(
            &identity,
            &path,
            &ScopeId::from_u64(2023),
            hash_to_field(b"signal"),
        );
        circuit.root = Some(Fr::from(1u64));
        assert!(!satisfied(circuit));
    }

    #[test]
    fn test_wrong_nullifier_unsatisfied() {
        let (identity, path) = member_setup(3);
        let mut circuit = MembershipCircuit::new(
            &identity,
            &path,
            &ScopeId::from_u64(2023),
            hash_to_field(b"signal"),
        );
        circuit.nullifier_hash = Some(identity.nullifier_hash_fr(&ScopeId::from_u64(7)));
        assert!(!satisfied(circuit));
    }

    #[test]
    fn test_empty_has_no_assignment() {
        let circuit = MembershipCircuit::empty(4);
        assert_eq!(circuit.depth(), 4);
        assert!(circuit.public_inputs().is_none());
    }
}
