#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod circuit;
pub mod field;
pub mod identity;
pub mod merkle;
pub mod poseidon;
pub mod proof;
pub mod prover;
pub mod verifier;

pub use circuit::{MembershipCircuit, NUM_PUBLIC_INPUTS};
pub use field::{fr_from_word, fr_to_word, hash_to_field, hash_to_word, keccak256};
pub use identity::Identity;
pub use merkle::{IncrementalMerkleTree, MerklePath};
pub use poseidon::{canonical_config, poseidon_hash1, poseidon_hash2, poseidon_hash_fields};
pub use proof::{PackedProof, ProofEnvelope, PublicInputs, COMPACT_LEN, ENVELOPE_LEN};
pub use prover::MembershipKeys;
pub use verifier::{
    proving_key_file_name, verifying_key_file_name, Groth16Verifier, ProofVerifier,
};

pub use ark_bn254::Fr;
