//! Groth16 verification behind the [`ProofVerifier`] capability.

use ark_bn254::Bn254;
use ark_groth16::{Groth16, PreparedVerifyingKey, VerifyingKey};
use ark_serialize::CanonicalDeserialize;
use ark_snark::SNARK;
use semaccount_types::{check_depth, SemaError, SemaResult};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::circuit::NUM_PUBLIC_INPUTS;
use crate::proof::{PackedProof, PublicInputs};

/// Pure proof check. Implementations must fail closed: any malformed input
/// yields `false`, never a panic.
pub trait ProofVerifier: Send + Sync {
    fn verify(&self, proof: &PackedProof, inputs: &PublicInputs) -> bool;
}

pub fn verifying_key_file_name(depth: usize) -> String {
    format!("membership_d{}.vk.bin", depth)
}

pub fn proving_key_file_name(depth: usize) -> String {
    format!("membership_d{}.pk.bin", depth)
}

/// Verifier holding one prepared key per supported tree depth.
#[derive(Default)]
pub struct Groth16Verifier {
    keys: HashMap<usize, PreparedVerifyingKey<Bn254>>,
}

impl Groth16Verifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_key(&mut self, depth: usize, vk: &VerifyingKey<Bn254>) -> SemaResult<()> {
        check_depth(depth)?;
        if vk.gamma_abc_g1.len() != NUM_PUBLIC_INPUTS + 1 {
            return Err(SemaError::Crypto(format!(
                "verifying key for depth {} expects {} public inputs",
                depth,
                vk.gamma_abc_g1.len().saturating_sub(1)
            )));
        }

        let pvk = Groth16::<Bn254>::process_vk(vk)
            .map_err(|e| SemaError::Crypto(format!("Failed to process verifying key: {}", e)))?;
        self.keys.insert(depth, pvk);
        Ok(())
    }

    /// Insert a key in arkworks compressed serialization.
    pub fn load_key_bytes(&mut self, depth: usize, bytes: &[u8]) -> SemaResult<()> {
        let vk = VerifyingKey::<Bn254>::deserialize_compressed(bytes)
            .map_err(|e| SemaError::Serialization(format!("Invalid verifying key: {}", e)))?;
        self.insert_key(depth, &vk)
    }

    /// Load every `membership_d{D}.vk.bin` found in `dir`.
    pub fn load_dir(dir: &Path) -> SemaResult<Self> {
        let mut verifier = Self::new();

        for depth in semaccount_types::MIN_TREE_DEPTH..=semaccount_types::MAX_TREE_DEPTH {
            let path = dir.join(verifying_key_file_name(depth));
            if !path.exists() {
                continue;
            }
            let bytes = fs::read(&path).map_err(|e| {
                SemaError::Storage(format!("Failed to read {}: {}", path.display(), e))
            })?;
            verifier.load_key_bytes(depth, &bytes)?;
            debug!("Loaded verifying key for depth {}", depth);
        }

        info!(
            "Verifier ready with {} key(s) from {}",
            verifier.keys.len(),
            dir.display()
        );
        Ok(verifier)
    }

    pub fn depths(&self) -> Vec<usize> {
        let mut depths: Vec<usize> = self.keys.keys().copied().collect();
        depths.sort_unstable();
        depths
    }

    pub fn supports(&self, depth: usize) -> bool {
        self.keys.contains_key(&depth)
    }
}

impl ProofVerifier for Groth16Verifier {
    fn verify(&self, proof: &PackedProof, inputs: &PublicInputs) -> bool {
        let Some(pvk) = self.keys.get(&inputs.depth) else {
            debug!("No verifying key for depth {}", inputs.depth);
            return false;
        };
        let Some(proof) = proof.to_proof() else {
            debug!("Proof points failed to decode");
            return false;
        };
        let Some(public_inputs) = inputs.to_field_elements() else {
            debug!("Public inputs are not canonical field elements");
            return false;
        };

        Groth16::<Bn254>::verify_with_processed_vk(pvk, &public_inputs, &proof).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prover::tests::{test_keys, TEST_DEPTH};
    use semaccount_types::{NullifierHash, Root, ScopeId, SignalHash};

    fn junk_inputs(depth: usize) -> PublicInputs {
        PublicInputs {
            depth,
            root: Root::from_bytes([1; 32]),
            nullifier_hash: NullifierHash::from_bytes([2; 32]),
            signal_hash: SignalHash::from_bytes([3; 32]),
            scope: ScopeId::from_u64(1),
        }
    }

    #[test]
    fn test_empty_verifier_rejects() {
        let verifier = Groth16Verifier::new();
        assert!(verifier.depths().is_empty());
        assert!(!verifier.verify(&PackedProof::default(), &junk_inputs(TEST_DEPTH)));
    }

    #[test]
    fn test_malformed_proof_rejected() {
        let verifier = test_keys().verifier().unwrap();
        assert!(verifier.supports(TEST_DEPTH));
        assert!(!verifier.verify(&PackedProof([[0xff; 32]; 8]), &junk_inputs(TEST_DEPTH)));
        assert!(!verifier.verify(&PackedProof::default(), &junk_inputs(TEST_DEPTH)));
    }

    #[test]
    fn test_insert_rejects_bad_depth() {
        let mut verifier = Groth16Verifier::new();
        assert!(verifier.insert_key(0, test_keys().verifying_key()).is_err());
        assert!(verifier.insert_key(33, test_keys().verifying_key()).is_err());
    }

    #[test]
    fn test_load_dir() {
        let dir = std::env::temp_dir().join(format!("semaccount-vk-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(verifying_key_file_name(TEST_DEPTH)),
            test_keys().verifying_key_bytes().unwrap(),
        )
        .unwrap();

        let verifier = Groth16Verifier::load_dir(&dir).unwrap();
        assert_eq!(verifier.depths(), vec![TEST_DEPTH]);

        fs::write(dir.join(verifying_key_file_name(4)), b"garbage").unwrap();
        assert!(Groth16Verifier::load_dir(&dir).is_err());

        fs::remove_dir_all(&dir).unwrap();
    }
}
