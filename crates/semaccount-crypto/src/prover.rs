//! Groth16 key generation and proving for the membership circuit.
//!
//! Keys are circuit specific, so every supported tree depth has its own pair.
//! The validator only ever needs the verifying half.

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use rand::{CryptoRng, RngCore};
use semaccount_types::{
    check_depth, NullifierHash, Root, ScopeId, SemaError, SemaResult, SignalHash,
};
use tracing::debug;

use crate::circuit::MembershipCircuit;
use crate::field::{fr_to_word, hash_to_field};
use crate::identity::Identity;
use crate::merkle::MerklePath;
use crate::proof::{PackedProof, ProofEnvelope};
use crate::verifier::Groth16Verifier;

pub struct MembershipKeys {
    depth: usize,
    proving_key: ProvingKey<Bn254>,
}

impl MembershipKeys {
    pub fn setup<R: RngCore + CryptoRng>(depth: usize, rng: &mut R) -> SemaResult<Self> {
        check_depth(depth)?;
        let (proving_key, _) =
            Groth16::<Bn254>::circuit_specific_setup(MembershipCircuit::empty(depth), rng)
                .map_err(|e| SemaError::Crypto(format!("Setup failed: {}", e)))?;

        debug!("Generated membership keys for depth {}", depth);
        Ok(Self { depth, proving_key })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn proving_key(&self) -> &ProvingKey<Bn254> {
        &self.proving_key
    }

    pub fn verifying_key(&self) -> &VerifyingKey<Bn254> {
        &self.proving_key.vk
    }

    pub fn proving_key_bytes(&self) -> SemaResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.proving_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| SemaError::Serialization(format!("Proving key: {}", e)))?;
        Ok(bytes)
    }

    pub fn verifying_key_bytes(&self) -> SemaResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.proving_key
            .vk
            .serialize_compressed(&mut bytes)
            .map_err(|e| SemaError::Serialization(format!("Verifying key: {}", e)))?;
        Ok(bytes)
    }

    pub fn from_proving_key_bytes(depth: usize, bytes: &[u8]) -> SemaResult<Self> {
        check_depth(depth)?;
        let proving_key = ProvingKey::<Bn254>::deserialize_compressed(bytes)
            .map_err(|e| SemaError::Serialization(format!("Invalid proving key: {}", e)))?;
        Ok(Self { depth, proving_key })
    }

    /// Verifier preloaded with this depth's key.
    pub fn verifier(&self) -> SemaResult<Groth16Verifier> {
        let mut verifier = Groth16Verifier::new();
        verifier.insert_key(self.depth, self.verifying_key())?;
        Ok(verifier)
    }

    /// Prove membership of `identity` at `path` and endorse `signal` under
    /// `scope`. The root in the envelope is the one `path` leads to.
    pub fn prove<R: RngCore + CryptoRng>(
        &self,
        identity: &Identity,
        path: &MerklePath,
        scope: &ScopeId,
        signal: SignalHash,
        rng: &mut R,
    ) -> SemaResult<ProofEnvelope> {
        if path.depth() != self.depth {
            return Err(SemaError::Crypto(format!(
                "Merkle path has depth {}, keys are for depth {}",
                path.depth(),
                self.depth
            )));
        }

        let circuit =
            MembershipCircuit::new(identity, path, scope, hash_to_field(signal.as_bytes()));
        let root: Fr = path.compute_root(identity.commitment_fr());

        let proof = Groth16::<Bn254>::prove(&self.proving_key, circuit, rng)
            .map_err(|e| SemaError::Crypto(format!("Proof generation failed: {}", e)))?;

        Ok(ProofEnvelope {
            depth: self.depth,
            root: Root::from_bytes(fr_to_word(&root)),
            nullifier_hash: NullifierHash::from_bytes(fr_to_word(&identity.nullifier_hash_fr(scope))),
            signal_hash: signal,
            scope: *scope,
            proof: PackedProof::from_proof(&proof),
        })
    }
}
