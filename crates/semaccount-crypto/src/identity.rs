//! Member identity: two private field elements and the public commitment
//! derived from them.

use ark_bn254::Fr;
use ark_ff::PrimeField;
use ark_std::UniformRand;
use rand::{CryptoRng, RngCore};
use semaccount_types::{Commitment, NullifierHash, ScopeId, SemaError, SemaResult};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::field::{fr_from_word, fr_to_word, hash_to_word};
use crate::poseidon::{poseidon_hash1, poseidon_hash2};

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Identity {
    trapdoor: [u8; 32],
    nullifier: [u8; 32],
}

impl Identity {
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            trapdoor: fr_to_word(&Fr::rand(rng)),
            nullifier: fr_to_word(&Fr::rand(rng)),
        }
    }

    /// Deterministic identity from a seed message. Both secrets are reduced
    /// with `hash_to_field`, so they are always canonical.
    pub fn from_seed(seed: &[u8]) -> Self {
        let mut trapdoor_input = seed.to_vec();
        trapdoor_input.extend_from_slice(b"identity_trapdoor");
        let mut nullifier_input = seed.to_vec();
        nullifier_input.extend_from_slice(b"identity_nullifier");

        let identity = Self {
            trapdoor: hash_to_word(&trapdoor_input),
            nullifier: hash_to_word(&nullifier_input),
        };
        trapdoor_input.zeroize();
        nullifier_input.zeroize();
        identity
    }

    pub fn from_secrets(trapdoor: [u8; 32], nullifier: [u8; 32]) -> SemaResult<Self> {
        if fr_from_word(&trapdoor).is_none() || fr_from_word(&nullifier).is_none() {
            return Err(SemaError::Crypto(
                "identity secrets must be canonical field elements".into(),
            ));
        }
        Ok(Self {
            trapdoor,
            nullifier,
        })
    }

    pub(crate) fn trapdoor_fr(&self) -> Fr {
        Fr::from_be_bytes_mod_order(&self.trapdoor)
    }

    pub(crate) fn nullifier_fr(&self) -> Fr {
        Fr::from_be_bytes_mod_order(&self.nullifier)
    }

    fn secret(&self) -> Fr {
        poseidon_hash2(self.nullifier_fr(), self.trapdoor_fr())
    }

    pub fn commitment_fr(&self) -> Fr {
        poseidon_hash1(self.secret())
    }

    pub fn commitment(&self) -> Commitment {
        Commitment::from_bytes(fr_to_word(&self.commitment_fr()))
    }

    pub fn nullifier_hash_fr(&self, scope: &ScopeId) -> Fr {
        poseidon_hash2(scope_field(scope), self.nullifier_fr())
    }

    /// Replay tag for this identity under `scope`. Independent of the signal.
    pub fn nullifier_hash(&self, scope: &ScopeId) -> NullifierHash {
        NullifierHash::from_bytes(fr_to_word(&self.nullifier_hash_fr(scope)))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("commitment", &self.commitment())
            .finish_non_exhaustive()
    }
}

/// External nullifier for a scope.
pub fn scope_field(scope: &ScopeId) -> Fr {
    crate::field::hash_to_field(scope.as_bytes())
}
