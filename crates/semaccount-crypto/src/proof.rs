//! EVM-compatible proof encodings.
//!
//! A Groth16 proof travels as `uint256[8]`:
//! `[a.x, a.y, b.x.c1, b.x.c0, b.y.c1, b.y.c0, c.x, c.y]`, the order the
//! Solidity pairing precompile expects for G2 coordinates.
//!
//! Two signature layouts are accepted:
//! - envelope: `abi.encode(depth, root, nullifierHash, signalHash, scope, uint256[8])`
//! - compact: `abi.encode(uint256[8], nullifierHash)`, the remaining inputs
//!   coming from the account's binding.
//!
//! Decoding into curve points is strict and fails closed: every coordinate
//! must be below the base-field modulus, lie on the curve, sit in the prime
//! order subgroup and not be the point at infinity.

use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ff::Zero;
use ark_groth16::Proof;
use semaccount_types::{
    check_depth, NullifierHash, Root, ScopeId, SemaError, SemaResult, SignalHash, WORD_SIZE,
};

use crate::field::{field_from_word, field_to_word, fr_from_word, hash_to_field};

pub const PROOF_WORDS: usize = 8;
pub const ENVELOPE_LEN: usize = 13 * WORD_SIZE;
pub const COMPACT_LEN: usize = 9 * WORD_SIZE;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PackedProof(pub [[u8; WORD_SIZE]; PROOF_WORDS]);

impl PackedProof {
    pub fn from_proof(proof: &Proof<Bn254>) -> Self {
        Self([
            field_to_word(&proof.a.x),
            field_to_word(&proof.a.y),
            field_to_word(&proof.b.x.c1),
            field_to_word(&proof.b.x.c0),
            field_to_word(&proof.b.y.c1),
            field_to_word(&proof.b.y.c0),
            field_to_word(&proof.c.x),
            field_to_word(&proof.c.y),
        ])
    }

    pub fn to_proof(&self) -> Option<Proof<Bn254>> {
        let w = &self.0;
        let a = g1_from_words(&w[0], &w[1])?;
        let b = g2_from_words(&w[2], &w[3], &w[4], &w[5])?;
        let c = g1_from_words(&w[6], &w[7])?;
        Some(Proof { a, b, c })
    }

    pub fn words(&self) -> &[[u8; WORD_SIZE]; PROOF_WORDS] {
        &self.0
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        for word in &self.0 {
            out.extend_from_slice(word);
        }
    }

    fn read_from(bytes: &[u8]) -> Self {
        let mut words = [[0u8; WORD_SIZE]; PROOF_WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(WORD_SIZE)) {
            word.copy_from_slice(chunk);
        }
        Self(words)
    }
}

fn g1_from_words(x: &[u8; 32], y: &[u8; 32]) -> Option<G1Affine> {
    let x: Fq = field_from_word(x)?;
    let y: Fq = field_from_word(y)?;
    if x.is_zero() && y.is_zero() {
        return None;
    }
    let point = G1Affine::new_unchecked(x, y);
    (point.is_on_curve() && point.is_in_correct_subgroup_assuming_on_curve()).then_some(point)
}

fn g2_from_words(
    x_c1: &[u8; 32],
    x_c0: &[u8; 32],
    y_c1: &[u8; 32],
    y_c0: &[u8; 32],
) -> Option<G2Affine> {
    let x = Fq2::new(field_from_word(x_c0)?, field_from_word(x_c1)?);
    let y = Fq2::new(field_from_word(y_c0)?, field_from_word(y_c1)?);
    if x.is_zero() && y.is_zero() {
        return None;
    }
    let point = G2Affine::new_unchecked(x, y);
    (point.is_on_curve() && point.is_in_correct_subgroup_assuming_on_curve()).then_some(point)
}

/// Public statement a proof is checked against. `signal_hash` is the raw
/// signal word (the operation hash); it is reduced with `hash_to_field`, as
/// is the scope, when building the verifier inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicInputs {
    pub depth: usize,
    pub root: Root,
    pub nullifier_hash: NullifierHash,
    pub signal_hash: SignalHash,
    pub scope: ScopeId,
}

impl PublicInputs {
    /// Field elements in circuit order, or `None` when the root or nullifier
    /// hash is not a canonical scalar.
    pub fn to_field_elements(&self) -> Option<Vec<Fr>> {
        Some(vec![
            fr_from_word(self.root.as_bytes())?,
            fr_from_word(self.nullifier_hash.as_bytes())?,
            hash_to_field(self.signal_hash.as_bytes()),
            hash_to_field(self.scope.as_bytes()),
        ])
    }
}

/// Decoded `op.signature`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofEnvelope {
    pub depth: usize,
    pub root: Root,
    pub nullifier_hash: NullifierHash,
    /// Signal the prover claims; the validator recomputes its own.
    pub signal_hash: SignalHash,
    pub scope: ScopeId,
    pub proof: PackedProof,
}

impl ProofEnvelope {
    /// Inputs for verification with the validator's own signal.
    pub fn public_inputs(&self, signal_hash: SignalHash) -> PublicInputs {
        PublicInputs {
            depth: self.depth,
            root: self.root,
            nullifier_hash: self.nullifier_hash,
            signal_hash,
            scope: self.scope,
        }
    }

    pub fn to_abi_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ENVELOPE_LEN);
        out.extend_from_slice(&depth_word(self.depth));
        out.extend_from_slice(self.root.as_bytes());
        out.extend_from_slice(self.nullifier_hash.as_bytes());
        out.extend_from_slice(self.signal_hash.as_bytes());
        out.extend_from_slice(self.scope.as_bytes());
        self.proof.write_to(&mut out);
        out
    }

    pub fn from_abi_bytes(bytes: &[u8]) -> SemaResult<Self> {
        if bytes.len() != ENVELOPE_LEN {
            return Err(SemaError::Encoding(format!(
                "proof envelope must be {} bytes, got {}",
                ENVELOPE_LEN,
                bytes.len()
            )));
        }

        let word = |i: usize| -> [u8; WORD_SIZE] {
            let mut w = [0u8; WORD_SIZE];
            w.copy_from_slice(&bytes[i * WORD_SIZE..(i + 1) * WORD_SIZE]);
            w
        };

        Ok(Self {
            depth: depth_from_word(&word(0))?,
            root: Root::from_bytes(word(1)),
            nullifier_hash: NullifierHash::from_bytes(word(2)),
            signal_hash: SignalHash::from_bytes(word(3)),
            scope: ScopeId(word(4)),
            proof: PackedProof::read_from(&bytes[5 * WORD_SIZE..]),
        })
    }

    pub fn to_compact_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(COMPACT_LEN);
        self.proof.write_to(&mut out);
        out.extend_from_slice(self.nullifier_hash.as_bytes());
        out
    }

    /// Compact layout: depth, root and scope come from the account binding.
    /// The claimed signal is left zero.
    pub fn from_compact(bytes: &[u8], depth: usize, root: Root, scope: ScopeId) -> SemaResult<Self> {
        if bytes.len() != COMPACT_LEN {
            return Err(SemaError::Encoding(format!(
                "compact proof must be {} bytes, got {}",
                COMPACT_LEN,
                bytes.len()
            )));
        }

        let mut nullifier = [0u8; WORD_SIZE];
        nullifier.copy_from_slice(&bytes[PROOF_WORDS * WORD_SIZE..]);

        Ok(Self {
            depth: check_depth(depth)?,
            root,
            nullifier_hash: NullifierHash::from_bytes(nullifier),
            signal_hash: SignalHash::default(),
            scope,
            proof: PackedProof::read_from(&bytes[..PROOF_WORDS * WORD_SIZE]),
        })
    }
}

fn depth_word(depth: usize) -> [u8; WORD_SIZE] {
    let mut word = [0u8; WORD_SIZE];
    word[WORD_SIZE - 8..].copy_from_slice(&(depth as u64).to_be_bytes());
    word
}

fn depth_from_word(word: &[u8; WORD_SIZE]) -> SemaResult<usize> {
    if word[..WORD_SIZE - 1].iter().any(|b| *b != 0) {
        return Err(SemaError::Encoding("depth word out of range".into()));
    }
    check_depth(word[WORD_SIZE - 1] as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::AffineRepr;

    fn generator_proof() -> Proof<Bn254> {
        Proof {
            a: G1Affine::generator(),
            b: G2Affine::generator(),
            c: G1Affine::generator(),
        }
    }

    fn sample_envelope() -> ProofEnvelope {
        ProofEnvelope {
            depth: 20,
            root: Root::from_bytes([1; 32]),
            nullifier_hash: NullifierHash::from_bytes([2; 32]),
            signal_hash: SignalHash::from_bytes([3; 32]),
            scope: ScopeId::from_u64(2023),
            proof: PackedProof::from_proof(&generator_proof()),
        }
    }

    #[test]
    fn test_packed_proof_word_order() {
        let proof = generator_proof();
        let packed = PackedProof::from_proof(&proof);

        assert_eq!(packed.words()[2], field_to_word(&proof.b.x.c1));
        assert_eq!(packed.words()[3], field_to_word(&proof.b.x.c0));
        assert_eq!(packed.to_proof(), Some(proof));
    }

    #[test]
    fn test_rejects_out_of_range_coordinate() {
        let mut packed = PackedProof::from_proof(&generator_proof());
        packed.0[0] = [0xff; 32];
        assert!(packed.to_proof().is_none());
    }

    #[test]
    fn test_rejects_off_curve_point() {
        let mut packed = PackedProof::from_proof(&generator_proof());
        packed.0[1][31] ^= 1;
        assert!(packed.to_proof().is_none());
    }

    #[test]
    fn test_rejects_zero_point() {
        let mut packed = PackedProof::from_proof(&generator_proof());
        packed.0[6] = [0; 32];
        packed.0[7] = [0; 32];
        assert!(packed.to_proof().is_none());
        assert!(PackedProof::default().to_proof().is_none());
    }

    #[test]
    fn test_envelope_layout() {
        let envelope = sample_envelope();
        let bytes = envelope.to_abi_bytes();

        assert_eq!(bytes.len(), ENVELOPE_LEN);
        assert_eq!(bytes[31], 20);
        assert_eq!(&bytes[32..64], &[1u8; 32]);
        assert_eq!(&bytes[158..160], &[0x07, 0xe7]);
        assert_eq!(ProofEnvelope::from_abi_bytes(&bytes).unwrap(), envelope);
    }

    #[test]
    fn test_envelope_rejects_bad_length_and_depth() {
        let bytes = sample_envelope().to_abi_bytes();
        assert!(ProofEnvelope::from_abi_bytes(&bytes[..ENVELOPE_LEN - 1]).is_err());
        assert!(ProofEnvelope::from_abi_bytes(&[]).is_err());

        let mut deep = bytes.clone();
        deep[31] = 33;
        assert!(matches!(
            ProofEnvelope::from_abi_bytes(&deep),
            Err(SemaError::InvalidDepth(33))
        ));

        let mut huge = bytes;
        huge[0] = 1;
        assert!(ProofEnvelope::from_abi_bytes(&huge).is_err());
    }

    #[test]
    fn test_compact_layout() {
        let envelope = sample_envelope();
        let bytes = envelope.to_compact_bytes();
        assert_eq!(bytes.len(), COMPACT_LEN);

        let decoded =
            ProofEnvelope::from_compact(&bytes, 20, envelope.root, envelope.scope).unwrap();
        assert_eq!(decoded.proof, envelope.proof);
        assert_eq!(decoded.nullifier_hash, envelope.nullifier_hash);
        assert!(decoded.signal_hash.is_zero());
        assert!(ProofEnvelope::from_compact(&bytes[1..], 20, envelope.root, envelope.scope).is_err());
    }

    #[test]
    fn test_public_inputs_reject_non_canonical_root() {
        let mut inputs = sample_envelope().public_inputs(SignalHash::from_bytes([9; 32]));
        assert_eq!(inputs.to_field_elements().map(|v| v.len()), Some(4));

        inputs.root = Root::from_bytes([0xff; 32]);
        assert!(inputs.to_field_elements().is_none());
    }
}
