//! Conversions between EVM words and BN254 field elements.

use ark_bn254::Fr;
use ark_ff::{BigInteger, BigInteger256, PrimeField};
use sha3::{Digest, Keccak256};

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Big-endian word to field element, rejecting values at or above the modulus.
pub fn field_from_word<F: PrimeField<BigInt = BigInteger256>>(word: &[u8; 32]) -> Option<F> {
    let mut limbs = [0u64; 4];
    for (limb, chunk) in limbs.iter_mut().zip(word.rchunks(8)) {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(chunk);
        *limb = u64::from_be_bytes(buf);
    }
    F::from_bigint(BigInteger256::new(limbs))
}

pub fn field_to_word<F: PrimeField<BigInt = BigInteger256>>(value: &F) -> [u8; 32] {
    let bytes = value.into_bigint().to_bytes_be();
    let mut word = [0u8; 32];
    word[32 - bytes.len()..].copy_from_slice(&bytes);
    word
}

pub fn fr_from_word(word: &[u8; 32]) -> Option<Fr> {
    field_from_word(word)
}

pub fn fr_to_word(value: &Fr) -> [u8; 32] {
    field_to_word(value)
}

/// `uint256(keccak256(data)) >> 8`: always below 2^248, so always a valid
/// scalar. Used for the proof's signal and scope inputs.
pub fn hash_to_field(data: &[u8]) -> Fr {
    Fr::from_be_bytes_mod_order(&hash_to_word(data))
}

pub fn hash_to_word(data: &[u8]) -> [u8; 32] {
    let digest = keccak256(data);
    let mut word = [0u8; 32];
    word[1..].copy_from_slice(&digest[..31]);
    word
}
