//! Canonical Poseidon hash over the BN254 scalar field.
//!
//! Every commitment, nullifier hash and accumulator node MUST be computed with
//! these functions; the membership circuit uses the same configuration through
//! `PoseidonSpongeVar`, so native and in-circuit digests agree.
//!
//! ## Parameters
//! - Width: 3 (rate=2, capacity=1)
//! - Full rounds: 8, partial rounds: 57
//! - S-box: x^5
//! - Round constants and MDS: Grain LFSR (arkworks standard)

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::{
    poseidon::{find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge},
    CryptographicSponge,
};
use std::sync::OnceLock;

static CANONICAL_CONFIG: OnceLock<PoseidonConfig<Fr>> = OnceLock::new();

/// Shared Poseidon configuration, built once per process.
pub fn canonical_config() -> &'static PoseidonConfig<Fr> {
    CANONICAL_CONFIG.get_or_init(|| {
        let rate = 2;
        let alpha = 5u64;
        let full_rounds = 8u64;
        let partial_rounds = 57u64;
        let field_bits = 254u64;

        let (ark, mds) =
            find_poseidon_ark_and_mds::<Fr>(field_bits, rate, full_rounds, partial_rounds, 0);

        PoseidonConfig {
            full_rounds: full_rounds as usize,
            partial_rounds: partial_rounds as usize,
            alpha,
            ark,
            mds,
            rate,
            capacity: 1,
        }
    })
}

/// Absorb all inputs and squeeze one element.
pub fn poseidon_hash_fields(inputs: &[Fr]) -> Fr {
    let mut sponge = PoseidonSponge::new(canonical_config());
    for input in inputs {
        sponge.absorb(input);
    }
    let output: Vec<Fr> = sponge.squeeze_field_elements(1);
    output[0]
}

/// Accumulator node hash.
pub fn poseidon_hash2(left: Fr, right: Fr) -> Fr {
    poseidon_hash_fields(&[left, right])
}

pub fn poseidon_hash1(input: Fr) -> Fr {
    poseidon_hash_fields(&[input])
}
