//! Canonical ERC-4337 (v0.6) user-operation hash.
//!
//! `keccak256(abi.encode(keccak256(pack(op)), entryPoint, chainId))`, where
//! `pack` ABI-encodes every field except `signature` and replaces the dynamic
//! byte fields by their keccak256.

use semaccount_crypto::keccak256;
use semaccount_types::{Address, DomainContext, OperationHash, SignalHash, UserOperation, U256, WORD_SIZE};

fn push_u256(out: &mut Vec<u8>, value: &U256) {
    out.extend_from_slice(&value.to_be_bytes::<WORD_SIZE>());
}

fn push_address(out: &mut Vec<u8>, address: &Address) {
    out.extend_from_slice(&[0u8; WORD_SIZE - 20]);
    out.extend_from_slice(address.as_slice());
}

/// ABI encoding of the hashed fields, ten words.
pub fn pack_user_operation(op: &UserOperation) -> Vec<u8> {
    let mut out = Vec::with_capacity(10 * WORD_SIZE);
    push_address(&mut out, &op.sender);
    push_u256(&mut out, &op.nonce);
    out.extend_from_slice(&keccak256(&op.init_code));
    out.extend_from_slice(&keccak256(&op.call_data));
    push_u256(&mut out, &op.call_gas_limit);
    push_u256(&mut out, &op.verification_gas_limit);
    push_u256(&mut out, &op.pre_verification_gas);
    push_u256(&mut out, &op.max_fee_per_gas);
    push_u256(&mut out, &op.max_priority_fee_per_gas);
    out.extend_from_slice(&keccak256(&op.paymaster_and_data));
    out
}

pub fn user_operation_hash(op: &UserOperation, domain: &DomainContext) -> OperationHash {
    let mut out = Vec::with_capacity(3 * WORD_SIZE);
    out.extend_from_slice(&keccak256(&pack_user_operation(op)));
    push_address(&mut out, &domain.entry_point);
    push_u256(&mut out, &U256::from(domain.chain_id));
    OperationHash::from_bytes(keccak256(&out))
}

/// The signal a membership proof must endorse for `op`.
pub fn operation_signal(op: &UserOperation, domain: &DomainContext) -> SignalHash {
    SignalHash::from_bytes(*user_operation_hash(op, domain).as_bytes())
}
