use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// ERC-4337 (v0.6) user operation, the action an account is asked to authorize.
///
/// The validator never mutates an operation; it only hashes it. `signature`
/// carries the proof envelope and is excluded from the hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: U256,
    #[serde(default)]
    pub init_code: Bytes,
    #[serde(default)]
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    #[serde(default)]
    pub paymaster_and_data: Bytes,
    #[serde(default)]
    pub signature: Bytes,
}

impl UserOperation {
    /// Operation with empty byte fields and zeroed gas fields.
    pub fn new(sender: Address, nonce: U256) -> Self {
        Self {
            sender,
            nonce,
            init_code: Bytes::new(),
            call_data: Bytes::new(),
            call_gas_limit: U256::ZERO,
            verification_gas_limit: U256::ZERO,
            pre_verification_gas: U256::ZERO,
            max_fee_per_gas: U256::ZERO,
            max_priority_fee_per_gas: U256::ZERO,
            paymaster_and_data: Bytes::new(),
            signature: Bytes::new(),
        }
    }

    pub fn with_signature(mut self, signature: impl Into<Bytes>) -> Self {
        self.signature = signature.into();
        self
    }
}

/// Deployment identity an operation hash is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainContext {
    pub entry_point: Address,
    pub chain_id: u64,
}

impl DomainContext {
    pub fn new(entry_point: Address, chain_id: u64) -> Self {
        Self {
            entry_point,
            chain_id,
        }
    }
}
