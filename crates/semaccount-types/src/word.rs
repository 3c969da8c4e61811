//! 256-bit words in EVM byte order.
//!
//! Every digest that crosses the validator boundary is a big-endian 32-byte
//! word, matching `uint256`/`bytes32` ABI encoding. The newtypes only exist to
//! keep roots, nullifiers and commitments from being swapped by accident.

use crate::error::{SemaError, SemaResult};
use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const WORD_SIZE: usize = 32;

macro_rules! word_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub [u8; WORD_SIZE]);

        impl $name {
            pub const fn from_bytes(bytes: [u8; WORD_SIZE]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; WORD_SIZE] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }

            pub fn from_hex(s: &str) -> SemaResult<Self> {
                let s = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(s).map_err(|e| SemaError::Encoding(e.to_string()))?;
                if bytes.len() != WORD_SIZE {
                    return Err(SemaError::Encoding(format!(
                        "expected {} bytes, got {}",
                        WORD_SIZE,
                        bytes.len()
                    )));
                }
                let mut arr = [0u8; WORD_SIZE];
                arr.copy_from_slice(&bytes);
                Ok(Self(arr))
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; WORD_SIZE]
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }

        impl From<[u8; WORD_SIZE]> for $name {
            fn from(bytes: [u8; WORD_SIZE]) -> Self {
                Self(bytes)
            }
        }

        impl FromStr for $name {
            type Err = SemaError;

            fn from_str(s: &str) -> SemaResult<Self> {
                Self::from_hex(s.trim())
            }
        }
    };
}

word_newtype!(
    /// Merkle root of a scope's commitment accumulator.
    Root
);

word_newtype!(
    /// Public per-identity, per-scope replay tag.
    NullifierHash
);

word_newtype!(
    /// Public commitment to an identity secret; one accumulator leaf.
    Commitment
);

word_newtype!(OperationHash);

word_newtype!(SignalHash);

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Display for NullifierHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Display for OperationHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Numeric identifier of a group and its nullifier namespace.
///
/// Displayed and parsed as a decimal `uint256` (hex with a `0x` prefix is
/// accepted too), since group ids are usually small integers such as `2023`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ScopeId(pub [u8; WORD_SIZE]);

impl ScopeId {
    pub fn from_u64(id: u64) -> Self {
        Self(U256::from(id).to_be_bytes::<WORD_SIZE>())
    }

    pub fn as_bytes(&self) -> &[u8; WORD_SIZE] {
        &self.0
    }

    pub fn as_u256(&self) -> U256 {
        U256::from_be_bytes(self.0)
    }
}

impl From<u64> for ScopeId {
    fn from(id: u64) -> Self {
        Self::from_u64(id)
    }
}

impl From<U256> for ScopeId {
    fn from(id: U256) -> Self {
        Self(id.to_be_bytes::<WORD_SIZE>())
    }
}

impl FromStr for ScopeId {
    type Err = SemaError;

    fn from_str(s: &str) -> SemaResult<Self> {
        U256::from_str(s.trim())
            .map(Self::from)
            .map_err(|e| SemaError::Encoding(format!("invalid scope id {:?}: {}", s, e)))
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u256())
    }
}

impl fmt::Debug for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopeId({})", self.as_u256())
    }
}

impl Serialize for ScopeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ScopeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
