use semaccount_types::ScopeId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const FLUSH_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub path: PathBuf,
    pub cache_capacity_bytes: u64,
    pub flush_every_ms: Option<u64>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data"),
            cache_capacity_bytes: 64 * 1024 * 1024,
            flush_every_ms: Some(FLUSH_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub version: u32,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredScope {
    pub scope: ScopeId,
    pub depth: usize,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredNullifier {
    pub marked_at: i64,
}
