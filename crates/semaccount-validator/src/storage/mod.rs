//! sled-backed persistence for scopes, members and consumed nullifiers.
//!
//! Trees:
//! - `schema`: schema version record
//! - `scopes`: `scope (32 bytes)` -> bincode [`StoredScope`]
//! - `members`: `scope (32) || leaf index (u64 BE)` -> raw commitment word
//! - `nullifiers`: `scope (32) || nullifier hash (32)` -> bincode [`StoredNullifier`]

mod scopes;
mod types;

pub use types::*;

use semaccount_types::{SemaError, SemaResult};
use sled::{Db, Tree};
use tracing::info;

const CURRENT_SCHEMA_VERSION: u32 = 1;
const SCHEMA_KEY: &[u8] = b"__schema_version__";

#[derive(Clone)]
pub struct ValidatorStorage {
    db: Db,
    schema: Tree,
    scopes: Tree,
    members: Tree,
    nullifiers: Tree,
}

impl ValidatorStorage {
    pub fn open(config: &StorageConfig) -> SemaResult<Self> {
        info!("Opening storage at {:?}", config.path);

        let db = sled::Config::new()
            .path(&config.path)
            .cache_capacity(config.cache_capacity_bytes)
            .flush_every_ms(config.flush_every_ms)
            .open()
            .map_err(|e| SemaError::Storage(format!("Failed to open database: {}", e)))?;

        let storage = Self::create_from_db(db)?;
        storage.ensure_schema()?;

        info!("Storage opened (schema version {})", CURRENT_SCHEMA_VERSION);
        Ok(storage)
    }

    pub fn in_memory() -> SemaResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| SemaError::Storage(format!("Failed to open temp database: {}", e)))?;

        let storage = Self::create_from_db(db)?;
        storage.ensure_schema()?;
        Ok(storage)
    }

    fn create_from_db(db: Db) -> SemaResult<Self> {
        Ok(Self {
            schema: Self::open_tree(&db, "schema")?,
            scopes: Self::open_tree(&db, "scopes")?,
            members: Self::open_tree(&db, "members")?,
            nullifiers: Self::open_tree(&db, "nullifiers")?,
            db,
        })
    }

    fn open_tree(db: &Db, name: &str) -> SemaResult<Tree> {
        db.open_tree(name)
            .map_err(|e| SemaError::Storage(format!("Failed to open {} tree: {}", name, e)))
    }

    fn ensure_schema(&self) -> SemaResult<()> {
        match self.schema_version()? {
            None => self.initialize_schema(),
            Some(CURRENT_SCHEMA_VERSION) => Ok(()),
            Some(version) => Err(SemaError::Storage(format!(
                "Database schema version {} is not supported (expected {})",
                version, CURRENT_SCHEMA_VERSION
            ))),
        }
    }

    pub fn schema_version(&self) -> SemaResult<Option<u32>> {
        match self
            .schema
            .get(SCHEMA_KEY)
            .map_err(|e| SemaError::Storage(format!("Failed to read schema: {}", e)))?
        {
            Some(bytes) => {
                let info: SchemaInfo = bincode::deserialize(&bytes)
                    .map_err(|e| SemaError::Storage(format!("Failed to deserialize schema: {}", e)))?;
                Ok(Some(info.version))
            }
            None => Ok(None),
        }
    }

    fn initialize_schema(&self) -> SemaResult<()> {
        info!("Initializing new database with schema version {}", CURRENT_SCHEMA_VERSION);

        let info = SchemaInfo {
            version: CURRENT_SCHEMA_VERSION,
            created_at: chrono::Utc::now().timestamp(),
        };
        let bytes = bincode::serialize(&info)
            .map_err(|e| SemaError::Storage(format!("Failed to serialize schema: {}", e)))?;

        self.schema
            .insert(SCHEMA_KEY, bytes)
            .map_err(|e| SemaError::Storage(format!("Failed to store schema: {}", e)))?;

        self.flush()
    }

    /// Tree backing the persistent nullifier ledger.
    pub fn nullifier_tree(&self) -> Tree {
        self.nullifiers.clone()
    }

    pub fn flush(&self) -> SemaResult<()> {
        self.db
            .flush()
            .map_err(|e| SemaError::Storage(format!("Failed to flush: {}", e)))?;
        Ok(())
    }

    pub fn size_on_disk(&self) -> u64 {
        self.db.size_on_disk().unwrap_or(0)
    }
}
