use semaccount_types::{Address, DomainContext, SemaError, SemaResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use super::logging::LoggingConfig;
use super::types::{LogLevel, DEFAULT_CHAIN_ID, ENTRY_POINT_V06};
use crate::accumulator::DEFAULT_ROOT_HISTORY_SIZE;
use crate::storage::StorageConfig;

const MAX_ROOT_HISTORY_SIZE: usize = 4096;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub data_dir: PathBuf,
    /// Roots accepted per scope, current root included.
    pub root_history_size: usize,
    pub domain: DomainConfig,
    pub verifier: VerifierConfig,
    pub storage: StorageSettings,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainConfig {
    pub entry_point: Address,
    pub chain_id: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Directory holding `membership_d{D}.vk.bin`; `<data_dir>/keys` when unset.
    pub key_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub cache_capacity_mb: u64,
    pub flush_every_ms: Option<u64>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            root_history_size: DEFAULT_ROOT_HISTORY_SIZE,
            domain: DomainConfig::default(),
            verifier: VerifierConfig::default(),
            storage: StorageSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            entry_point: ENTRY_POINT_V06,
            chain_id: DEFAULT_CHAIN_ID,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        let defaults = StorageConfig::default();
        Self {
            cache_capacity_mb: defaults.cache_capacity_bytes / (1024 * 1024),
            flush_every_ms: defaults.flush_every_ms,
        }
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".semaccount"))
        .unwrap_or_else(|| PathBuf::from("/var/lib/semaccount"))
}

impl ValidatorConfig {
    pub fn load(path: impl AsRef<Path>) -> SemaResult<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| SemaError::Config(format!("Failed to read config: {}", e)))?;

            toml::from_str(&contents)
                .map_err(|e| SemaError::Config(format!("Failed to parse config: {}", e)))?
        } else {
            info!("Config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> SemaResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| SemaError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SemaError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path.as_ref(), contents)
            .map_err(|e| SemaError::Config(format!("Failed to write config: {}", e)))?;

        info!("Configuration saved to {:?}", path.as_ref());
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = var("SEMACCOUNT_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }

        if let Some(chain_id) = var("SEMACCOUNT_CHAIN_ID").and_then(|v| v.parse().ok()) {
            self.domain.chain_id = chain_id;
        }

        if let Some(entry_point) = var("SEMACCOUNT_ENTRY_POINT").and_then(|v| v.parse().ok()) {
            self.domain.entry_point = entry_point;
        }

        if let Some(dir) = var("SEMACCOUNT_KEY_DIR") {
            self.verifier.key_dir = Some(PathBuf::from(dir));
        }

        if let Some(level) = var("SEMACCOUNT_LOG_LEVEL") {
            self.logging.level = LogLevel::parse(&level).unwrap_or(LogLevel::Info);
        }

        if var("SEMACCOUNT_LOG_JSON").is_some() {
            self.logging.json = true;
        }
    }

    pub fn validate(&self) -> SemaResult<()> {
        if self.root_history_size == 0 || self.root_history_size > MAX_ROOT_HISTORY_SIZE {
            return Err(SemaError::Config(format!(
                "root_history_size must be between 1 and {}",
                MAX_ROOT_HISTORY_SIZE
            )));
        }

        if self.domain.chain_id == 0 {
            return Err(SemaError::Config("domain.chain_id must be non-zero".into()));
        }

        if self.domain.entry_point == Address::ZERO {
            return Err(SemaError::Config("domain.entry_point must be set".into()));
        }

        if self.storage.cache_capacity_mb == 0 {
            return Err(SemaError::Config("storage.cache_capacity_mb must be non-zero".into()));
        }

        Ok(())
    }

    pub fn domain_context(&self) -> DomainContext {
        DomainContext::new(self.domain.entry_point, self.domain.chain_id)
    }

    pub fn key_dir(&self) -> PathBuf {
        self.verifier
            .key_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("keys"))
    }

    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            path: self.data_dir.join("db"),
            cache_capacity_bytes: self.storage.cache_capacity_mb * 1024 * 1024,
            flush_every_ms: self.storage.flush_every_ms,
        }
    }
}
