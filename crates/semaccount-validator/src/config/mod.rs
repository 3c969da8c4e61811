mod logging;
mod types;
mod validator;

pub use logging::LoggingConfig;
pub use types::*;
pub use validator::{
    default_data_dir, DomainConfig, StorageSettings, ValidatorConfig, VerifierConfig,
};
