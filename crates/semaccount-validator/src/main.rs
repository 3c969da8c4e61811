mod cli;

use clap::Parser;
use cli::{
    hash_operation, handle_scope, init_logging, init_validator, show_stats, validate_operation,
    Cli, Commands,
};
use semaccount_crypto::Groth16Verifier;
use semaccount_validator::{
    config::default_data_dir, ScopeRegistry, Validator, ValidatorConfig, ValidatorStorage,
};
use std::sync::Arc;
use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let config_path = cli.config.clone().unwrap_or_else(|| data_dir.join("config.toml"));

    let mut config = ValidatorConfig::load(&config_path)?;
    if cli.data_dir.is_some() {
        config.data_dir = data_dir.clone();
    }
    init_logging(&cli, &config.logging)?;

    let domain = config.domain_context();

    match cli.command {
        Commands::Init { force } => {
            init_validator(&config_path, &data_dir, force, cli.format)?;
        }
        Commands::Hash { operation } => {
            hash_operation(&domain, &operation, cli.format)?;
        }
        Commands::Scope { action } => {
            let storage = ValidatorStorage::open(&config.storage_config())?;
            let registry = ScopeRegistry::open(storage, config.root_history_size)?;
            handle_scope(action, &registry, cli.format).await?;
        }
        Commands::Validate { operation, scope } => {
            let storage = ValidatorStorage::open(&config.storage_config())?;
            let registry = Arc::new(ScopeRegistry::open(storage, config.root_history_size)?);

            let verifier = Groth16Verifier::load_dir(&config.key_dir())?;
            if verifier.depths().is_empty() {
                warn!("No verifying keys in {:?}; every proof will be rejected", config.key_dir());
            }

            let validator = Validator::new(registry, Arc::new(verifier));
            validate_operation(&validator, &domain, &operation, scope, cli.format).await?;
        }
        Commands::Stats => {
            let storage = ValidatorStorage::open(&config.storage_config())?;
            let registry = ScopeRegistry::open(storage.clone(), config.root_history_size)?;
            show_stats(&registry, &storage, cli.format).await?;
        }
    }

    Ok(())
}
