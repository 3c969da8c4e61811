use super::commands::OutputFormat;
use super::utils::print_json;
use anyhow::Context;
use semaccount_validator::{ValidatorConfig, ValidatorStorage};
use std::path::Path;
use tracing::info;

pub fn init_validator(
    config_path: &Path,
    data_dir: &Path,
    force: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if config_path.exists() && !force {
        println!("\x1b[38;5;226mConfiguration already exists at {:?}\x1b[0m", config_path);
        println!("Use --force to overwrite");
        return Ok(());
    }

    std::fs::create_dir_all(data_dir).context("Failed to create data directory")?;

    let config = ValidatorConfig {
        data_dir: data_dir.to_path_buf(),
        ..ValidatorConfig::default()
    };
    config.save(config_path)?;

    let key_dir = config.key_dir();
    std::fs::create_dir_all(&key_dir).context("Failed to create key directory")?;

    let storage = ValidatorStorage::open(&config.storage_config())?;
    let schema_version = storage.schema_version()?;
    storage.flush()?;
    info!("Initialized validator in {:?}", data_dir);

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "config": config_path.to_string_lossy(),
            "data_dir": data_dir.to_string_lossy(),
            "key_dir": key_dir.to_string_lossy(),
            "schema_version": schema_version,
        }))?,
        OutputFormat::Text => {
            println!("\x1b[38;5;46m[+]\x1b[0m Validator initialized");
            println!("  Config:  {:?}", config_path);
            println!("  Data:    {:?}", data_dir);
            println!("  Keys:    {:?}", key_dir);
            println!();
            println!("Next steps:");
            println!("  1. Generate verifying keys: zk-keygen generate --output {:?}", key_dir);
            println!("  2. Create a scope: semaccount scope create <SCOPE>");
        }
    }

    Ok(())
}
