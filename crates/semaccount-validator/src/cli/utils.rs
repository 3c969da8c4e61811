use super::commands::Cli;
use anyhow::Context;
use semaccount_types::UserOperation;
use semaccount_validator::LoggingConfig;
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Flags win over the config file; `RUST_LOG` wins over both.
pub fn init_logging(cli: &Cli, config: &LoggingConfig) -> anyhow::Result<()> {
    let level = if cli.quiet {
        "warn".to_string()
    } else {
        match cli.verbose {
            0 => config.level.to_string(),
            1 => "info,semaccount_validator=debug,semaccount_crypto=debug".to_string(),
            2 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry()
        .with(env_filter);

    let log_file = cli.log_file.as_ref().or(config.file.as_ref());
    if let Some(log_file) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .with_context(|| format!("Failed to open log file {}", log_file.display()))?;
        let file_layer = fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false);
        if config.json {
            subscriber.with(file_layer.json()).try_init()?;
        } else {
            subscriber.with(file_layer).try_init()?;
        }
    } else if config.json {
        subscriber.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()?;
    } else {
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(cli.verbose >= 2);
        subscriber.with(stderr_layer).try_init()?;
    }

    Ok(())
}

pub fn load_operation(path: &Path) -> anyhow::Result<UserOperation> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a user operation", path.display()))
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
