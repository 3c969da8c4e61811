use super::commands::OutputFormat;
use super::utils::print_json;
use semaccount_validator::{ScopeRegistry, ValidatorStorage};

pub async fn show_stats(
    registry: &ScopeRegistry,
    storage: &ValidatorStorage,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let scopes = registry.scopes().await;
    let mut members = 0u64;
    for scope in &scopes {
        members += registry.scope_info(scope).await?.members;
    }
    let nullifiers_used = registry.nullifiers_used()?;
    let schema_version = storage.schema_version()?;
    let size_on_disk = storage.size_on_disk();

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "scopes": scopes.len(),
            "members": members,
            "nullifiers_used": nullifiers_used,
            "root_history_size": registry.root_history_size(),
            "schema_version": schema_version,
            "size_on_disk": size_on_disk,
        }))?,
        OutputFormat::Text => {
            println!("\x1b[38;5;46mValidator Statistics\x1b[0m");
            println!("\x1b[38;5;245m{}\x1b[0m", "═".repeat(50));
            println!("  Scopes:            {}", scopes.len());
            println!("  Members:           {}", members);
            println!("  Nullifiers used:   {}", nullifiers_used);
            println!("  Root history size: {}", registry.root_history_size());
            match schema_version {
                Some(version) => println!("  Schema version:    {}", version),
                None => println!("  Schema version:    none"),
            }
            println!("  Size on disk:      {} KiB", size_on_disk / 1024);
        }
    }

    Ok(())
}
