use super::commands::OutputFormat;
use super::utils::{load_operation, print_json};
use semaccount_types::DomainContext;
use semaccount_validator::{operation_signal, user_operation_hash};
use std::path::Path;

pub fn hash_operation(domain: &DomainContext, operation: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let op = load_operation(operation)?;
    let operation_hash = user_operation_hash(&op, domain);
    let signal = operation_signal(&op, domain);

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "entry_point": domain.entry_point,
            "chain_id": domain.chain_id,
            "operation_hash": operation_hash,
            "signal": signal,
        }))?,
        OutputFormat::Text => {
            println!("Entry point:     {}", domain.entry_point);
            println!("Chain id:        {}", domain.chain_id);
            println!("Operation hash:  {}", operation_hash);
            println!("Signal (field):  {}", signal.to_hex());
        }
    }

    Ok(())
}
