use super::commands::OutputFormat;
use super::utils::{load_operation, print_json};
use semaccount_types::{DomainContext, ScopeId};
use semaccount_validator::{user_operation_hash, Validator};
use std::path::Path;

pub async fn validate_operation(
    validator: &Validator,
    domain: &DomainContext,
    operation: &Path,
    compact_scope: Option<ScopeId>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let op = load_operation(operation)?;
    let operation_hash = user_operation_hash(&op, domain);

    let outcome = match compact_scope {
        Some(scope) => validator.validate_compact_user_op(&op, &scope, domain).await?,
        None => validator.validate_user_op(&op, domain).await?,
    };
    validator.registry().flush()?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "operation_hash": operation_hash,
            "sender": op.sender,
            "outcome": outcome,
            "validation_data": outcome.validation_data(),
        }))?,
        OutputFormat::Text => {
            let color = if outcome.is_accepted() { "46" } else { "196" };
            println!("Operation:       {}", operation_hash);
            println!("Sender:          {}", op.sender);
            println!("Outcome:         \x1b[38;5;{}m{}\x1b[0m", color, outcome);
            println!("validationData:  {}", outcome.validation_data());
        }
    }

    Ok(())
}
