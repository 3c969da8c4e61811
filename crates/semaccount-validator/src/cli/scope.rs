use super::commands::{OutputFormat, ScopeAction};
use super::utils::print_json;
use semaccount_crypto::fr_to_word;
use semaccount_types::{Commitment, ScopeId};
use semaccount_validator::ScopeRegistry;

pub async fn handle_scope(
    action: ScopeAction,
    registry: &ScopeRegistry,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match action {
        ScopeAction::Create { scope, depth } => create_scope(registry, scope, depth, format).await?,
        ScopeAction::Add { scope, commitment } => add_member(registry, scope, commitment, format).await?,
        ScopeAction::Root { scope } => show_root(registry, scope, format).await?,
        ScopeAction::Info { scope: Some(scope) } => show_scope(registry, scope, format).await?,
        ScopeAction::Info { scope: None } => list_scopes(registry, format).await?,
        ScopeAction::Path { scope, commitment } => show_path(registry, scope, commitment, format).await?,
    }

    registry.flush()?;
    Ok(())
}

async fn create_scope(
    registry: &ScopeRegistry,
    scope: ScopeId,
    depth: usize,
    format: OutputFormat,
) -> anyhow::Result<()> {
    registry.create_scope(scope, depth).await?;
    let info = registry.scope_info(&scope).await?;

    match format {
        OutputFormat::Json => print_json(&info)?,
        OutputFormat::Text => {
            println!("\x1b[38;5;46m[+]\x1b[0m Created scope {}", scope);
            println!("  Depth:    {}", info.depth);
            println!("  Capacity: {}", info.capacity);
        }
    }
    Ok(())
}

async fn add_member(
    registry: &ScopeRegistry,
    scope: ScopeId,
    commitment: Commitment,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let insertion = registry.insert_member(&scope, commitment).await?;

    match format {
        OutputFormat::Json => print_json(&insertion)?,
        OutputFormat::Text => {
            println!("\x1b[38;5;46m[+]\x1b[0m Added {} to scope {}", commitment, scope);
            println!("  Leaf index: {}", insertion.leaf_index);
            println!("  New root:   {}", insertion.root);
        }
    }
    Ok(())
}

async fn show_root(registry: &ScopeRegistry, scope: ScopeId, format: OutputFormat) -> anyhow::Result<()> {
    let root = registry.current_root(&scope).await?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "scope": scope, "root": root }))?,
        OutputFormat::Text => println!("{}", root),
    }
    Ok(())
}

async fn show_scope(registry: &ScopeRegistry, scope: ScopeId, format: OutputFormat) -> anyhow::Result<()> {
    let info = registry.scope_info(&scope).await?;

    match format {
        OutputFormat::Json => print_json(&info)?,
        OutputFormat::Text => {
            println!("\x1b[38;5;46mScope {}\x1b[0m", info.scope);
            println!("\x1b[38;5;245m{}\x1b[0m", "═".repeat(50));
            println!("  Depth:        {}", info.depth);
            println!("  Members:      {} / {}", info.members, info.capacity);
            println!("  Current root: {}", info.current_root);
            println!("  Known roots:  {}", info.known_roots.len());
            for root in &info.known_roots {
                println!("    {}", root);
            }
        }
    }
    Ok(())
}

async fn list_scopes(registry: &ScopeRegistry, format: OutputFormat) -> anyhow::Result<()> {
    let mut infos = Vec::new();
    for scope in registry.scopes().await {
        infos.push(registry.scope_info(&scope).await?);
    }

    match format {
        OutputFormat::Json => print_json(&infos)?,
        OutputFormat::Text => {
            if infos.is_empty() {
                println!("No scopes. Create one with: semaccount scope create <SCOPE>");
            }
            for info in &infos {
                println!(
                    "{:<24} depth {:<3} members {:<8} root {}",
                    info.scope.to_string(),
                    info.depth,
                    info.members,
                    info.current_root
                );
            }
        }
    }
    Ok(())
}

async fn show_path(
    registry: &ScopeRegistry,
    scope: ScopeId,
    commitment: Commitment,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let Some(path) = registry.membership_path(&scope, &commitment).await? else {
        anyhow::bail!("{} is not a member of scope {}", commitment, scope);
    };
    let root = registry.current_root(&scope).await?;
    let siblings: Vec<String> = path
        .siblings
        .iter()
        .map(|s| format!("0x{}", hex::encode(fr_to_word(s))))
        .collect();

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "scope": scope,
            "root": root,
            "leaf_index": path.leaf_index,
            "siblings": siblings,
            "path_indices": path.path_indices,
        }))?,
        OutputFormat::Text => {
            println!("Leaf index: {}", path.leaf_index);
            println!("Root:       {}", root);
            for (level, (sibling, is_right)) in siblings.iter().zip(&path.path_indices).enumerate() {
                let side = if *is_right { "R" } else { "L" };
                println!("  {:>2} {} {}", level, side, sibling);
            }
        }
    }
    Ok(())
}
