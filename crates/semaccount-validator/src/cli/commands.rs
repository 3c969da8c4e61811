use clap::{Parser, Subcommand, ValueEnum};
use semaccount_types::{Commitment, ScopeId, DEFAULT_TREE_DEPTH};
use std::path::PathBuf;

const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "semaccount")]
#[command(version = BUILD_VERSION)]
#[command(about = "Anonymous group-membership authorization for ERC-4337 smart accounts")]
#[command(long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(short, long, global = true, value_name = "FILE", help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[arg(short = 'd', long, global = true, value_name = "DIR", env = "SEMACCOUNT_DATA_DIR", help = "Data directory path")]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase verbosity (-v, -vv, -vvv)")]
    pub verbose: u8,

    #[arg(short, long, global = true, help = "Suppress non-error output")]
    pub quiet: bool,

    #[arg(long, global = true, value_name = "FILE", help = "Write logs to file")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text", help = "Output format")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Initialize the data directory")]
    #[command(long_about = "Write a default config.toml and create the database and key directories.")]
    Init {
        #[arg(short, long, help = "Overwrite existing configuration")]
        force: bool,
    },

    #[command(about = "Manage scopes and their members")]
    Scope {
        #[command(subcommand)]
        action: ScopeAction,
    },

    #[command(about = "Validate a user operation")]
    #[command(long_about = "Validate a user operation read from a JSON file.\n\nThe signature must hold the full proof envelope, or the compact encoding when --scope binds the account to a scope.\nAn accepted operation consumes its nullifier.")]
    Validate {
        #[arg(short, long, value_name = "FILE", help = "User operation JSON")]
        operation: PathBuf,
        #[arg(short, long, help = "Decode a compact signature for this scope")]
        scope: Option<ScopeId>,
    },

    #[command(about = "Print the operation hash and signal of a user operation")]
    Hash {
        #[arg(short, long, value_name = "FILE", help = "User operation JSON")]
        operation: PathBuf,
    },

    #[command(about = "Show persisted validator statistics")]
    Stats,
}

#[derive(Subcommand)]
pub enum ScopeAction {
    #[command(about = "Create an empty scope")]
    Create {
        scope: ScopeId,
        #[arg(long, default_value_t = DEFAULT_TREE_DEPTH, help = "Merkle tree depth")]
        depth: usize,
    },

    #[command(about = "Add a member commitment")]
    Add {
        scope: ScopeId,
        commitment: Commitment,
    },

    #[command(about = "Show the current root")]
    Root {
        scope: ScopeId,
    },

    #[command(about = "Show scope details, or list every scope")]
    Info {
        scope: Option<ScopeId>,
    },

    #[command(about = "Show the membership path of a commitment")]
    Path {
        scope: ScopeId,
        commitment: Commitment,
    },
}
