mod commands;
mod hash;
mod init;
mod scope;
mod stats;
mod utils;
mod validate;

pub use commands::{Cli, Commands};
pub use hash::hash_operation;
pub use init::init_validator;
pub use scope::handle_scope;
pub use stats::show_stats;
pub use utils::init_logging;
pub use validate::validate_operation;
