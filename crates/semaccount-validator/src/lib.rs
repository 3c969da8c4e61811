#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod accumulator;
pub mod config;
pub mod ledger;
pub mod operation_hash;
pub mod registry;
pub mod storage;
pub mod validator;

pub use accumulator::{CommitmentAccumulator, DEFAULT_ROOT_HISTORY_SIZE};
pub use config::{LoggingConfig, LogLevel, ValidatorConfig, ENTRY_POINT_V06};
pub use ledger::{InMemoryNullifierLedger, NullifierLedger, SledNullifierLedger};
pub use operation_hash::{operation_signal, pack_user_operation, user_operation_hash};
pub use registry::{MemberInsertion, ScopeInfo, ScopeRegistry};
pub use storage::{StorageConfig, ValidatorStorage};
pub use validator::{
    RejectReason, StatsSnapshot, ValidationOutcome, ValidationState, ValidationTrace, Validator,
    ValidatorStats,
};
