//! Transactional tool executor (spec §4.4): a tool registry with shared
//! parameter-schema validation, a copy-based filesystem checkpoint/rollback
//! backend, and a two-phase validate/execute runner with per-call timeouts
//! and cooperative cancellation.

pub mod error;
pub mod registry;
pub mod schema;
pub mod snapshot;
pub mod tool;
pub mod transaction;

pub use error::ExecutorError;
pub use registry::ToolRegistry;
pub use schema::{ParamSchema, ParamType, ToolSchema};
pub use snapshot::SnapshotManager;
pub use tool::Tool;
pub use transaction::{TransactionResult, TransactionalExecutor};
