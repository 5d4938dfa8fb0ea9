//! Diff-first UX pipeline (spec §4.6, §4.7): a state machine driving
//! parse -> resolve intent -> plan -> preview -> confirm -> execute, a
//! unified-diff engine, a cached context fusion service, and a context
//! health monitor.

pub mod context_fusion;
pub mod diff;
pub mod error;
pub mod health;
pub mod intent;
pub mod state_machine;

pub use context_fusion::ContextFusion;
pub use diff::{DiffEngine, DiffPreview, FileChange, FileDiff};
pub use error::UxError;
pub use health::{ContextHealth, ContextHealthMonitor, HealthStatus};
pub use intent::{Intent, IntentClassification, IntentResolver};
pub use state_machine::{ExecutionOutcome, UxContext, UxStateMachine, UxStateName, UxTransitionCallback};
