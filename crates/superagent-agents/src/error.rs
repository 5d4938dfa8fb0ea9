use thiserror::Error;

/// Errors surfaced by the orchestrator and specialist agents (spec §7,
/// grounded on `agent/src/error.rs`'s `thiserror`-derived `AgentError`).
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("planning failed: {0}")]
    PlanFailed(String),

    #[error("execute_goal timed out waiting for a terminal event")]
    Timeout,

    #[error("execute_goal was cancelled")]
    Cancelled,

    #[error("plan validation error: {0}")]
    InvalidPlan(#[from] superagent_types::PlanValidationError),

    #[error("provider error: {0}")]
    Provider(#[from] superagent_providers::ProviderError),

    #[error("executor error: {0}")]
    Executor(#[from] superagent_executor::ExecutorError),

    #[error("internal: {0}")]
    Internal(String),
}
