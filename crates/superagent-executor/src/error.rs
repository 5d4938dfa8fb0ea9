/// Error taxonomy for the transactional tool executor (spec §7).
///
/// `ToolNotFound`/`ToolValidation` are synchronous and non-retryable and
/// abort the enclosing transaction immediately; `ToolTimeout`/
/// `ToolExecutionFailed` are retried by the caller up to a step's
/// `max_retries` before the transaction rolls back.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecutorError {
    #[error("tool not found: {0}")]
    ToolNotFound(String),
    #[error("tool parameter validation failed: {0}")]
    ToolValidation(String),
    #[error("tool timed out: {0}")]
    ToolTimeout(String),
    #[error("tool execution failed: {0}")]
    ToolExecutionFailed(String),
    #[error("snapshot error: {0}")]
    Snapshot(String),
    #[error("transaction cancelled")]
    Cancelled,
}

impl ExecutorError {
    /// Whether the enclosing transaction should roll back on this error,
    /// as opposed to a validation failure that never reached Phase 2.
    pub fn triggers_rollback(&self) -> bool {
        !matches!(self, ExecutorError::ToolNotFound(_) | ExecutorError::ToolValidation(_))
    }
}
