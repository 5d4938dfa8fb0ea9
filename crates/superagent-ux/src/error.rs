use thiserror::Error;

#[derive(Debug, Error)]
pub enum UxError {
    #[error("cannot {0} while in state {1}")]
    InvalidTransition(&'static str, &'static str),
    #[error("no checkpoint {0} on record")]
    UnknownCheckpoint(String),
    #[error("intent resolution failed: {0}")]
    IntentResolution(String),
    #[error("planning failed: {0}")]
    Planning(String),
    #[error("provider error: {0}")]
    Provider(#[from] superagent_providers::ProviderError),
    #[error("orchestrator error: {0}")]
    Orchestrator(#[from] superagent_agents::OrchestratorError),
    #[error("executor error: {0}")]
    Executor(#[from] superagent_executor::ExecutorError),
    #[error("io error reading context file {path}: {source}")]
    Io { path: String, source: std::io::Error },
}
