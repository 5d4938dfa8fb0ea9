use thiserror::Error;

/// Aggregated error surface for the whole runtime, matching the teacher's
/// own `AgentError`-aggregation-by-`#[from]` pattern (`agent/src/error.rs`)
/// except this crate has no protocol-specific error code to map onto --
/// every variant here just carries the underlying subsystem's error.
#[derive(Debug, Error)]
pub enum SuperAgentError {
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("orchestrator error: {0}")]
    Orchestrator(#[from] superagent_agents::OrchestratorError),

    #[error("ux error: {0}")]
    Ux(#[from] superagent_ux::UxError),

    #[error("provider error: {0}")]
    Provider(#[from] superagent_providers::ProviderError),

    #[error("executor error: {0}")]
    Executor(#[from] superagent_executor::ExecutorError),

    #[error("protocol error: {0}")]
    Protocol(#[from] superagent_protocol::ProtocolError),
}
