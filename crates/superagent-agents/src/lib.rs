//! Orchestrator and specialist agents (spec §4.3): Planner, Executor,
//! Memory, and Monitor agents coordinate a goal's lifecycle purely
//! through the event bus, with the Orchestrator exposing the single
//! public `execute_goal` operation.

pub mod error;
pub mod executor_agent;
pub mod memory_agent;
pub mod monitor;
pub mod orchestrator;
pub mod planner;

pub use error::OrchestratorError;
pub use executor_agent::ExecutorAgent;
pub use memory_agent::MemoryAgent;
pub use monitor::{HealthStatus, MonitorAgent};
pub use orchestrator::{GoalOutcome, GoalStatus, Orchestrator};
pub use planner::PlannerAgent;
