//! SuperAgent execution core.
//!
//! Assembles the provider router, event bus, adaptive memory, tool
//! registry, transactional executor, specialist agents and orchestrator,
//! UX state machine, and headless NDJSON protocol into one [`Runtime`]
//! built from a single [`RuntimeConfig`] TOML document.

pub mod config;
pub mod error;
pub mod runtime;

pub use config::{ExecutorSettings, MemorySettings, ProviderSettings, RuntimeConfig, SecuritySettings, UxSettings};
pub use error::SuperAgentError;
pub use runtime::Runtime;

pub use superagent_agents as agents;
pub use superagent_events as events;
pub use superagent_executor as executor;
pub use superagent_memory as memory;
pub use superagent_protocol as protocol;
pub use superagent_providers as providers;
pub use superagent_types as types;
pub use superagent_ux as ux;
