//! Typed pub/sub event bus (spec §4.2): bounded history, concurrent
//! per-type fan-out, and a broadcast stream for headless NDJSON export.

pub mod bus;
pub mod error;
pub mod event;
pub mod handler;

pub use bus::{EventBus, SubscriptionToken};
pub use error::EventBusError;
pub use event::{AgentEvent, AgentEventKind, EventType};
pub use handler::EventHandler;
