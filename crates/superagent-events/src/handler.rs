use std::time::Duration;

use async_trait::async_trait;

use crate::error::EventBusError;
use crate::event::AgentEvent;

/// A typed event subscriber. Implementors are invoked concurrently with
/// every other handler registered for the same [`crate::event::EventType`];
/// a failing or slow handler never blocks the others (spec §4.2).
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &AgentEvent) -> Result<(), EventBusError>;

    /// Per-handler deadline. `None` (the default) means no timeout.
    fn deadline(&self) -> Option<Duration> {
        None
    }
}
