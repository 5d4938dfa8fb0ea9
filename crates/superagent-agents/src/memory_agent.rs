use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use superagent_events::{AgentEvent, AgentEventKind, EventBus, EventBusError, EventHandler};
use superagent_memory::AdaptiveMemory;

/// Subscribes to `STEP_COMPLETED` (persisting observations) and
/// `CONTEXT_REQUEST` (answering with a retrieval result), per spec §4.3
/// MemoryAgent. Grounded on the teacher's session-store write path
/// (`agent/src/session/compaction.rs`, `pruning.rs`), adapted to the
/// three-tier store in `superagent-memory`.
pub struct MemoryAgent {
    memory: Arc<AdaptiveMemory>,
    bus: Arc<EventBus>,
}

impl MemoryAgent {
    pub fn new(memory: Arc<AdaptiveMemory>, bus: Arc<EventBus>) -> Self {
        Self { memory, bus }
    }
}

#[async_trait]
impl EventHandler for MemoryAgent {
    async fn handle(&self, event: &AgentEvent) -> Result<(), EventBusError> {
        match &event.kind {
            AgentEventKind::StepCompleted { step_id, output } => {
                let content = output.as_str().map(str::to_string).unwrap_or_else(|| output.to_string());
                self.memory.add_working(format!("[{step_id}] {content}"), now()).await;
            }
            AgentEventKind::ContextRequested { query, k } => {
                let results = self.memory.retrieve_default(query, *k, now()).await;
                let contexts = json!(results
                    .iter()
                    .map(|r| json!({"item": r.item, "score": r.score}))
                    .collect::<Vec<_>>());
                self.bus
                    .publish(
                        event.session_id.clone(),
                        event.correlation_id.clone(),
                        AgentEventKind::ContextProvided { contexts },
                    )
                    .await;
            }
            _ => {}
        }
        Ok(())
    }
}

fn now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
