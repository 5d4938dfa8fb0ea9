use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use superagent_events::{AgentEvent, AgentEventKind, EventBus, EventBusError, EventHandler, EventType};
use superagent_memory::AdaptiveMemory;
use superagent_types::{CorrelationId, Message, SessionId, TaskId, UnifiedContext};

use crate::error::OrchestratorError;

const DEFAULT_EXECUTE_GOAL_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalStatus {
    Completed,
    Failed,
    Timeout,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct GoalOutcome {
    pub status: GoalStatus,
    pub data: Option<Value>,
    pub error: Option<String>,
}

enum Waiter {
    Completed(Value),
    Failed(String),
}

/// Coordinates a `goal -> plan -> execute -> report` cycle through the
/// event bus (spec §4.3 Orchestrator). The only public operation is
/// [`Orchestrator::execute_goal`]; everything else happens via
/// publish/subscribe so the orchestrator never talks to an agent
/// directly, matching spec §9's cyclic-reference note ("agents know only
/// the bus").
pub struct Orchestrator {
    bus: Arc<EventBus>,
    memory: Arc<AdaptiveMemory>,
    waiters: Mutex<HashMap<CorrelationId, oneshot::Sender<Waiter>>>,
    timeout: Duration,
}

impl Orchestrator {
    pub fn new(bus: Arc<EventBus>, memory: Arc<AdaptiveMemory>) -> Arc<Self> {
        Self::new_with_timeout(bus, memory, DEFAULT_EXECUTE_GOAL_TIMEOUT)
    }

    pub fn new_with_timeout(bus: Arc<EventBus>, memory: Arc<AdaptiveMemory>, timeout: Duration) -> Arc<Self> {
        let orchestrator =
            Arc::new(Self { bus: bus.clone(), memory, waiters: Mutex::new(HashMap::new()), timeout });
        bus.subscribe(EventType::PlanCompleted, orchestrator.clone() as Arc<dyn EventHandler>);
        bus.subscribe(EventType::PlanFailed, orchestrator.clone() as Arc<dyn EventHandler>);
        orchestrator
    }

    /// Fuses context (spec §4.6 cross-reference kept lightweight here:
    /// last-10 history, active files, and a default-k memory retrieval;
    /// the fuller cached fusion service lives in `superagent-ux`), then
    /// publishes `PLAN_REQUESTED` and awaits a terminal event for the
    /// fresh `correlation_id` (spec §4.3).
    pub async fn execute_goal(
        &self,
        goal: &str,
        session_id: SessionId,
        history: Option<Vec<Message>>,
        files: Option<Vec<String>>,
    ) -> GoalOutcome {
        let correlation_id = CorrelationId::generate();
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().insert(correlation_id.clone(), tx);

        let context = self.fuse_context(session_id.clone(), history, files).await;
        let task_id = TaskId::generate();
        let task = json!({"id": task_id.to_string(), "description": goal, "max_steps": 20});

        self.bus
            .publish(
                session_id,
                Some(correlation_id.clone()),
                AgentEventKind::PlanRequested {
                    task_id: task_id.to_string(),
                    goal: goal.to_string(),
                    task,
                    context: serde_json::to_value(&context).unwrap_or(Value::Null),
                },
            )
            .await;

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(Waiter::Completed(data))) => {
                GoalOutcome { status: GoalStatus::Completed, data: Some(data), error: None }
            }
            Ok(Ok(Waiter::Failed(error))) => {
                GoalOutcome { status: GoalStatus::Failed, data: None, error: Some(error) }
            }
            Ok(Err(_)) => GoalOutcome {
                status: GoalStatus::Cancelled,
                data: None,
                error: Some(OrchestratorError::Cancelled.to_string()),
            },
            Err(_) => {
                self.waiters.lock().remove(&correlation_id);
                GoalOutcome {
                    status: GoalStatus::Timeout,
                    data: None,
                    error: Some(OrchestratorError::Timeout.to_string()),
                }
            }
        }
    }

    async fn fuse_context(
        &self,
        session_id: SessionId,
        history: Option<Vec<Message>>,
        files: Option<Vec<String>>,
    ) -> UnifiedContext {
        let mut context = UnifiedContext::empty(session_id);
        if let Some(history) = history {
            let start = history.len().saturating_sub(10);
            context.conversation_history = history[start..].to_vec();
        }
        context.active_files = files.unwrap_or_default();

        let query = context
            .conversation_history
            .last()
            .map(|m| m.content.as_text())
            .unwrap_or_default();
        if !query.is_empty() {
            let retrieved = self.memory.retrieve_default(&query, 5, now()).await;
            for hit in retrieved {
                context.nodes.push(superagent_types::ContextNode {
                    id: superagent_types::ContextNodeId::generate(),
                    node_type: superagent_types::ContextNodeType::Memory,
                    content: hit.item.content,
                    relevance_score: hit.score,
                    timestamp: hit.item.timestamp,
                    relationships: Vec::new(),
                });
            }
        }
        context
    }
}

fn now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

#[async_trait]
impl EventHandler for Orchestrator {
    async fn handle(&self, event: &AgentEvent) -> Result<(), EventBusError> {
        let Some(correlation_id) = event.correlation_id.clone() else {
            return Ok(());
        };
        let sender = self.waiters.lock().remove(&correlation_id);
        let Some(sender) = sender else {
            return Ok(());
        };
        match &event.kind {
            AgentEventKind::PlanCompleted { result } => {
                let _ = sender.send(Waiter::Completed(result.clone()));
            }
            AgentEventKind::PlanFailed { error } => {
                let _ = sender.send(Waiter::Failed(error.clone()));
            }
            _ => {
                self.waiters.lock().insert(correlation_id, sender);
            }
        }
        Ok(())
    }
}
