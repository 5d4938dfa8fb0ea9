use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use superagent_events::{AgentEvent, AgentEventKind, EventBus, EventBusError, EventHandler, EventType};

/// Subscribes to every [`EventType`] and keeps running counters plus a
/// simple health signal (spec §4.3 MonitorAgent: "updating metrics
/// counters and deriving health signals"). Grounded on the teacher's
/// `event_bus.rs` observer pattern: one observer, fanned out to by the
/// bus, never itself publishing.
pub struct MonitorAgent {
    counts: Mutex<HashMap<&'static str, u64>>,
    error_count: Mutex<u64>,
    total_count: Mutex<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl MonitorAgent {
    pub fn new() -> Self {
        Self { counts: Mutex::new(HashMap::new()), error_count: Mutex::new(0), total_count: Mutex::new(0) }
    }

    /// Registers this monitor for every event type the bus knows about.
    /// Subscription is idempotent (spec §4.2), so calling this twice for
    /// the same `Arc<MonitorAgent>` is harmless.
    pub fn subscribe_all(self: &Arc<Self>, bus: &EventBus) {
        for event_type in ALL_EVENT_TYPES {
            bus.subscribe(event_type, self.clone() as Arc<dyn EventHandler>);
        }
    }

    pub fn count_for(&self, wire_name: &'static str) -> u64 {
        self.counts.lock().get(wire_name).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        *self.total_count.lock()
    }

    /// Crude health signal: unhealthy once errors exceed 20% of total
    /// events observed, degraded above 5%, healthy otherwise.
    pub fn health(&self) -> HealthStatus {
        let total = *self.total_count.lock();
        if total == 0 {
            return HealthStatus::Healthy;
        }
        let errors = *self.error_count.lock();
        let ratio = errors as f64 / total as f64;
        if ratio > 0.2 {
            HealthStatus::Unhealthy
        } else if ratio > 0.05 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}

impl Default for MonitorAgent {
    fn default() -> Self {
        Self::new()
    }
}

const ALL_EVENT_TYPES: [EventType; 27] = [
    EventType::PlanRequested,
    EventType::PlanReady,
    EventType::PlanFailed,
    EventType::PlanCompleted,
    EventType::StepRequested,
    EventType::StepCompleted,
    EventType::ContextRequested,
    EventType::ContextProvided,
    EventType::SessionStarted,
    EventType::SessionRestored,
    EventType::SessionCheckpointed,
    EventType::PlanCreated,
    EventType::PlanStepStarted,
    EventType::PlanStepFinished,
    EventType::ToolRequested,
    EventType::ToolApproved,
    EventType::ToolRejected,
    EventType::ToolResult,
    EventType::DiffPreview,
    EventType::DiffApplied,
    EventType::DiffPartialApplied,
    EventType::DiffRollback,
    EventType::ErrorUser,
    EventType::ErrorSystem,
    EventType::ErrorTool,
    EventType::MetricsTick,
    EventType::UserCancel,
];

#[async_trait]
impl EventHandler for MonitorAgent {
    async fn handle(&self, event: &AgentEvent) -> Result<(), EventBusError> {
        *self.total_count.lock() += 1;
        *self.counts.lock().entry(event.kind.wire_name()).or_insert(0) += 1;
        if matches!(
            event.kind,
            AgentEventKind::ErrorUser { .. } | AgentEventKind::ErrorSystem { .. } | AgentEventKind::ErrorTool { .. }
        ) {
            *self.error_count.lock() += 1;
        }
        Ok(())
    }
}
