use serde::{Deserialize, Serialize};
use serde_json::Value;

use superagent_types::{CheckpointId, CorrelationId, EventId, SessionId};

/// One occurrence on the bus. Carries enough identity (`id`, `seq`) to be
/// deduplicated and enough correlation (`correlation_id`) to be traced
/// across the orchestrator, executor, and memory subsystems it crosses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEvent {
    pub id: EventId,
    pub seq: u64,
    pub timestamp: i64,
    pub session_id: SessionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
    pub kind: AgentEventKind,
}

impl AgentEvent {
    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }
}

/// Payload of an [`AgentEvent`]. Variants and field names mirror the
/// headless NDJSON event catalog; the dotted `event` name used on the wire
/// is produced by [`AgentEventKind::wire_name`] rather than encoded in the
/// serde tag, since internal consumers want Rust-idiomatic discriminants
/// while the NDJSON surface wants `session.started`-style names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEventKind {
    /// Internal orchestration events (spec §4.3): these coordinate the
    /// Planner/Executor/Memory/Monitor agents over the bus and do not
    /// themselves appear on the headless NDJSON surface (spec §6), which
    /// is why they carry loosely-typed `Value` payloads rather than the
    /// more rigid shapes used by the wire-facing variants below.
    PlanRequested {
        task_id: String,
        goal: String,
        task: Value,
        context: Value,
    },
    PlanReady {
        plan: Value,
    },
    PlanFailed {
        error: String,
    },
    PlanCompleted {
        result: Value,
    },
    StepRequested {
        step: Value,
    },
    StepCompleted {
        step_id: String,
        output: Value,
    },
    ContextRequested {
        query: String,
        k: usize,
    },
    ContextProvided {
        contexts: Value,
    },
    SessionStarted {
        #[serde(skip_serializing_if = "Option::is_none")]
        checkpoint_id: Option<CheckpointId>,
        metadata: Value,
    },
    SessionRestored {
        #[serde(skip_serializing_if = "Option::is_none")]
        checkpoint_id: Option<CheckpointId>,
        metadata: Value,
    },
    SessionCheckpointed {
        #[serde(skip_serializing_if = "Option::is_none")]
        checkpoint_id: Option<CheckpointId>,
        metadata: Value,
    },
    PlanCreated {
        steps: Vec<Value>,
        intent: String,
        confidence: f64,
    },
    PlanStepStarted {
        step_index: usize,
        step_name: String,
    },
    PlanStepFinished {
        step_index: usize,
        step_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
    },
    ToolRequested {
        tool_name: String,
        tool_args: Value,
        requires_consent: bool,
    },
    ToolApproved {
        tool_name: String,
        tool_args: Value,
        requires_consent: bool,
    },
    ToolRejected {
        tool_name: String,
        tool_args: Value,
        requires_consent: bool,
    },
    ToolResult {
        tool_name: String,
        tool_args: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        requires_consent: bool,
    },
    DiffPreview {
        file_path: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        diff_content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        checkpoint_id: Option<CheckpointId>,
    },
    DiffApplied {
        file_path: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        hunks_applied: Option<Vec<usize>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        checkpoint_id: Option<CheckpointId>,
    },
    DiffPartialApplied {
        file_path: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        hunks_applied: Option<Vec<usize>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        checkpoint_id: Option<CheckpointId>,
    },
    DiffRollback {
        file_path: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        checkpoint_id: Option<CheckpointId>,
    },
    ErrorUser {
        error_type: String,
        error_message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_details: Option<Value>,
        recoverable: bool,
    },
    ErrorSystem {
        error_type: String,
        error_message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_details: Option<Value>,
        recoverable: bool,
    },
    ErrorTool {
        error_type: String,
        error_message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_details: Option<Value>,
        recoverable: bool,
    },
    MetricsTick {
        metrics: Value,
    },
    UserCancel,
}

/// Fieldless discriminant of [`AgentEventKind`], used as the subscription
/// key for [`crate::bus::EventBus::subscribe`] and the filter in
/// [`crate::bus::EventBus::get_history`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    PlanRequested,
    PlanReady,
    PlanFailed,
    PlanCompleted,
    StepRequested,
    StepCompleted,
    ContextRequested,
    ContextProvided,
    SessionStarted,
    SessionRestored,
    SessionCheckpointed,
    PlanCreated,
    PlanStepStarted,
    PlanStepFinished,
    ToolRequested,
    ToolApproved,
    ToolRejected,
    ToolResult,
    DiffPreview,
    DiffApplied,
    DiffPartialApplied,
    DiffRollback,
    ErrorUser,
    ErrorSystem,
    ErrorTool,
    MetricsTick,
    UserCancel,
}

impl AgentEventKind {
    pub fn event_type(&self) -> EventType {
        match self {
            AgentEventKind::PlanRequested { .. } => EventType::PlanRequested,
            AgentEventKind::PlanReady { .. } => EventType::PlanReady,
            AgentEventKind::PlanFailed { .. } => EventType::PlanFailed,
            AgentEventKind::PlanCompleted { .. } => EventType::PlanCompleted,
            AgentEventKind::StepRequested { .. } => EventType::StepRequested,
            AgentEventKind::StepCompleted { .. } => EventType::StepCompleted,
            AgentEventKind::ContextRequested { .. } => EventType::ContextRequested,
            AgentEventKind::ContextProvided { .. } => EventType::ContextProvided,
            AgentEventKind::SessionStarted { .. } => EventType::SessionStarted,
            AgentEventKind::SessionRestored { .. } => EventType::SessionRestored,
            AgentEventKind::SessionCheckpointed { .. } => EventType::SessionCheckpointed,
            AgentEventKind::PlanCreated { .. } => EventType::PlanCreated,
            AgentEventKind::PlanStepStarted { .. } => EventType::PlanStepStarted,
            AgentEventKind::PlanStepFinished { .. } => EventType::PlanStepFinished,
            AgentEventKind::ToolRequested { .. } => EventType::ToolRequested,
            AgentEventKind::ToolApproved { .. } => EventType::ToolApproved,
            AgentEventKind::ToolRejected { .. } => EventType::ToolRejected,
            AgentEventKind::ToolResult { .. } => EventType::ToolResult,
            AgentEventKind::DiffPreview { .. } => EventType::DiffPreview,
            AgentEventKind::DiffApplied { .. } => EventType::DiffApplied,
            AgentEventKind::DiffPartialApplied { .. } => EventType::DiffPartialApplied,
            AgentEventKind::DiffRollback { .. } => EventType::DiffRollback,
            AgentEventKind::ErrorUser { .. } => EventType::ErrorUser,
            AgentEventKind::ErrorSystem { .. } => EventType::ErrorSystem,
            AgentEventKind::ErrorTool { .. } => EventType::ErrorTool,
            AgentEventKind::MetricsTick { .. } => EventType::MetricsTick,
            AgentEventKind::UserCancel => EventType::UserCancel,
        }
    }

    /// Dotted event name for the headless NDJSON surface, e.g. `plan.created`.
    pub fn wire_name(&self) -> &'static str {
        match self {
            AgentEventKind::PlanRequested { .. } => "internal.plan_requested",
            AgentEventKind::PlanReady { .. } => "internal.plan_ready",
            AgentEventKind::PlanFailed { .. } => "internal.plan_failed",
            AgentEventKind::PlanCompleted { .. } => "internal.plan_completed",
            AgentEventKind::StepRequested { .. } => "internal.step_requested",
            AgentEventKind::StepCompleted { .. } => "internal.step_completed",
            AgentEventKind::ContextRequested { .. } => "internal.context_requested",
            AgentEventKind::ContextProvided { .. } => "internal.context_provided",
            AgentEventKind::SessionStarted { .. } => "session.started",
            AgentEventKind::SessionRestored { .. } => "session.restored",
            AgentEventKind::SessionCheckpointed { .. } => "session.checkpointed",
            AgentEventKind::PlanCreated { .. } => "plan.created",
            AgentEventKind::PlanStepStarted { .. } => "plan.step_started",
            AgentEventKind::PlanStepFinished { .. } => "plan.step_finished",
            AgentEventKind::ToolRequested { .. } => "tool.requested",
            AgentEventKind::ToolApproved { .. } => "tool.approved",
            AgentEventKind::ToolRejected { .. } => "tool.rejected",
            AgentEventKind::ToolResult { .. } => "tool.result",
            AgentEventKind::DiffPreview { .. } => "diff.preview",
            AgentEventKind::DiffApplied { .. } => "diff.applied",
            AgentEventKind::DiffPartialApplied { .. } => "diff.partial_applied",
            AgentEventKind::DiffRollback { .. } => "diff.rollback",
            AgentEventKind::ErrorUser { .. } => "error.user",
            AgentEventKind::ErrorSystem { .. } => "error.system",
            AgentEventKind::ErrorTool { .. } => "error.tool",
            AgentEventKind::MetricsTick { .. } => "metrics.tick",
            AgentEventKind::UserCancel => "user.cancel",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_name_matches_event_type_family() {
        let kind = AgentEventKind::PlanCreated {
            steps: Vec::new(),
            intent: "do the thing".into(),
            confidence: 0.9,
        };
        assert_eq!(kind.wire_name(), "plan.created");
        assert_eq!(kind.event_type(), EventType::PlanCreated);
    }
}
