use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use superagent_agents::PlannerAgent;
use superagent_events::{AgentEvent, AgentEventKind, EventBus, EventBusError, EventHandler, EventType};
use superagent_executor::SnapshotManager;
use superagent_memory::AdaptiveMemory;
use superagent_providers::ProviderRouter;
use superagent_types::{Checkpoint, CorrelationId, Message, Plan, SessionId, TaskId};

use crate::context_fusion::ContextFusion;
use crate::diff::{DiffEngine, DiffPreview, FileChange};
use crate::error::UxError;
use crate::intent::{IntentClassification, IntentResolver};

const DEFAULT_PLAN_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_EXECUTE_TIMEOUT: Duration = Duration::from_secs(120);

/// States of the diff-first plan -> preview -> confirm -> execute pipeline
/// (spec §4.6). Grounded on the teacher's own `ExecutionState`
/// (`middleware/state.rs`): a flat enum walked by transitions that fire
/// registered callbacks, rather than a trait-object state pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UxStateName {
    Idle,
    ParsingInput,
    ResolvingIntent,
    Planning,
    Previewing,
    Confirming,
    Executing,
    Completed,
    Error,
}

#[async_trait]
pub trait UxTransitionCallback: Send + Sync {
    async fn on_transition(&self, from: UxStateName, to: UxStateName);
}

#[derive(Debug, Clone)]
pub struct UxContext {
    pub session_id: SessionId,
    pub intent: IntentClassification,
    pub plan: Plan,
    pub preview: DiffPreview,
}

#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub result: Value,
}

struct PendingExecution {
    session_id: SessionId,
    plan: Plan,
    checkpoint: Checkpoint,
    changes: Vec<FileChange>,
}

/// One-shot waiter for the first event matching `correlation_id` among a
/// fixed set of terminal event types, mirroring the orchestrator's own
/// wait pattern (`superagent_agents::Orchestrator`) but parameterized so
/// the UX layer can wait on `PLAN_READY`/`PLAN_FAILED` for a preview-only
/// pass and separately on `PLAN_COMPLETED`/`PLAN_FAILED` for execution.
struct TerminalWaiter {
    correlation_id: CorrelationId,
    sender: Mutex<Option<oneshot::Sender<AgentEvent>>>,
}

#[async_trait]
impl EventHandler for TerminalWaiter {
    async fn handle(&self, event: &AgentEvent) -> Result<(), EventBusError> {
        if event.correlation_id.as_ref() != Some(&self.correlation_id) {
            return Ok(());
        }
        if let Some(sender) = self.sender.lock().take() {
            let _ = sender.send(event.clone());
        }
        Ok(())
    }
}

async fn await_terminal(
    bus: &EventBus,
    correlation_id: CorrelationId,
    terminal_types: &[EventType],
    timeout: Duration,
) -> Option<AgentEvent> {
    let (tx, rx) = oneshot::channel();
    let waiter = Arc::new(TerminalWaiter { correlation_id, sender: Mutex::new(Some(tx)) });
    let mut tokens = Vec::with_capacity(terminal_types.len());
    for event_type in terminal_types {
        tokens.push((*event_type, bus.subscribe(*event_type, waiter.clone() as Arc<dyn EventHandler>)));
    }
    let result = tokio::time::timeout(timeout, rx).await.ok().and_then(Result::ok);
    for (event_type, token) in tokens {
        bus.unsubscribe(event_type, token);
    }
    result
}

/// Drives one goal through the diff-first pipeline described in spec §4.6:
/// parse input, resolve intent, plan (without executing), preview file
/// diffs, halt for confirmation, then execute and checkpoint. Built on top
/// of `superagent-agents` and `superagent-executor` rather than
/// duplicating their logic: planning reuses `PlannerAgent` against a
/// scratch bus so previewing never triggers the shared `ExecutorAgent`,
/// and confirmed execution re-publishes the already-computed plan as
/// `PLAN_READY` on the real bus to let the real `ExecutorAgent` run it.
pub struct UxStateMachine {
    bus: Arc<EventBus>,
    planner_bus: Arc<EventBus>,
    intent_resolver: IntentResolver,
    diff_engine: DiffEngine,
    context_fusion: ContextFusion,
    snapshots: Arc<SnapshotManager>,
    state: Mutex<UxStateName>,
    callbacks: Mutex<Vec<Arc<dyn UxTransitionCallback>>>,
    pending: Mutex<Option<PendingExecution>>,
    plan_timeout: Duration,
    execute_timeout: Duration,
}

impl UxStateMachine {
    pub fn new(
        router: Arc<ProviderRouter>,
        bus: Arc<EventBus>,
        memory: Arc<AdaptiveMemory>,
        snapshots: Arc<SnapshotManager>,
        model: impl Into<String>,
    ) -> Self {
        let model = model.into();
        let scratch_bus = Arc::new(EventBus::new());
        let planner = Arc::new(PlannerAgent::new(router.clone(), scratch_bus.clone(), model.clone()));
        scratch_bus.subscribe(EventType::PlanRequested, planner.clone() as Arc<dyn EventHandler>);

        Self {
            bus,
            planner_bus: scratch_bus,
            intent_resolver: IntentResolver::new(router, model),
            diff_engine: DiffEngine::new(),
            context_fusion: ContextFusion::new(memory),
            snapshots,
            state: Mutex::new(UxStateName::Idle),
            callbacks: Mutex::new(Vec::new()),
            pending: Mutex::new(None),
            plan_timeout: DEFAULT_PLAN_TIMEOUT,
            execute_timeout: DEFAULT_EXECUTE_TIMEOUT,
        }
    }

    pub fn register_callback(&self, callback: Arc<dyn UxTransitionCallback>) {
        self.callbacks.lock().push(callback);
    }

    pub fn current_state(&self) -> UxStateName {
        *self.state.lock()
    }

    async fn transition(&self, to: UxStateName) {
        let from = {
            let mut state = self.state.lock();
            let from = *state;
            *state = to;
            from
        };
        let callbacks: Vec<Arc<dyn UxTransitionCallback>> = self.callbacks.lock().clone();
        for callback in callbacks {
            callback.on_transition(from, to).await;
        }
    }

    /// Runs the parse -> resolve intent -> plan -> preview steps of spec
    /// §4.6 and halts in `CONFIRMING`, awaiting [`Self::execute_plan`] or
    /// [`Self::rollback_to_checkpoint`].
    pub async fn process_input(
        &self,
        text: &str,
        session_id: SessionId,
        context_files: Option<Vec<String>>,
    ) -> Result<UxContext, UxError> {
        self.transition(UxStateName::ParsingInput).await;
        let mut file_contents = Vec::new();
        for path in context_files.iter().flatten() {
            let content = std::fs::read_to_string(path)
                .map_err(|source| UxError::Io { path: path.clone(), source })?;
            file_contents.push((path.clone(), content));
        }

        self.transition(UxStateName::ResolvingIntent).await;
        let intent = self.intent_resolver.resolve(text).await;

        self.transition(UxStateName::Planning).await;
        let active_files: Vec<String> = context_files.unwrap_or_default();
        let history: Vec<Message> = Vec::new();
        self.context_fusion
            .fuse(session_id.clone(), &history, &active_files, &[], None, text, now())
            .await;

        let plan = match self.plan_only(text, session_id.clone()).await {
            Ok(plan) => plan,
            Err(err) => {
                self.transition(UxStateName::Error).await;
                return Err(err);
            }
        };

        self.transition(UxStateName::Previewing).await;
        let changes = changes_from_plan(&plan, &file_contents);
        let preview = self.diff_engine.generate_preview(&changes);
        for file in &preview.files {
            self.bus
                .publish(
                    session_id.clone(),
                    None,
                    AgentEventKind::DiffPreview {
                        file_path: file.path.clone(),
                        diff_content: Some(file.unified.clone()),
                        checkpoint_id: None,
                    },
                )
                .await;
        }

        let checkpoint = self.snapshots.checkpoint().await?;
        *self.pending.lock() =
            Some(PendingExecution { session_id: session_id.clone(), plan: plan.clone(), checkpoint, changes });

        self.transition(UxStateName::Confirming).await;
        Ok(UxContext { session_id, intent, plan, preview })
    }

    /// Invokes the planner alone against a scratch bus so no `ExecutorAgent`
    /// reacts to the resulting `PLAN_READY` (spec §4.6 step 3, "Plan:
    /// invoke planner" -- distinct from the orchestrator's atomic
    /// plan-and-execute `execute_goal`).
    async fn plan_only(&self, goal: &str, session_id: SessionId) -> Result<Plan, UxError> {
        let scratch_bus = self.planner_bus.clone();
        let correlation_id = CorrelationId::generate();
        let task_id = TaskId::generate();
        let task = json!({"id": task_id.to_string(), "description": goal, "max_steps": 20});

        scratch_bus
            .publish(
                session_id,
                Some(correlation_id.clone()),
                AgentEventKind::PlanRequested {
                    task_id: task_id.to_string(),
                    goal: goal.to_string(),
                    task,
                    context: Value::Null,
                },
            )
            .await;

        match await_terminal(&scratch_bus, correlation_id, &[EventType::PlanReady, EventType::PlanFailed], self.plan_timeout)
            .await
        {
            Some(event) => match event.kind {
                AgentEventKind::PlanReady { plan } => {
                    serde_json::from_value(plan).map_err(|e| UxError::Planning(e.to_string()))
                }
                AgentEventKind::PlanFailed { error } => Err(UxError::Planning(error)),
                _ => Err(UxError::Planning("unexpected terminal event".into())),
            },
            None => Err(UxError::Planning("timed out waiting for a plan".into())),
        }
    }

    /// Applies the previewed diffs to disk, takes a checkpoint of session
    /// state, re-publishes the already computed plan as `PLAN_READY` on
    /// the shared bus to trigger the real executor pipeline, and awaits
    /// `PLAN_COMPLETED`/`PLAN_FAILED` (spec §4.6 `execute_plan`).
    /// `apply_partial` narrows which files in the preview are written to
    /// `selected`; when `false`, every previewed file is written. Scenario
    /// S5 is the reference for the event emitted per applied file: a
    /// `diff.applied` event regardless of `apply_partial`, not
    /// `diff.partial_applied` -- this codebase has no hunk-level selection,
    /// only whole-file selection, so that variant is never published.
    pub async fn execute_plan(
        &self,
        apply_partial: bool,
        selected: Option<Vec<String>>,
    ) -> Result<ExecutionOutcome, UxError> {
        let pending = self
            .pending
            .lock()
            .take()
            .ok_or(UxError::InvalidTransition("execute_plan", "Confirming"))?;

        self.transition(UxStateName::Executing).await;

        self.apply_selected_diffs(&pending, apply_partial, selected.as_deref()).await?;

        let correlation_id = CorrelationId::generate();
        let plan_value = serde_json::to_value(&pending.plan).unwrap_or(Value::Null);
        self.bus
            .publish(pending.session_id.clone(), Some(correlation_id.clone()), AgentEventKind::PlanReady { plan: plan_value })
            .await;

        let terminal = await_terminal(
            &self.bus,
            correlation_id,
            &[EventType::PlanCompleted, EventType::PlanFailed],
            self.execute_timeout,
        )
        .await;

        match terminal {
            Some(AgentEvent { kind: AgentEventKind::PlanCompleted { result }, .. }) => {
                self.transition(UxStateName::Completed).await;
                Ok(ExecutionOutcome { result })
            }
            Some(AgentEvent { kind: AgentEventKind::PlanFailed { error }, .. }) => {
                self.transition(UxStateName::Error).await;
                Err(UxError::Planning(error))
            }
            _ => {
                self.transition(UxStateName::Error).await;
                Err(UxError::Planning("timed out waiting for execution to finish".into()))
            }
        }
    }

    /// Restores the filesystem to the checkpoint captured before
    /// `execute_plan` (spec §4.6: "an `ERROR` state offers rollback via
    /// the checkpoint manager").
    pub async fn rollback_to_checkpoint(
        &self,
        session_id: SessionId,
        checkpoint: &Checkpoint,
        reverted_paths: &[String],
    ) -> Result<(), UxError> {
        self.snapshots.restore(checkpoint).await?;
        for path in reverted_paths {
            self.bus
                .publish(
                    session_id.clone(),
                    None,
                    AgentEventKind::DiffRollback {
                        file_path: path.clone(),
                        checkpoint_id: Some(checkpoint.checkpoint_id.clone()),
                    },
                )
                .await;
        }
        self.transition(UxStateName::Idle).await;
        Ok(())
    }

    /// Writes each selected `FileChange`'s proposed content to disk under
    /// the snapshot manager's worktree and publishes one `DiffApplied`
    /// event per file written (spec §4.6 step 5, scenario S5). When
    /// `apply_partial` is `false` every previewed file is written;
    /// otherwise only paths present in `selected` are.
    async fn apply_selected_diffs(
        &self,
        pending: &PendingExecution,
        apply_partial: bool,
        selected: Option<&[String]>,
    ) -> Result<(), UxError> {
        for change in &pending.changes {
            let include = !apply_partial || selected.is_some_and(|sel| sel.iter().any(|p| p == &change.path));
            if !include {
                continue;
            }

            let target = self.snapshots.worktree().join(&change.path);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|source| UxError::Io { path: change.path.clone(), source })?;
            }
            std::fs::write(&target, &change.proposed)
                .map_err(|source| UxError::Io { path: change.path.clone(), source })?;

            self.bus
                .publish(
                    pending.session_id.clone(),
                    None,
                    AgentEventKind::DiffApplied {
                        file_path: change.path.clone(),
                        hunks_applied: None,
                        checkpoint_id: Some(pending.checkpoint.checkpoint_id.clone()),
                    },
                )
                .await;
        }
        Ok(())
    }
}

fn changes_from_plan(plan: &Plan, file_contents: &[(String, String)]) -> Vec<FileChange> {
    const WRITE_TOOL_NAMES: &[&str] = &["write_file", "file_write", "edit_file", "file_edit"];

    plan.steps
        .iter()
        .filter(|step| step.tool_name.as_deref().is_some_and(|name| WRITE_TOOL_NAMES.contains(&name)))
        .filter_map(|step| {
            let path = step.tool_args.get("path")?.as_str()?.to_string();
            let proposed = step
                .tool_args
                .get("content")
                .or_else(|| step.tool_args.get("new_content"))?
                .as_str()?
                .to_string();
            let current = file_contents
                .iter()
                .find(|(p, _)| p == &path)
                .map(|(_, content)| content.clone())
                .unwrap_or_default();
            Some(FileChange { path, current, proposed })
        })
        .collect()
}

fn now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
