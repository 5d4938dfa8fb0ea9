use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use superagent_events::{AgentEvent, AgentEventKind, EventBus, EventBusError, EventHandler};
use superagent_executor::TransactionalExecutor;
use superagent_providers::ProviderRouter;
use superagent_types::{IsolationLevel, Message, Plan, Role, Step, StepId, StepType, ToolCall, ToolCallId};

const DEFAULT_MAX_PARALLEL_STEPS: usize = 5;

/// Subscribes to `PLAN_READY` and walks a [`Plan`]'s steps in topological
/// order, running same-group steps concurrently (spec §4.3 ExecutorAgent).
/// Grounded on the teacher's `execute_cycle` tool-call loop in
/// `agent/src/agent.rs`, generalized from "one LLM turn, many tool calls"
/// to "one plan, many typed steps".
pub struct ExecutorAgent {
    router: Arc<ProviderRouter>,
    executor: Arc<TransactionalExecutor>,
    bus: Arc<EventBus>,
    model: String,
    max_parallel_steps: usize,
}

impl ExecutorAgent {
    pub fn new(
        router: Arc<ProviderRouter>,
        executor: Arc<TransactionalExecutor>,
        bus: Arc<EventBus>,
        model: impl Into<String>,
    ) -> Self {
        Self { router, executor, bus, model: model.into(), max_parallel_steps: DEFAULT_MAX_PARALLEL_STEPS }
    }

    pub fn with_max_parallel_steps(mut self, n: usize) -> Self {
        self.max_parallel_steps = n.max(1);
        self
    }

    async fn handle_plan_ready(&self, event: &AgentEvent, plan_value: &Value) {
        let mut plan: Plan = match serde_json::from_value(plan_value.clone()) {
            Ok(p) => p,
            Err(err) => {
                self.publish_failed(event, &format!("malformed plan: {err}")).await;
                return;
            }
        };

        let order = match plan.topological_order() {
            Ok(order) => order,
            Err(err) => {
                self.publish_failed(event, &err.to_string()).await;
                return;
            }
        };

        let semaphore = Arc::new(Semaphore::new(self.max_parallel_steps));
        let mut done = std::collections::HashSet::new();
        let mut completed_outputs: Vec<(StepId, String)> = Vec::new();

        let groups = group_ready_batches(&order, &plan);
        for batch in groups {
            let mut handles = Vec::with_capacity(batch.len());
            for step_id in &batch {
                let step = plan.step(step_id).cloned().expect("step in own plan");
                let permit = semaphore.clone().acquire_owned().await.expect("semaphore not closed");
                let router = self.router.clone();
                let executor = self.executor.clone();
                let bus = self.bus.clone();
                let model = self.model.clone();
                let event = event.clone();
                let prior_outputs = completed_outputs.clone();
                handles.push(tokio::spawn(async move {
                    let _permit = permit;
                    run_step(&router, &executor, &bus, &model, &event, step, &prior_outputs).await
                }));
            }
            for handle in handles {
                match handle.await {
                    Ok((step_id, Ok(output))) => {
                        completed_outputs.push((step_id.clone(), output.clone()));
                        done.insert(step_id.clone());
                        if let Some(step) = plan.steps.iter_mut().find(|s| s.id == step_id) {
                            step.output = Some(output);
                        }
                    }
                    Ok((step_id, Err(err))) => {
                        let is_act = plan.step(&step_id).map(|s| s.step_type) == Some(StepType::Act);
                        let recovered = if is_act {
                            self.attempt_replan(&plan, &step_id, &err, event, &completed_outputs).await
                        } else {
                            None
                        };

                        match recovered {
                            Some((recovery_steps, recovered_output)) => {
                                log::warn!(
                                    "step {step_id} failed: {err}; recovered via a {}-step replan",
                                    recovery_steps.len()
                                );
                                splice_recovery(&mut plan, &recovery_steps);
                                completed_outputs.push((step_id.clone(), recovered_output.clone()));
                                done.insert(step_id.clone());
                                if let Some(step) = plan.steps.iter_mut().find(|s| s.id == step_id) {
                                    step.output = Some(recovered_output);
                                }
                            }
                            None => {
                                self.publish_failed(&event.clone(), &format!("step {step_id} failed: {err}")).await;
                                return;
                            }
                        }
                    }
                    Err(join_err) => {
                        self.publish_failed(&event.clone(), &format!("step task panicked: {join_err}")).await;
                        return;
                    }
                }
            }
        }

        let result = serde_json::json!({
            "plan": plan,
            "step_outputs": completed_outputs.iter().map(|(id, out)| (id.to_string(), out.clone())).collect::<std::collections::HashMap<_, _>>(),
        });
        self.bus
            .publish(event.session_id.clone(), event.correlation_id.clone(), AgentEventKind::PlanCompleted { result })
            .await;
    }

    /// Recovery path for a failed `ACT` step (spec §4.3 "A failed ACT step
    /// triggers `replan`: the planner is asked to produce a recovery
    /// sub-plan targeting the failure; the recovery steps are spliced in
    /// immediately after the failed step"). Asks the planner for a short
    /// recovery plan, runs its steps in sequence right away (each
    /// depending on the failed step so the spliced plan stays a DAG), and
    /// returns the recovered steps plus the last one's output -- which
    /// becomes the failed step's effective output for any step that
    /// depended on it. Returns `None` if the planner call fails, yields no
    /// steps, or any recovery step itself fails; the caller then falls
    /// back to terminal failure. Only one replan attempt is made per
    /// failed step -- a recovery step that fails does not recursively
    /// replan again.
    async fn attempt_replan(
        &self,
        plan: &Plan,
        failed_step_id: &StepId,
        error: &str,
        event: &AgentEvent,
        prior_outputs: &[(StepId, String)],
    ) -> Option<(Vec<Step>, String)> {
        let failed_step = plan.step(failed_step_id)?.clone();
        let max_steps = plan.steps.len().max(1);
        let mut recovery_steps = crate::planner::request_recovery_steps(
            &self.router,
            &self.model,
            &plan.reasoning,
            &failed_step,
            error,
            max_steps,
        )
        .await
        .ok()
        .filter(|steps| !steps.is_empty())?;

        for step in &mut recovery_steps {
            step.dependencies = vec![failed_step_id.clone()];
        }

        let mut outputs = prior_outputs.to_vec();
        let mut last_output = String::new();
        for step in &mut recovery_steps {
            let (_, result) =
                run_step(&self.router, &self.executor, &self.bus, &self.model, event, step.clone(), &outputs).await;
            match result {
                Ok(output) => {
                    outputs.push((step.id.clone(), output.clone()));
                    step.output = Some(output.clone());
                    last_output = output;
                }
                Err(_) => return None,
            }
        }

        Some((recovery_steps, last_output))
    }

    async fn publish_failed(&self, event: &AgentEvent, error: &str) {
        log::warn!("plan execution failed: {error}");
        self.bus
            .publish(
                event.session_id.clone(),
                event.correlation_id.clone(),
                AgentEventKind::PlanFailed { error: error.to_string() },
            )
            .await;
    }
}

/// Records a recovery sub-plan's steps on the parent plan so the
/// `PLAN_COMPLETED` payload reflects what actually ran (spec §4.3 "the
/// recovery steps are spliced in immediately after the failed step").
/// They were already executed by [`ExecutorAgent::attempt_replan`] before
/// this is called; this only makes them visible in `plan.steps` and
/// `plan.dependency_graph`, it does not re-run or re-validate the DAG.
fn splice_recovery(plan: &mut Plan, recovery_steps: &[Step]) {
    for step in recovery_steps {
        plan.dependency_graph.insert(step.id.clone(), step.dependencies.clone());
        plan.steps.push(step.clone());
    }
}

/// Groups the topological order into batches that can run concurrently:
/// consecutive steps sharing a `parallel_group` label run together, every
/// other step runs alone (spec §4.3: "steps in the same parallel group
/// are executed concurrently").
fn group_ready_batches(order: &[StepId], plan: &Plan) -> Vec<Vec<StepId>> {
    let mut group_of: std::collections::HashMap<&StepId, &str> = std::collections::HashMap::new();
    for (label, members) in &plan.parallel_groups {
        for member in members {
            group_of.insert(member, label.as_str());
        }
    }

    let mut batches: Vec<Vec<StepId>> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for step_id in order {
        if seen.contains(step_id) {
            continue;
        }
        match group_of.get(step_id) {
            Some(label) => {
                let members: Vec<StepId> = plan
                    .parallel_groups
                    .get(*label)
                    .cloned()
                    .unwrap_or_else(|| vec![step_id.clone()])
                    .into_iter()
                    .filter(|id| order.contains(id))
                    .collect();
                for m in &members {
                    seen.insert(m.clone());
                }
                batches.push(members);
            }
            None => {
                seen.insert(step_id.clone());
                batches.push(vec![step_id.clone()]);
            }
        }
    }
    batches
}

async fn run_step(
    router: &ProviderRouter,
    executor: &TransactionalExecutor,
    bus: &EventBus,
    model: &str,
    event: &AgentEvent,
    step: Step,
    prior_outputs: &[(StepId, String)],
) -> (StepId, Result<String, String>) {
    let result = match step.step_type {
        StepType::Think | StepType::Reflect => run_llm_step(router, model, &step).await,
        StepType::Observe => Ok(project_observations(prior_outputs)),
        StepType::Act => run_act_step(executor, &step).await,
    };

    if let Ok(output) = &result {
        bus.publish(
            event.session_id.clone(),
            event.correlation_id.clone(),
            AgentEventKind::StepCompleted { step_id: step.id.to_string(), output: Value::String(output.clone()) },
        )
        .await;
    }

    (step.id.clone(), result)
}

async fn run_llm_step(router: &ProviderRouter, model: &str, step: &Step) -> Result<String, String> {
    let request = superagent_types::LLMRequest::builder(
        model,
        vec![Message::text(Role::User, step.description.clone(), now())],
    )
    .build()
    .map_err(|e| e.to_string())?;
    router.generate(&request, None, true).await.map(|r| r.content).map_err(|e| e.to_string())
}

fn project_observations(prior_outputs: &[(StepId, String)]) -> String {
    prior_outputs
        .iter()
        .map(|(id, output)| format!("{id}: {output}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Retries an `ACT` step up to `step.max_retries` times before giving up
/// (spec §4.3). A step with no `tool_name` cannot be dispatched (this
/// happens only for planner-fallback steps produced when the model's
/// output could not be parsed as JSON) and its description is recorded
/// as the output directly rather than treated as a tool failure.
async fn run_act_step(executor: &TransactionalExecutor, step: &Step) -> Result<String, String> {
    let Some(tool_name) = step.tool_name.clone() else {
        return Ok(step.description.clone());
    };

    let max_attempts = step.max_retries.max(1);
    let mut last_error = String::new();
    for attempt in 0..max_attempts {
        let call = ToolCall {
            id: ToolCallId::generate(),
            tool_name: tool_name.clone(),
            parameters: step.tool_args.clone(),
            timestamp: now(),
        };
        match executor
            .execute(vec![call], IsolationLevel::default(), CancellationToken::new())
            .await
        {
            Ok(result) if result.success => {
                return Ok(result.results.into_iter().next().map(|o| o.output).unwrap_or_default());
            }
            Ok(result) => {
                last_error = result.error.unwrap_or_else(|| "tool call failed".to_string());
            }
            Err(err) => {
                last_error = err.to_string();
            }
        }
        if attempt + 1 < max_attempts {
            log::warn!("step {} attempt {} failed: {last_error}, retrying", step.id, attempt + 1);
        }
    }
    Err(last_error)
}

fn now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

#[async_trait]
impl EventHandler for ExecutorAgent {
    async fn handle(&self, event: &AgentEvent) -> Result<(), EventBusError> {
        if let AgentEventKind::PlanReady { plan } = &event.kind {
            self.handle_plan_ready(event, plan).await;
        }
        Ok(())
    }
}
