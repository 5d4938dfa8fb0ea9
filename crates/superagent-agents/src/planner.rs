use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use superagent_events::{AgentEvent, AgentEventKind, EventBus, EventBusError, EventHandler};
use superagent_providers::ProviderRouter;
use superagent_types::{Message, Plan, Role, Step, StepId, StepType, TaskId, TaskPriority};

const DEFAULT_MAX_STEPS: usize = 20;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// One step as parsed from the planner model's JSON output. Field names
/// mirror [`Step`] loosely; ids and dependencies are free-form strings
/// the model invents, remapped to [`StepId`]s after parsing.
#[derive(Debug, Deserialize)]
struct StepSpec {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type", default = "default_step_type")]
    step_type: StepType,
    description: String,
    #[serde(default)]
    tool_name: Option<String>,
    #[serde(default)]
    tool_args: Value,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    parallel_group: Option<String>,
}

fn default_step_type() -> StepType {
    StepType::Act
}

#[derive(Debug, Deserialize)]
struct PlanSpec {
    steps: Vec<StepSpec>,
    #[serde(default)]
    reasoning: String,
}

/// Subscribes to `PLAN_REQUESTED` and produces a [`Plan`] via an LLM call
/// through the Provider Router (spec §4.3 PlannerAgent). Grounded on the
/// teacher's `agent/src/agent.rs` `execute_cycle` LLM-call shape, adapted
/// from a conversational turn to a one-shot planning call.
pub struct PlannerAgent {
    router: Arc<ProviderRouter>,
    bus: Arc<EventBus>,
    model: String,
}

impl PlannerAgent {
    pub fn new(router: Arc<ProviderRouter>, bus: Arc<EventBus>, model: impl Into<String>) -> Self {
        Self { router, bus, model: model.into() }
    }

    async fn handle_plan_requested(
        &self,
        event: &AgentEvent,
        task_id: &str,
        goal: &str,
        task: &Value,
        context: &Value,
    ) {
        let max_steps = task
            .get("max_steps")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_MAX_STEPS);

        let prompt = format!(
            "Goal: {goal}\n\nTask: {task}\n\nContext: {context}\n\n\
             Respond with a JSON object `{{\"steps\": [...], \"reasoning\": \"...\"}}` where each \
             step has `type` (THINK|ACT|OBSERVE|REFLECT), `description`, optional `tool_name`, \
             `tool_args`, `dependencies` (array of other step ids), and `parallel_group`."
        );
        let request = match superagent_types::LLMRequest::builder(
            &self.model,
            vec![Message::text(Role::User, prompt, now())],
        )
        .build()
        {
            Ok(r) => r,
            Err(err) => {
                self.fail(event, task_id, &err.to_string()).await;
                return;
            }
        };

        let response = match self.router.generate(&request, None, true).await {
            Ok(r) => r,
            Err(err) => {
                self.fail(event, task_id, &err.to_string()).await;
                return;
            }
        };

        let steps = match parse_plan(&response.content, max_steps, goal) {
            Ok(steps) => steps,
            Err(err) => {
                self.fail(event, task_id, &err).await;
                return;
            }
        };

        let reasoning = serde_json::from_str::<PlanSpec>(&response.content)
            .map(|spec| spec.reasoning)
            .unwrap_or_default();
        let success_probability = if steps.is_empty() {
            0.0
        } else {
            steps.iter().map(|s| s.success_probability).sum::<f32>() / steps.len() as f32
        };

        match Plan::from_steps(TaskId::new(task_id), steps, reasoning, success_probability) {
            Ok(plan) => {
                self.bus
                    .publish(
                        event.session_id.clone(),
                        event.correlation_id.clone(),
                        AgentEventKind::PlanReady { plan: serde_json::to_value(&plan).unwrap_or(Value::Null) },
                    )
                    .await;
            }
            Err(err) => self.fail(event, task_id, &err.to_string()).await,
        }
    }

    async fn fail(&self, event: &AgentEvent, task_id: &str, error: &str) {
        log::warn!("planning failed for task {task_id}: {error}");
        self.bus
            .publish(
                event.session_id.clone(),
                event.correlation_id.clone(),
                AgentEventKind::PlanFailed { error: error.to_string() },
            )
            .await;
    }
}

/// Asks the planner model for a recovery sub-plan targeting one failed
/// `ACT` step (spec §4.3 ExecutorAgent "replan": "the planner is asked to
/// produce a recovery sub-plan targeting the failure"; spec §7 "Recovered
/// locally: ... planner replan on tool failure"). Reuses the same
/// JSON-first/line-fallback parser `handle_plan_requested` uses for a
/// fresh plan, since a recovery sub-plan has the same step shape.
pub(crate) async fn request_recovery_steps(
    router: &ProviderRouter,
    model: &str,
    original_goal: &str,
    failed_step: &Step,
    error: &str,
    max_steps: usize,
) -> Result<Vec<Step>, String> {
    let tool = failed_step.tool_name.as_deref().unwrap_or("<none>");
    let prompt = format!(
        "The step \"{}\" (tool: {tool}) failed while pursuing the goal \"{original_goal}\" \
         with error: {error}\n\nPropose a short recovery plan to work around this failure. \
         Respond with a JSON object `{{\"steps\": [...], \"reasoning\": \"...\"}}` where each \
         step has `type` (THINK|ACT|OBSERVE|REFLECT), `description`, optional `tool_name`, \
         `tool_args`, `dependencies`, and `parallel_group`.",
        failed_step.description,
    );
    let request = superagent_types::LLMRequest::builder(model, vec![Message::text(Role::User, prompt, now())])
        .build()
        .map_err(|e| e.to_string())?;
    let response = router.generate(&request, None, true).await.map_err(|e| e.to_string())?;
    parse_plan(&response.content, max_steps.max(1), &format!("retry: {}", failed_step.description))
}

/// JSON-first parse with a line-based fallback (spec §4.3 PlannerAgent):
/// numbered or "Step N:" lines each become one ACT step, capped at
/// `max_steps`, guaranteeing at least one step carrying `goal` verbatim.
pub(crate) fn parse_plan(content: &str, max_steps: usize, goal: &str) -> Result<Vec<Step>, String> {
    if let Ok(spec) = serde_json::from_str::<PlanSpec>(content) {
        return Ok(build_steps_from_spec(spec.steps, max_steps));
    }

    let line_re = regex::Regex::new(r"^\s*(?:\d+[.)]|[Ss]tep\s+\d+:)\s*(.+)$").unwrap();
    let mut descriptions: Vec<String> = content
        .lines()
        .filter_map(|line| line_re.captures(line).map(|c| c[1].trim().to_string()))
        .filter(|d| !d.is_empty())
        .collect();

    if descriptions.is_empty() {
        descriptions.push(goal.to_string());
    }
    descriptions.truncate(max_steps);

    let mut steps = Vec::with_capacity(descriptions.len());
    let mut previous: Option<StepId> = None;
    for description in descriptions {
        let id = StepId::generate();
        let dependencies = previous.clone().into_iter().collect::<Vec<_>>();
        steps.push(Step {
            id: id.clone(),
            step_type: StepType::Act,
            description,
            tool_name: None,
            tool_args: Value::Null,
            dependencies,
            priority: TaskPriority::Normal,
            success_probability: 0.6,
            max_retries: DEFAULT_MAX_RETRIES,
            parallel_group: None,
            output: None,
        });
        previous = Some(id);
    }
    Ok(steps)
}

fn build_steps_from_spec(specs: Vec<StepSpec>, max_steps: usize) -> Vec<Step> {
    let mut specs = specs;
    specs.truncate(max_steps);

    let mut id_map = std::collections::HashMap::new();
    for spec in &specs {
        let id = spec.id.clone().map(StepId::new).unwrap_or_else(StepId::generate);
        if let Some(raw) = &spec.id {
            id_map.insert(raw.clone(), id);
        } else {
            id_map.insert(id.as_str().to_string(), id);
        }
    }

    specs
        .into_iter()
        .map(|spec| {
            let id = spec
                .id
                .as_deref()
                .and_then(|raw| id_map.get(raw).cloned())
                .unwrap_or_else(StepId::generate);
            let dependencies = spec
                .dependencies
                .iter()
                .filter_map(|raw| id_map.get(raw).cloned())
                .collect();
            Step {
                id,
                step_type: spec.step_type,
                description: spec.description,
                tool_name: spec.tool_name,
                tool_args: spec.tool_args,
                dependencies,
                priority: TaskPriority::Normal,
                success_probability: 0.8,
                max_retries: DEFAULT_MAX_RETRIES,
                parallel_group: spec.parallel_group,
                output: None,
            }
        })
        .collect()
}

fn now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

#[async_trait]
impl EventHandler for PlannerAgent {
    async fn handle(&self, event: &AgentEvent) -> Result<(), EventBusError> {
        if let AgentEventKind::PlanRequested { task_id, goal, task, context } = &event.kind {
            self.handle_plan_requested(event, task_id, goal, task, context).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_based_fallback_caps_at_max_steps_and_keeps_goal() {
        let content = "1. Look at the repo\n2. Run the tests\n3. Fix the bug\n4. Ship it";
        let steps = parse_plan(content, 2, "do the thing").unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].description, "Look at the repo");
    }

    #[test]
    fn falls_back_to_goal_when_no_lines_match() {
        let steps = parse_plan("just do it, no structure here", 5, "achieve the goal").unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].description, "achieve the goal");
    }

    #[test]
    fn json_plan_resolves_dependencies_by_id() {
        let content = r#"{"steps": [
            {"id": "a", "type": "ACT", "description": "first"},
            {"id": "b", "type": "ACT", "description": "second", "dependencies": ["a"]}
        ], "reasoning": "because"}"#;
        let steps = parse_plan(content, 10, "goal").unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].dependencies.len(), 1);
    }
}
