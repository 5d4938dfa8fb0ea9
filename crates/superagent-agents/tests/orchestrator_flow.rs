use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use superagent_agents::{ExecutorAgent, MemoryAgent, MonitorAgent, Orchestrator, PlannerAgent};
use superagent_events::{EventBus, EventHandler, EventType};
use superagent_executor::{ParamSchema, ParamType, SnapshotManager, Tool, ToolRegistry, ToolSchema, TransactionalExecutor};
use superagent_memory::AdaptiveMemory;
use superagent_providers::{ChunkStream, ProviderAdapter, ProviderConfig, ProviderError, ProviderRouter};
use superagent_types::{FinishReason, LLMRequest, LLMResponse, ModelInfo, SessionId, Usage};

struct PlanningAdapter;

#[async_trait]
impl ProviderAdapter for PlanningAdapter {
    fn name(&self) -> &str {
        "mock-planner"
    }

    async fn generate(&self, request: &LLMRequest) -> Result<LLMResponse, ProviderError> {
        let content = r#"{"steps": [
            {"id": "s1", "type": "ACT", "description": "say hello", "tool_name": "echo", "tool_args": {"text": "hello"}}
        ], "reasoning": "single greeting step"}"#
            .to_string();
        Ok(LLMResponse {
            id: "resp-1".into(),
            model: request.model.clone(),
            content,
            finish_reason: FinishReason::Stop,
            tool_calls: Vec::new(),
            usage: Usage { prompt: 10, completion: 10, total: 20 },
            provider: self.name().into(),
            latency_ms: 0,
            cost: 0.0,
        })
    }

    async fn stream(&self, _request: &LLMRequest) -> Result<ChunkStream, ProviderError> {
        Err(ProviderError::NotImplemented("mock adapter has no streaming".into()))
    }

    async fn get_model_info(&self, model: &str) -> Result<ModelInfo, ProviderError> {
        Ok(ModelInfo {
            id: model.to_string(),
            provider: self.name().into(),
            context_window: 8192,
            max_output_tokens: 2048,
            supports_streaming: false,
            supports_functions: false,
            supports_vision: false,
            supports_json_mode: false,
            input_cost_per_1k: 0.0,
            output_cost_per_1k: 0.0,
        })
    }
}

struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(vec![ParamSchema::optional("text", ParamType::String, Value::Null)])
    }

    async fn call(&self, params: Value) -> Result<String, superagent_executor::ExecutorError> {
        let text = params.get("text").and_then(Value::as_str).unwrap_or_default();
        Ok(format!("echo: {text}"))
    }
}

struct FlakyTool;

#[async_trait]
impl Tool for FlakyTool {
    fn name(&self) -> &str {
        "flaky"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(vec![])
    }

    async fn call(&self, _params: Value) -> Result<String, superagent_executor::ExecutorError> {
        Err(superagent_executor::ExecutorError::ToolExecutionFailed("flaky always fails".into()))
    }
}

/// Returns the initial plan (one `ACT` step calling the always-failing
/// `flaky` tool) on the first call, and a one-step recovery plan (calling
/// the working `echo` tool) once asked to recover from a failure.
struct ReplanningAdapter;

#[async_trait]
impl ProviderAdapter for ReplanningAdapter {
    fn name(&self) -> &str {
        "mock-planner"
    }

    async fn generate(&self, request: &LLMRequest) -> Result<LLMResponse, ProviderError> {
        let is_recovery =
            request.messages.iter().any(|m| m.content.as_text().contains("Propose a short recovery plan"));
        let content = if is_recovery {
            r#"{"steps": [
                {"id": "r1", "type": "ACT", "description": "fall back to echo", "tool_name": "echo", "tool_args": {"text": "recovered"}}
            ], "reasoning": "use the working tool instead"}"#
                .to_string()
        } else {
            r#"{"steps": [
                {"id": "s1", "type": "ACT", "description": "call the flaky tool", "tool_name": "flaky"}
            ], "reasoning": "single flaky step"}"#
                .to_string()
        };
        Ok(LLMResponse {
            id: "resp-1".into(),
            model: request.model.clone(),
            content,
            finish_reason: FinishReason::Stop,
            tool_calls: Vec::new(),
            usage: Usage { prompt: 10, completion: 10, total: 20 },
            provider: self.name().into(),
            latency_ms: 0,
            cost: 0.0,
        })
    }

    async fn stream(&self, _request: &LLMRequest) -> Result<ChunkStream, ProviderError> {
        Err(ProviderError::NotImplemented("mock adapter has no streaming".into()))
    }

    async fn get_model_info(&self, model: &str) -> Result<ModelInfo, ProviderError> {
        Ok(ModelInfo {
            id: model.to_string(),
            provider: self.name().into(),
            context_window: 8192,
            max_output_tokens: 2048,
            supports_streaming: false,
            supports_functions: false,
            supports_vision: false,
            supports_json_mode: false,
            input_cost_per_1k: 0.0,
            output_cost_per_1k: 0.0,
        })
    }
}

#[tokio::test]
async fn a_failed_act_step_is_recovered_by_a_replan() {
    let bus = Arc::new(EventBus::new());

    let mut router = ProviderRouter::new();
    router.register(ProviderConfig::new("mock", 10), Arc::new(ReplanningAdapter));
    let router = Arc::new(router);

    let memory = Arc::new(AdaptiveMemory::default());

    let dir = tempfile::tempdir().unwrap();
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(FlakyTool));
    registry.register(Arc::new(EchoTool));
    let executor = Arc::new(TransactionalExecutor::new(
        Arc::new(registry),
        Arc::new(SnapshotManager::new(dir.path(), false)),
    ));

    let planner = Arc::new(PlannerAgent::new(router.clone(), bus.clone(), "mock-model"));
    bus.subscribe(EventType::PlanRequested, planner.clone() as Arc<dyn EventHandler>);

    let executor_agent = Arc::new(ExecutorAgent::new(router.clone(), executor.clone(), bus.clone(), "mock-model"));
    bus.subscribe(EventType::PlanReady, executor_agent.clone() as Arc<dyn EventHandler>);

    let memory_agent = Arc::new(MemoryAgent::new(memory.clone(), bus.clone()));
    bus.subscribe(EventType::StepCompleted, memory_agent.clone() as Arc<dyn EventHandler>);
    bus.subscribe(EventType::ContextRequested, memory_agent.clone() as Arc<dyn EventHandler>);

    let monitor = Arc::new(MonitorAgent::new());
    monitor.subscribe_all(&bus);

    let orchestrator = Orchestrator::new(bus.clone(), memory.clone());

    let outcome = orchestrator
        .execute_goal("do the flaky thing", SessionId::generate(), None, None)
        .await;

    assert_eq!(outcome.status, superagent_agents::GoalStatus::Completed);
    let data = outcome.data.expect("completed goal carries plan data");
    let outputs = data.get("step_outputs").expect("step outputs present");
    let s1_output = outputs.get("s1").and_then(Value::as_str).expect("s1 recovered output recorded");
    assert_eq!(s1_output, "echo: recovered");
}

#[tokio::test]
async fn execute_goal_runs_plan_through_to_completion() {
    let bus = Arc::new(EventBus::new());

    let mut router = ProviderRouter::new();
    router.register(ProviderConfig::new("mock", 10), Arc::new(PlanningAdapter));
    let router = Arc::new(router);

    let memory = Arc::new(AdaptiveMemory::default());

    let dir = tempfile::tempdir().unwrap();
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(EchoTool));
    let executor = Arc::new(TransactionalExecutor::new(
        Arc::new(registry),
        Arc::new(SnapshotManager::new(dir.path(), false)),
    ));

    let planner = Arc::new(PlannerAgent::new(router.clone(), bus.clone(), "mock-model"));
    bus.subscribe(EventType::PlanRequested, planner.clone() as Arc<dyn EventHandler>);

    let executor_agent = Arc::new(ExecutorAgent::new(router.clone(), executor.clone(), bus.clone(), "mock-model"));
    bus.subscribe(EventType::PlanReady, executor_agent.clone() as Arc<dyn EventHandler>);

    let memory_agent = Arc::new(MemoryAgent::new(memory.clone(), bus.clone()));
    bus.subscribe(EventType::StepCompleted, memory_agent.clone() as Arc<dyn EventHandler>);
    bus.subscribe(EventType::ContextRequested, memory_agent.clone() as Arc<dyn EventHandler>);

    let monitor = Arc::new(MonitorAgent::new());
    monitor.subscribe_all(&bus);

    let orchestrator = Orchestrator::new(bus.clone(), memory.clone());

    let outcome = orchestrator
        .execute_goal("greet the user", SessionId::generate(), None, None)
        .await;

    assert_eq!(outcome.status, superagent_agents::GoalStatus::Completed);
    let data = outcome.data.expect("completed goal carries plan data");
    let outputs = data.get("step_outputs").expect("step outputs present");
    let s1_output = outputs.get("s1").and_then(Value::as_str).expect("s1 output recorded");
    assert_eq!(s1_output, "echo: hello");

    assert!(monitor.total() > 0);
}
