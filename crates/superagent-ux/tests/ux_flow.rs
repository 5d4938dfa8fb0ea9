use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use superagent_agents::{ExecutorAgent, MemoryAgent, MonitorAgent};
use superagent_events::{EventBus, EventHandler, EventType};
use superagent_executor::{
    ParamSchema, ParamType, SnapshotManager, Tool, ToolRegistry, ToolSchema, TransactionalExecutor,
};
use superagent_memory::AdaptiveMemory;
use superagent_providers::{ChunkStream, ProviderAdapter, ProviderConfig, ProviderError, ProviderRouter};
use superagent_types::{FinishReason, LLMRequest, LLMResponse, ModelInfo, SessionId, Usage};
use superagent_ux::{UxStateMachine, UxStateName};

struct PlanningAdapter;

#[async_trait]
impl ProviderAdapter for PlanningAdapter {
    fn name(&self) -> &str {
        "mock-planner"
    }

    async fn generate(&self, request: &LLMRequest) -> Result<LLMResponse, ProviderError> {
        let content = r#"{"steps": [
            {"id": "s1", "type": "ACT", "description": "write greeting", "tool_name": "write_file",
             "tool_args": {"path": "greeting.txt", "content": "hello there"}}
        ], "reasoning": "write a greeting file"}"#
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

struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(vec![
            ParamSchema::required("path", ParamType::String),
            ParamSchema::required("content", ParamType::String),
        ])
    }

    async fn call(&self, params: Value) -> Result<String, superagent_executor::ExecutorError> {
        let path = params.get("path").and_then(Value::as_str).unwrap_or_default();
        Ok(format!("wrote {path}"))
    }
}

#[tokio::test]
async fn process_input_previews_then_execute_plan_completes() {
    let bus = Arc::new(EventBus::new());

    let mut router = ProviderRouter::new();
    router.register(ProviderConfig::new("mock", 10), Arc::new(PlanningAdapter));
    let router = Arc::new(router);

    let memory = Arc::new(AdaptiveMemory::default());

    let dir = tempfile::tempdir().unwrap();
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WriteFileTool));
    let executor = Arc::new(TransactionalExecutor::new(
        Arc::new(registry),
        Arc::new(SnapshotManager::new(dir.path(), false)),
    ));

    let executor_agent = Arc::new(ExecutorAgent::new(router.clone(), executor.clone(), bus.clone(), "mock-model"));
    bus.subscribe(EventType::PlanReady, executor_agent.clone() as Arc<dyn EventHandler>);

    let memory_agent = Arc::new(MemoryAgent::new(memory.clone(), bus.clone()));
    bus.subscribe(EventType::StepCompleted, memory_agent.clone() as Arc<dyn EventHandler>);

    let monitor = Arc::new(MonitorAgent::new());
    monitor.subscribe_all(&bus);

    let snapshots = Arc::new(SnapshotManager::new(dir.path(), false));
    let ux = UxStateMachine::new(router, bus, memory, snapshots, "mock-model");

    let session_id = SessionId::generate();
    let ux_context = ux
        .process_input("write a friendly greeting", session_id, None)
        .await
        .expect("process_input should reach Confirming");

    assert_eq!(ux.current_state(), UxStateName::Confirming);
    assert_eq!(ux_context.plan.steps.len(), 1);
    assert_eq!(ux_context.preview.files.len(), 1);
    assert_eq!(ux_context.preview.files[0].path, "greeting.txt");
    assert!(ux_context.preview.files[0].additions > 0);

    let outcome = ux.execute_plan(false, None).await.expect("execution should complete");
    assert_eq!(ux.current_state(), UxStateName::Completed);
    let step_outputs = outcome.result.get("step_outputs").expect("step outputs present");
    let s1 = step_outputs.get("s1").and_then(Value::as_str).expect("s1 output recorded");
    assert_eq!(s1, "wrote greeting.txt");

    let written = std::fs::read_to_string(dir.path().join("greeting.txt")).expect("file written to disk");
    assert_eq!(written, "hello there");
}

struct ReadmeAdapter;

#[async_trait]
impl ProviderAdapter for ReadmeAdapter {
    fn name(&self) -> &str {
        "mock-planner"
    }

    async fn generate(&self, request: &LLMRequest) -> Result<LLMResponse, ProviderError> {
        let content = r#"{"steps": [
            {"id": "s1", "type": "ACT", "description": "update readme", "tool_name": "write_file",
             "tool_args": {"path": "README.md", "content": "# Updated\n"}},
            {"id": "s2", "type": "ACT", "description": "write notes", "tool_name": "write_file",
             "tool_args": {"path": "NOTES.md", "content": "scratch\n"}}
        ], "reasoning": "update docs"}"#
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

struct RecordingHandler {
    seen: std::sync::Mutex<Vec<String>>,
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(&self, event: &superagent_events::AgentEvent) -> Result<(), superagent_events::EventBusError> {
        if let superagent_events::AgentEventKind::DiffApplied { file_path, .. } = &event.kind {
            assert_eq!(event.kind.wire_name(), "diff.applied");
            self.seen.lock().unwrap().push(file_path.clone());
        }
        Ok(())
    }
}

#[tokio::test]
async fn execute_plan_with_apply_partial_writes_only_the_selected_file_and_emits_one_diff_applied_event() {
    let bus = Arc::new(EventBus::new());

    let mut router = ProviderRouter::new();
    router.register(ProviderConfig::new("mock", 10), Arc::new(ReadmeAdapter));
    let router = Arc::new(router);

    let memory = Arc::new(AdaptiveMemory::default());

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("README.md"), "# Old\n").unwrap();
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WriteFileTool));
    let executor = Arc::new(TransactionalExecutor::new(
        Arc::new(registry),
        Arc::new(SnapshotManager::new(dir.path(), false)),
    ));

    let executor_agent = Arc::new(ExecutorAgent::new(router.clone(), executor.clone(), bus.clone(), "mock-model"));
    bus.subscribe(EventType::PlanReady, executor_agent.clone() as Arc<dyn EventHandler>);

    let memory_agent = Arc::new(MemoryAgent::new(memory.clone(), bus.clone()));
    bus.subscribe(EventType::StepCompleted, memory_agent.clone() as Arc<dyn EventHandler>);

    let monitor = Arc::new(MonitorAgent::new());
    monitor.subscribe_all(&bus);

    let recorder = Arc::new(RecordingHandler { seen: std::sync::Mutex::new(Vec::new()) });
    bus.subscribe(EventType::DiffApplied, recorder.clone() as Arc<dyn EventHandler>);

    let snapshots = Arc::new(SnapshotManager::new(dir.path(), false));
    let ux = UxStateMachine::new(router, bus, memory, snapshots, "mock-model");

    let session_id = SessionId::generate();
    let ux_context =
        ux.process_input("update README", session_id, None).await.expect("process_input should reach Confirming");

    assert_eq!(ux_context.preview.files.len(), 2);

    ux.execute_plan(true, Some(vec!["README.md".to_string()]))
        .await
        .expect("execution should complete");

    let updated = std::fs::read_to_string(dir.path().join("README.md")).unwrap();
    assert_eq!(updated, "# Updated\n");
    assert!(!dir.path().join("NOTES.md").exists());

    let seen = recorder.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], "README.md");
}
