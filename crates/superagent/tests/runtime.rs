use std::sync::Arc;

use tokio::io::duplex;

use superagent::config::RuntimeConfig;
use superagent::Runtime;
use superagent_events::EventType;
use superagent_types::SessionId;

#[tokio::test]
async fn wires_one_handler_per_agent_subscription() {
    let runtime = Runtime::new(RuntimeConfig::default()).unwrap();

    assert_eq!(runtime.bus.handler_count(EventType::PlanRequested), 1);
    assert_eq!(runtime.bus.handler_count(EventType::PlanReady), 1);
    assert_eq!(runtime.bus.handler_count(EventType::StepCompleted), 1);
    assert_eq!(runtime.bus.handler_count(EventType::ContextRequested), 1);
    assert!(runtime.bus.handler_count(EventType::PlanCompleted) >= 1);
}

#[tokio::test]
async fn parses_config_and_registers_providers() {
    let toml = r#"
        model = "gpt-4o"

        [[provider]]
        name = "local"
        base_url = "http://localhost:8080/v1"
        priority = 10
        models = ["gpt-4o"]
    "#;
    let config = RuntimeConfig::from_toml(toml).unwrap();
    let runtime = Runtime::new(config).unwrap();
    assert_eq!(runtime.model, "gpt-4o");
}

#[tokio::test]
async fn ndjson_writer_drains_published_events() {
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::time::Duration;

    let runtime = Runtime::new(RuntimeConfig::default()).unwrap();
    let (client, server) = duplex(4096);

    // Leaked intentionally: the bus/handler graph is self-referential
    // (handlers hold an `Arc<EventBus>` back to the bus that holds them),
    // so the broadcast sender never observably closes from a test's
    // perspective. Reading one line off the wire is enough to prove the
    // writer is live; the task is left running for the process to reap.
    let _handle = runtime.spawn_ndjson_writer(client);

    let session_id = SessionId::generate();
    runtime
        .bus
        .publish(
            session_id,
            None,
            superagent_events::AgentEventKind::SessionStarted { checkpoint_id: None, metadata: serde_json::json!({}) },
        )
        .await;

    let mut reader = BufReader::new(server);
    let mut line = String::new();
    tokio::time::timeout(Duration::from_secs(5), reader.read_line(&mut line)).await.unwrap().unwrap();
    assert!(line.contains("\"session.started\""));
}

#[allow(dead_code)]
fn assert_runtime_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Arc<Runtime>>();
}
