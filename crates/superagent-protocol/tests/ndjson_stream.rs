use std::pin::Pin;
use std::task::{Context, Poll};

use serde_json::{json, Value};
use tokio::io::AsyncWrite;

use superagent_events::{AgentEventKind, EventBus};
use superagent_protocol::NdjsonWriter;
use superagent_types::SessionId;

/// Minimal in-memory sink so the test doesn't depend on any particular
/// `AsyncWrite` impl existing for bare `Vec<u8>`.
struct MemorySink(Vec<u8>);

impl AsyncWrite for MemorySink {
    fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<std::io::Result<usize>> {
        self.0.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn writes_one_line_per_wire_event_in_publish_order_skipping_internal() {
    let bus = EventBus::new();
    let session_id = SessionId::generate();
    let rx = bus.subscribe_stream();

    let writer_task = tokio::spawn(async move {
        let sink = MemorySink(Vec::new());
        NdjsonWriter::new(sink).run(rx).await.unwrap().0
    });

    bus.publish(
        session_id.clone(),
        None,
        AgentEventKind::SessionStarted { checkpoint_id: None, metadata: json!({}) },
    )
    .await;
    bus.publish(
        session_id.clone(),
        None,
        AgentEventKind::PlanRequested {
            task_id: "t1".into(),
            goal: "update README".into(),
            task: json!({}),
            context: json!({}),
        },
    )
    .await;
    bus.publish(
        session_id.clone(),
        None,
        AgentEventKind::PlanCreated { steps: vec![json!({"id": "s1"})], intent: "code_write".into(), confidence: 0.9 },
    )
    .await;
    bus.publish(
        session_id.clone(),
        None,
        AgentEventKind::DiffApplied {
            file_path: "README.md".into(),
            hunks_applied: Some(vec![0]),
            checkpoint_id: None,
        },
    )
    .await;
    drop(bus);

    let out = writer_task.await.unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();

    // `internal.plan_requested` is filtered; only the three wire-facing events remain.
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["event"], json!("session.started"));
    assert_eq!(lines[1]["event"], json!("plan.created"));
    assert_eq!(lines[1]["intent"], json!("code_write"));
    assert_eq!(lines[2]["event"], json!("diff.applied"));
    assert_eq!(lines[2]["file_path"], json!("README.md"));
    for line in &lines {
        assert_eq!(line["session_id"], json!(session_id.as_str()));
        assert!(line["request_id"].is_string());
        assert!(line["ts"].is_string());
    }
}
