//! Headless NDJSON event stream (spec §6): one JSON object per line,
//! emitted for every event except the internal orchestration events that
//! coordinate agents over the bus (`AgentEventKind::wire_name` prefixed
//! `internal.`). Grounded on the teacher's `events.rs` serde-tagging style
//! and `cli`'s line-oriented stdout writers.

use serde_json::{json, Value};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast;

use superagent_events::AgentEvent;

use crate::error::ProtocolError;
use crate::redact::redact_value;

fn is_internal(event: &AgentEvent) -> bool {
    event.kind.wire_name().starts_with("internal.")
}

/// Builds the wire-format JSON object for one event (spec §6 table): the
/// common envelope (`event`, `ts`, `session_id`, `request_id`,
/// `correlation_id?`) plus the event-kind-specific extra fields, flattened
/// to the top level rather than nested under `data`.
pub fn to_wire_value(event: &AgentEvent) -> Value {
    let mut extra = serde_json::to_value(&event.kind).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut extra {
        map.remove("type");
    }

    let mut wire = json!({
        "event": event.kind.wire_name(),
        "ts": rfc3339(event.timestamp),
        "session_id": event.session_id.as_str(),
        "request_id": event.id.as_str(),
    });

    if let Some(correlation_id) = &event.correlation_id {
        wire["correlation_id"] = json!(correlation_id.as_str());
    }

    if let (Value::Object(extra_map), Value::Object(wire_map)) = (extra, &mut wire) {
        for (key, value) in extra_map {
            wire_map.insert(key, value);
        }
    }

    redact_value(&mut wire);
    wire
}

fn rfc3339(unix_timestamp: i64) -> String {
    time::OffsetDateTime::from_unix_timestamp(unix_timestamp)
        .ok()
        .and_then(|dt| dt.format(&time::format_description::well_known::Rfc3339).ok())
        .unwrap_or_else(|| unix_timestamp.to_string())
}

/// Serializes events to an `\n`-delimited UTF-8 stream. One line per
/// event, no embedded newlines (spec §6 "Line format").
pub struct NdjsonWriter<W> {
    sink: W,
}

impl<W: AsyncWrite + Unpin> NdjsonWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Writes a single event, skipping internal orchestration events. No-op
    /// (returns `Ok(())`) for an internal event rather than erroring, since
    /// callers driving this from a generic event stream shouldn't need to
    /// pre-filter.
    pub async fn write_event(&mut self, event: &AgentEvent) -> Result<(), ProtocolError> {
        if is_internal(event) {
            return Ok(());
        }
        let wire = to_wire_value(event);
        let mut line = serde_json::to_string(&wire)?;
        line.push('\n');
        self.sink.write_all(line.as_bytes()).await?;
        self.sink.flush().await?;
        Ok(())
    }

    /// Drains a broadcast receiver until the sender side is dropped,
    /// writing one line per non-internal event. Lagged receivers (the
    /// consumer fell behind the bus's broadcast buffer) are logged and
    /// skipped rather than treated as fatal, since NDJSON consumers are
    /// best-effort observers, not participants in orchestration. Returns
    /// the inner sink once the stream closes, so callers (and tests) can
    /// inspect or reuse it.
    pub async fn run(mut self, mut events: broadcast::Receiver<AgentEvent>) -> Result<W, ProtocolError> {
        loop {
            match events.recv().await {
                Ok(event) => self.write_event(&event).await?,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("ndjson writer lagged, dropped {skipped} events");
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(self.sink),
            }
        }
    }
}

/// Minimal in-memory [`AsyncWrite`], used by tests so assertions don't
/// depend on any particular `AsyncWrite` impl existing for bare `Vec<u8>`.
#[cfg(test)]
pub(crate) struct MemorySink(pub Vec<u8>);

#[cfg(test)]
impl AsyncWrite for MemorySink {
    fn poll_write(
        mut self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<std::io::Result<usize>> {
        self.0.extend_from_slice(buf);
        std::task::Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(
        self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn poll_shutdown(
        self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        std::task::Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use superagent_events::{AgentEventKind, EventBus};
    use superagent_types::SessionId;

    #[tokio::test]
    async fn wire_value_flattens_kind_fields_and_uses_dotted_name() {
        let bus = EventBus::new();
        let event = bus
            .publish(
                SessionId::generate(),
                None,
                AgentEventKind::PlanCreated {
                    steps: vec![json!({"id": "s1"})],
                    intent: "code_write".into(),
                    confidence: 0.8,
                },
            )
            .await;

        let wire = to_wire_value(&event);
        assert_eq!(wire["event"], json!("plan.created"));
        assert_eq!(wire["intent"], json!("code_write"));
        assert_eq!(wire["confidence"], json!(0.8));
        assert!(wire.get("type").is_none());
        assert!(wire.get("correlation_id").is_none());
    }

    #[tokio::test]
    async fn internal_events_are_skipped_by_write_event() {
        let bus = EventBus::new();
        let event = bus
            .publish(
                SessionId::generate(),
                None,
                AgentEventKind::PlanRequested {
                    task_id: "t1".into(),
                    goal: "do it".into(),
                    task: json!({}),
                    context: json!({}),
                },
            )
            .await;

        let mut writer = NdjsonWriter::new(MemorySink(Vec::new()));
        writer.write_event(&event).await.unwrap();
        assert!(writer.sink.0.is_empty());
    }

    #[tokio::test]
    async fn redacts_secret_bearing_fields_before_writing() {
        let bus = EventBus::new();
        let event = bus
            .publish(
                SessionId::generate(),
                None,
                AgentEventKind::ToolRequested {
                    tool_name: "http_call".into(),
                    tool_args: json!({"api_key": "sk-abcdefghijklmno"}),
                    requires_consent: true,
                },
            )
            .await;

        let mut writer = NdjsonWriter::new(MemorySink(Vec::new()));
        writer.write_event(&event).await.unwrap();
        let line = String::from_utf8(writer.sink.0).unwrap();
        assert!(!line.contains("sk-abcdefghijklmno"));
        assert!(line.contains("***REDACTED***"));
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
    }
}
