use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

use superagent_types::{CorrelationId, EventId, SessionId};

use crate::event::{AgentEvent, AgentEventKind, EventType};
use crate::handler::EventHandler;

const DEFAULT_BROADCAST_BUFFER: usize = 1024;
const DEFAULT_HISTORY_CAPACITY: usize = 1000;

pub type SubscriptionToken = u64;

type HandlerEntry = (SubscriptionToken, Arc<dyn EventHandler>);

/// Typed pub/sub bus over [`AgentEvent`] (spec §4.2). Combines a broadcast
/// channel for streaming subscribers (the headless NDJSON writer is one)
/// with an explicit per-[`EventType`] handler registry for fire-and-forget
/// fan-out, plus a bounded ring buffer answering `get_history` queries.
pub struct EventBus {
    sender: broadcast::Sender<AgentEvent>,
    handlers: Mutex<HashMap<EventType, Vec<HandlerEntry>>>,
    history: Mutex<VecDeque<AgentEvent>>,
    history_capacity: usize,
    sequence: AtomicU64,
    token_source: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_history_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_history_capacity(history_capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_BROADCAST_BUFFER);
        Self {
            sender,
            handlers: Mutex::new(HashMap::new()),
            history: Mutex::new(VecDeque::with_capacity(history_capacity.min(4096))),
            history_capacity,
            sequence: AtomicU64::new(1),
            token_source: AtomicU64::new(1),
        }
    }

    /// Raw broadcast subscription, for streaming consumers that want every
    /// event regardless of type (e.g. the headless NDJSON writer).
    pub fn subscribe_stream(&self) -> broadcast::Receiver<AgentEvent> {
        self.sender.subscribe()
    }

    /// Registers `handler` for `event_type`. Registering the same handler
    /// instance twice for the same type is a no-op and returns the existing
    /// token (spec §4.2: "duplicates are idempotent").
    pub fn subscribe(&self, event_type: EventType, handler: Arc<dyn EventHandler>) -> SubscriptionToken {
        let mut handlers = self.handlers.lock();
        let entries = handlers.entry(event_type).or_default();
        if let Some((token, _)) = entries.iter().find(|(_, h)| Arc::ptr_eq(h, &handler)) {
            return *token;
        }
        let token = self.token_source.fetch_add(1, Ordering::Relaxed);
        entries.push((token, handler));
        token
    }

    /// Removes a previously registered handler. Returns `true` if a handler
    /// was actually removed.
    pub fn unsubscribe(&self, event_type: EventType, token: SubscriptionToken) -> bool {
        let mut handlers = self.handlers.lock();
        match handlers.get_mut(&event_type) {
            Some(entries) => {
                let before = entries.len();
                entries.retain(|(t, _)| *t != token);
                before != entries.len()
            }
            None => false,
        }
    }

    pub fn handler_count(&self, event_type: EventType) -> usize {
        self.handlers.lock().get(&event_type).map(Vec::len).unwrap_or(0)
    }

    /// Builds and publishes an event, appending it to history, broadcasting
    /// it to streaming subscribers, and fanning it out to every handler
    /// registered for its [`EventType`]. Returns once every handler has
    /// completed or hit its deadline (spec §4.2).
    pub async fn publish(
        &self,
        session_id: SessionId,
        correlation_id: Option<CorrelationId>,
        kind: AgentEventKind,
    ) -> AgentEvent {
        let event = self.build_event(session_id, correlation_id, kind);
        self.publish_raw(event.clone()).await;
        event
    }

    /// Publishes a fully-materialized event without touching `seq`/`timestamp`.
    pub async fn publish_raw(&self, event: AgentEvent) {
        self.record_history(event.clone());
        let _ = self.sender.send(event.clone());
        self.dispatch_to_handlers(event).await;
    }

    async fn dispatch_to_handlers(&self, event: AgentEvent) {
        let event_type = event.event_type();
        let targets: Vec<Arc<dyn EventHandler>> = {
            self.handlers
                .lock()
                .get(&event_type)
                .map(|entries| entries.iter().map(|(_, h)| Arc::clone(h)).collect())
                .unwrap_or_default()
        };

        if targets.is_empty() {
            return;
        }

        let mut tasks = JoinSet::new();
        for handler in targets {
            let event = event.clone();
            tasks.spawn(async move {
                let outcome = match handler.deadline() {
                    Some(deadline) => tokio::time::timeout(deadline, handler.handle(&event))
                        .await
                        .map_err(|_| crate::error::EventBusError::HandlerTimedOut(deadline))
                        .and_then(|inner| inner),
                    None => handler.handle(&event).await,
                };
                (event.id.clone(), outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((event_id, Ok(()))) => {
                    log::trace!("event handler completed for event {event_id}");
                }
                Ok((event_id, Err(err))) => {
                    log::error!("event handler failed for event {event_id}: {err}");
                }
                Err(join_err) => {
                    log::error!("event handler task panicked: {join_err}");
                }
            }
        }
    }

    fn record_history(&self, event: AgentEvent) {
        let mut history = self.history.lock();
        if history.len() >= self.history_capacity {
            history.pop_front();
        }
        history.push_back(event);
    }

    /// Filtered view of the ring buffer in arrival order (spec §4.2).
    pub fn get_history(
        &self,
        event_type: Option<EventType>,
        correlation_id: Option<&CorrelationId>,
        limit: usize,
    ) -> Vec<AgentEvent> {
        self.history
            .lock()
            .iter()
            .filter(|event| event_type.is_none_or(|t| event.event_type() == t))
            .filter(|event| {
                correlation_id.is_none_or(|cid| event.correlation_id.as_ref() == Some(cid))
            })
            .rev()
            .take(limit)
            .rev()
            .cloned()
            .collect()
    }

    fn build_event(
        &self,
        session_id: SessionId,
        correlation_id: Option<CorrelationId>,
        kind: AgentEventKind,
    ) -> AgentEvent {
        AgentEvent {
            id: EventId::generate(),
            seq: self.sequence.fetch_add(1, Ordering::Relaxed),
            timestamp: time::OffsetDateTime::now_utc().unix_timestamp(),
            session_id,
            correlation_id,
            kind,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
