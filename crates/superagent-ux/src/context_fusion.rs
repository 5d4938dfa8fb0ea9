use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use superagent_memory::AdaptiveMemory;
use superagent_types::{
    ContextNode, ContextNodeId, ContextNodeType, Message, Plan, SessionId, UnifiedContext,
};

const HISTORY_WINDOW: usize = 10;
const DEFAULT_RETRIEVAL_K: usize = 5;
const DECAY_FACTOR: f32 = 0.9;

/// Read-only service merging conversation history, active files, the tool
/// set, the current plan, and memory retrievals into one [`UnifiedContext`]
/// (spec §4.6 "Context fusion"). This is the fuller, cached counterpart to
/// the lightweight fusion the orchestrator does inline before publishing
/// `PLAN_REQUESTED` (see `superagent-agents::Orchestrator::fuse_context`).
pub struct ContextFusion {
    memory: Arc<AdaptiveMemory>,
    cache: Mutex<HashMap<SessionId, UnifiedContext>>,
}

impl ContextFusion {
    pub fn new(memory: Arc<AdaptiveMemory>) -> Self {
        Self { memory, cache: Mutex::new(HashMap::new()) }
    }

    /// Fuses a fresh context for `session_id` and caches it, replacing any
    /// previously cached context for that session.
    pub async fn fuse(
        &self,
        session_id: SessionId,
        history: &[Message],
        active_files: &[String],
        active_tools: &[String],
        current_plan: Option<&Plan>,
        goal_text: &str,
        now: i64,
    ) -> UnifiedContext {
        let mut context = UnifiedContext::empty(session_id.clone());
        context.active_files = active_files.to_vec();
        context.active_tools = active_tools.to_vec();
        context.current_plan = current_plan.cloned();

        let start = history.len().saturating_sub(HISTORY_WINDOW);
        context.conversation_history = history[start..].to_vec();

        let window_len = context.conversation_history.len();
        for (idx, message) in context.conversation_history.iter().enumerate() {
            let distance_from_latest = (window_len - 1 - idx) as i32;
            let relevance = DECAY_FACTOR.powi(distance_from_latest);
            context.nodes.push(ContextNode {
                id: ContextNodeId::generate(),
                node_type: ContextNodeType::Conversation,
                content: message.content.as_text(),
                relevance_score: relevance,
                timestamp: message.timestamp,
                relationships: Vec::new(),
            });
        }

        if !goal_text.is_empty() {
            let retrieved = self.memory.retrieve_default(goal_text, DEFAULT_RETRIEVAL_K, now).await;
            for hit in retrieved {
                context.nodes.push(ContextNode {
                    id: ContextNodeId::generate(),
                    node_type: ContextNodeType::Memory,
                    content: hit.item.content,
                    relevance_score: hit.score,
                    timestamp: hit.item.timestamp,
                    relationships: Vec::new(),
                });
            }
        }

        self.cache.lock().insert(session_id, context.clone());
        context
    }

    /// Returns the last fused context for `session_id`, or `None` if no
    /// context has been fused for that session yet (spec §4.6
    /// `get_cached_context`).
    pub fn get_cached_context(&self, session_id: &SessionId) -> Option<UnifiedContext> {
        self.cache.lock().get(session_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use superagent_types::Role;

    #[tokio::test]
    async fn caches_the_most_recently_fused_context() {
        let memory = Arc::new(AdaptiveMemory::default());
        let fusion = ContextFusion::new(memory);
        let session = SessionId::generate();

        assert!(fusion.get_cached_context(&session).is_none());

        let history = vec![Message::text(Role::User, "hello", 0)];
        fusion.fuse(session.clone(), &history, &[], &[], None, "hello", 0).await;

        let cached = fusion.get_cached_context(&session).expect("cached context");
        assert_eq!(cached.conversation_history.len(), 1);
    }

    #[tokio::test]
    async fn truncates_history_to_the_last_ten_messages() {
        let memory = Arc::new(AdaptiveMemory::default());
        let fusion = ContextFusion::new(memory);
        let session = SessionId::generate();

        let history: Vec<Message> =
            (0..25).map(|i| Message::text(Role::User, format!("msg-{i}"), i as i64)).collect();
        let context = fusion.fuse(session, &history, &[], &[], None, "", 0).await;

        assert_eq!(context.conversation_history.len(), 10);
        assert_eq!(context.conversation_history[9].timestamp, 24);
    }
}
