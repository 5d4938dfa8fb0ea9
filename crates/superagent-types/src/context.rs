use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::ids::{ContextNodeId, SessionId};
use crate::message::Message;
use crate::plan::Plan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextNodeType {
    File,
    Memory,
    Conversation,
    Tool,
    Plan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextNode {
    pub id: ContextNodeId,
    #[serde(rename = "type")]
    pub node_type: ContextNodeType,
    pub content: String,
    pub relevance_score: f32,
    pub timestamp: i64,
    #[serde(default)]
    pub relationships: Vec<ContextNodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedContext {
    pub session_id: SessionId,
    pub nodes: Vec<ContextNode>,
    pub conversation_history: Vec<Message>,
    pub active_files: Vec<String>,
    pub active_tools: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_plan: Option<Plan>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl UnifiedContext {
    pub fn empty(session_id: SessionId) -> Self {
        Self {
            session_id,
            nodes: Vec::new(),
            conversation_history: Vec::new(),
            active_files: Vec::new(),
            active_tools: Vec::new(),
            current_plan: None,
            metadata: HashMap::new(),
        }
    }
}
