use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::ids::MemoryItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    ShortTerm,
    Working,
    LongTerm,
    Episodic,
    Semantic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryItem {
    pub id: MemoryItemId,
    pub content: String,
    pub memory_type: MemoryType,
    pub timestamp: i64,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub importance: f32,
    pub access_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<i64>,
}

impl MemoryItem {
    pub fn new(id: MemoryItemId, content: impl Into<String>, memory_type: MemoryType, timestamp: i64) -> Self {
        Self {
            id,
            content: content.into(),
            memory_type,
            timestamp,
            metadata: HashMap::new(),
            embedding: None,
            importance: 0.5,
            access_count: 0,
            last_accessed: None,
        }
    }

    /// Records an access. `access_count` is invariantly monotonic
    /// non-decreasing (spec §3).
    pub fn record_access(&mut self, at: i64) {
        self.access_count += 1;
        self.last_accessed = Some(at);
    }
}
