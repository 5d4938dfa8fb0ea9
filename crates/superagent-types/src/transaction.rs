use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::ids::{CheckpointId, TransactionId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub checkpoint_id: CheckpointId,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesystem_snapshot_ref: Option<String>,
    pub env_snapshot: HashMap<String, String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    #[default]
    Serializable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: TransactionId,
    pub isolation_level: IsolationLevel,
    pub checkpoints: Vec<CheckpointId>,
    pub committed: bool,
    pub rolled_back: bool,
    pub start_time: i64,
}

impl Transaction {
    pub fn new(transaction_id: TransactionId, isolation_level: IsolationLevel, start_time: i64) -> Self {
        Self {
            transaction_id,
            isolation_level,
            checkpoints: Vec::new(),
            committed: false,
            rolled_back: false,
            start_time,
        }
    }

    /// Invariant from spec §3: exactly one of committed/rolled_back true at end.
    pub fn is_terminal_consistent(&self) -> bool {
        self.committed != self.rolled_back
    }
}
