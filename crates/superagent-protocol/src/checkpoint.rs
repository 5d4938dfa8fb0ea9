//! Checkpoint document persistence (spec §6): `{checkpoint_id, session_id,
//! created_at, description, state}` where `state` is an opaque serialized
//! session object, one file per checkpoint.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use superagent_types::{CheckpointId, SessionId};

use crate::error::ProtocolError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub checkpoint_id: CheckpointId,
    pub session_id: SessionId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
    pub description: String,
    pub state: Value,
}

impl CheckpointRecord {
    pub fn new(
        checkpoint_id: CheckpointId,
        session_id: SessionId,
        description: impl Into<String>,
        state: Value,
    ) -> Self {
        Self {
            checkpoint_id,
            session_id,
            created_at: time::OffsetDateTime::now_utc(),
            description: description.into(),
            state,
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProtocolError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProtocolError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_opaque_state_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        let record = CheckpointRecord::new(
            CheckpointId::generate(),
            SessionId::generate(),
            "before risky rewrite",
            json!({"messages": [], "active_files": ["README.md"]}),
        );
        record.save(&path).unwrap();

        let loaded = CheckpointRecord::load(&path).unwrap();
        assert_eq!(loaded.checkpoint_id, record.checkpoint_id);
        assert_eq!(loaded.description, "before risky rewrite");
        assert_eq!(loaded.state["active_files"][0], json!("README.md"));
    }
}
