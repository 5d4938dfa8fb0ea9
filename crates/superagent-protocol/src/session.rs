//! Session snapshot persistence (spec §6 "Persisted state layouts"): one
//! JSON document per session, written with the same `time::serde::rfc3339`
//! convention the teacher uses for its own session metadata
//! (`cli/src/session/store.rs`).

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use superagent_types::{Message, SessionId};

use crate::error::ProtocolError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: time::OffsetDateTime,
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Value>,
}

impl SessionSnapshot {
    pub fn new(session_id: SessionId, model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            session_id,
            timestamp: time::OffsetDateTime::now_utc(),
            model: model.into(),
            messages,
            profile: None,
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
