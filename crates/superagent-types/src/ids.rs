//! Newtype identifiers used throughout the execution core.
//!
//! Plain `String` ids are easy to transpose (a `StepId` passed where a
//! `TaskId` was expected compiles silently); these wrappers make that a
//! type error instead.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

id_type!(SessionId);
id_type!(EventId);
id_type!(TaskId);
id_type!(StepId);
id_type!(ToolCallId);
id_type!(MemoryItemId);
id_type!(CheckpointId);
id_type!(TransactionId);
id_type!(CorrelationId);
id_type!(ContextNodeId);
