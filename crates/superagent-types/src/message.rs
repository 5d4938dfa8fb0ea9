use serde::{Deserialize, Serialize};

use crate::ids::ToolCallId;

/// Role of a participant in a conversation. Spec §3 `Message.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Content of a message: either plain text or a sequence of structured parts.
///
/// Modeled as a discriminated union rather than an open dictionary, per
/// the translation guidance in spec §9 ("dynamic typing -> tagged variants").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessagePart {
    Text { text: String },
    ImageUrl { url: String },
    ToolResult { tool_call_id: ToolCallId, content: String, is_error: bool },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<MessagePart>),
}

impl MessageContent {
    /// Best-effort flattening to plain text, used by token counting and
    /// memory compression, both of which only care about the words.
    pub fn as_text(&self) -> String {
        match self {
            MessageContent::Text(t) => t.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    MessagePart::Text { text } => Some(text.clone()),
                    MessagePart::ToolResult { content, .. } => Some(content.clone()),
                    MessagePart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// A single message in a conversation. Immutable once appended; callers
/// that need to "edit" a message should append a new one instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_call_refs: Vec<ToolCallId>,
    pub timestamp: i64,
}

impl Message {
    pub fn text(role: Role, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role,
            content: MessageContent::Text(content.into()),
            name: None,
            tool_call_refs: Vec::new(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_text_parts_for_compression() {
        let msg = Message {
            role: Role::Assistant,
            content: MessageContent::Parts(vec![
                MessagePart::Text { text: "hello".into() },
                MessagePart::ImageUrl { url: "http://x".into() },
                MessagePart::Text { text: "world".into() },
            ]),
            name: None,
            tool_call_refs: Vec::new(),
            timestamp: 0,
        };
        assert_eq!(msg.content.as_text(), "hello\nworld");
    }

    #[test]
    fn round_trips_through_json() {
        let msg = Message::text(Role::User, "hi", 1700000000);
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.content.as_text(), "hi");
        assert_eq!(back.role, Role::User);
    }
}
