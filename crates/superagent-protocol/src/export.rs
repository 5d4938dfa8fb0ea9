//! Conversation export formats (spec §6): plain text, markdown, HTML, and
//! JSON. JSON wraps `{export_date, format_version, messages}` and round
//! trips; the other three are lossy (no re-import) but preserve
//! `(role, content, timestamp)` ordering.

use serde::{Deserialize, Serialize};

use superagent_types::{Message, Role};

use crate::error::ProtocolError;

const FORMAT_VERSION: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Markdown,
    Html,
    Json,
}

/// The JSON export envelope (spec §6): the only format that round-trips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationExport {
    pub export_date: String,
    pub format_version: String,
    pub messages: Vec<Message>,
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Renders `messages` in `format`, preserving arrival order in every case.
pub fn export(messages: &[Message], format: ExportFormat, export_date: &str) -> Result<String, ProtocolError> {
    match format {
        ExportFormat::Text => Ok(export_text(messages)),
        ExportFormat::Markdown => Ok(export_markdown(messages)),
        ExportFormat::Html => Ok(export_html(messages)),
        ExportFormat::Json => export_json(messages, export_date),
    }
}

fn export_text(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("[{}] {}: {}", m.timestamp, role_label(m.role), m.content.as_text()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn export_markdown(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("**{}** ({})\n\n{}\n", role_label(m.role), m.timestamp, m.content.as_text()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn export_html(messages: &[Message]) -> String {
    let mut out = String::from("<!DOCTYPE html>\n<html><body>\n");
    for message in messages {
        out.push_str(&format!(
            "<div class=\"message\" data-role=\"{}\" data-timestamp=\"{}\"><p>{}</p></div>\n",
            role_label(message.role),
            message.timestamp,
            html_escape(&message.content.as_text())
        ));
    }
    out.push_str("</body></html>\n");
    out
}

fn export_json(messages: &[Message], export_date: &str) -> Result<String, ProtocolError> {
    let envelope = ConversationExport {
        export_date: export_date.to_string(),
        format_version: FORMAT_VERSION.to_string(),
        messages: messages.to_vec(),
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Parses a JSON export envelope back into its messages (spec §8: "JSON
/// round-trips"). The only import path this module offers — txt/md/html
/// are documented as lossy and intentionally have none.
pub fn import_json(content: &str) -> Result<Vec<Message>, ProtocolError> {
    let envelope: ConversationExport = serde_json::from_str(content)?;
    Ok(envelope.messages)
}
