use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::ToolCallId;
use crate::message::Message;

/// Error produced while constructing an [`LLMRequest`]. Spec §8: "Empty
/// message list rejected at request construction", "temperature ... < 0
/// or > 2 rejected".
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RequestValidationError {
    #[error("messages must not be empty")]
    EmptyMessages,
    #[error("temperature {0} is out of range [0, 2]")]
    TemperatureOutOfRange(String),
    #[error("top_p {0} is out of range [0, 1]")]
    TopPOutOfRange(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    #[default]
    Auto,
    Any,
    None,
    Tool(String),
}

/// A single LLM invocation. Validated at construction per spec §3 / §8.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

pub struct LLMRequestBuilder {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: Option<u32>,
    top_p: f32,
    stop: Option<Vec<String>>,
    tools: Option<Vec<ToolDefinition>>,
    tool_choice: Option<ToolChoice>,
    stream: bool,
    seed: Option<u64>,
    user: Option<String>,
    metadata: HashMap<String, Value>,
}

impl LLMRequest {
    pub fn builder(model: impl Into<String>, messages: Vec<Message>) -> LLMRequestBuilder {
        LLMRequestBuilder {
            model: model.into(),
            messages,
            temperature: 1.0,
            max_tokens: None,
            top_p: 1.0,
            stop: None,
            tools: None,
            tool_choice: None,
            stream: false,
            seed: None,
            user: None,
            metadata: HashMap::new(),
        }
    }
}

impl LLMRequestBuilder {
    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.top_p = p;
        self
    }

    pub fn stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn build(self) -> Result<LLMRequest, RequestValidationError> {
        if self.messages.is_empty() {
            return Err(RequestValidationError::EmptyMessages);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(RequestValidationError::TemperatureOutOfRange(
                self.temperature.to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(RequestValidationError::TopPOutOfRange(self.top_p.to_string()));
        }
        Ok(LLMRequest {
            model: self.model,
            messages: self.messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
            stop: self.stop,
            tools: self.tools,
            tool_choice: self.tool_choice,
            stream: self.stream,
            seed: self.seed,
            user: self.user,
            metadata: self.metadata,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    Error,
    Other,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt: u32,
    pub completion: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: ToolCallId,
    pub tool_name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
    pub id: String,
    pub model: String,
    pub content: String,
    pub finish_reason: FinishReason,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    pub usage: Usage,
    pub provider: String,
    pub latency_ms: u64,
    pub cost: f64,
}

/// One chunk of a streaming response. Chunks sharing `id` belong to one
/// stream; concatenating `delta` yields the unary response's `content`
/// (spec §8 property 4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMStreamChunk {
    pub id: String,
    pub model: String,
    pub delta: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<crate::message::Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
}

impl fmt::Display for RequestValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub provider: String,
    pub context_window: u32,
    pub max_output_tokens: u32,
    pub supports_streaming: bool,
    pub supports_functions: bool,
    pub supports_vision: bool,
    pub supports_json_mode: bool,
    pub input_cost_per_1k: f64,
    pub output_cost_per_1k: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    fn msgs() -> Vec<Message> {
        vec![Message::text(Role::User, "hi", 0)]
    }

    #[test]
    fn rejects_empty_messages() {
        let err = LLMRequest::builder("gpt-4", Vec::new()).build().unwrap_err();
        assert_eq!(err, RequestValidationError::EmptyMessages);
    }

    #[test]
    fn accepts_temperature_boundaries() {
        for t in [0.0, 1.0, 2.0] {
            assert!(LLMRequest::builder("gpt-4", msgs()).temperature(t).build().is_ok());
        }
    }

    #[test]
    fn rejects_temperature_out_of_range() {
        assert!(LLMRequest::builder("gpt-4", msgs()).temperature(-0.1).build().is_err());
        assert!(LLMRequest::builder("gpt-4", msgs()).temperature(2.1).build().is_err());
    }

    #[test]
    fn rejects_top_p_out_of_range() {
        assert!(LLMRequest::builder("gpt-4", msgs()).top_p(1.5).build().is_err());
    }
}
