//! A generic HTTP adapter wired for an OpenAI-compatible chat completions
//! endpoint (spec §4.1 supplemental detail, SPEC_FULL.md §4.1): the
//! concrete, testable adapter the router's fallback/backoff path needs to
//! be exercisable end-to-end, without committing to any single vendor's
//! quirks. Grounded on the teacher's `openai` provider crate's request/
//! response shape (`crates/providers/openai/src/api.rs`), reimplemented
//! directly on `reqwest` rather than `querymt`'s `HTTPChatProvider`
//! abstraction, since this crate has no dependency on `querymt`.
//!
//! Gated behind the `reqwest-client` feature, mirroring the teacher's own
//! `http-client` feature gate in `querymt/Cargo.toml` so the crate still
//! builds without a network dependency in minimal embeds.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use superagent_types::{FinishReason, LLMRequest, LLMResponse, ModelInfo, Role, ToolCallRequest, Usage};

use crate::adapter::ProviderAdapter;
use crate::error::ProviderError;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    id: String,
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ChatToolCall>,
}

#[derive(Debug, Deserialize)]
struct ChatToolCall {
    id: String,
    function: ChatToolCallFunction,
}

#[derive(Debug, Deserialize)]
struct ChatToolCallFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

fn finish_reason(raw: Option<&str>) -> FinishReason {
    match raw {
        Some("stop") => FinishReason::Stop,
        Some("length") => FinishReason::Length,
        Some("content_filter") => FinishReason::ContentFilter,
        Some("tool_calls") => FinishReason::ToolCalls,
        Some(_) => FinishReason::Other,
        None => FinishReason::Other,
    }
}

/// One OpenAI-compatible chat-completions endpoint. `name` is the
/// provider name used for router registration and metrics, independent
/// of which vendor actually sits behind `base_url`.
pub struct HttpAdapter {
    name: String,
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpAdapter {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key: None,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ProviderAdapter for HttpAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &LLMRequest) -> Result<LLMResponse, ProviderError> {
        let body = ChatCompletionRequest {
            model: &request.model,
            messages: request
                .messages
                .iter()
                .map(|m| ChatMessage { role: role_str(m.role), content: m.content.as_text() })
                .collect(),
            temperature: request.temperature,
            top_p: request.top_p,
            max_tokens: request.max_tokens,
            stop: request.stop.as_deref(),
            seed: request.seed,
            user: request.user.as_deref(),
        };

        let mut builder = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Provider {
                message: format!("http {status}: {text}"),
                retryable: status.as_u16() == 429 || status.is_server_error(),
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::Provider { message: err.to_string(), retryable: false })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Provider { message: "empty choices".into(), retryable: false })?;

        let tool_calls = choice
            .message
            .tool_calls
            .into_iter()
            .map(|tc| ToolCallRequest {
                id: tc.id.into(),
                tool_name: tc.function.name,
                arguments: serde_json::from_str(&tc.function.arguments).unwrap_or(Value::Null),
            })
            .collect();

        let usage = parsed
            .usage
            .map(|u| Usage { prompt: u.prompt_tokens, completion: u.completion_tokens, total: u.total_tokens })
            .unwrap_or_default();

        Ok(LLMResponse {
            id: parsed.id,
            model: parsed.model,
            content: choice.message.content.unwrap_or_default(),
            finish_reason: finish_reason(choice.finish_reason.as_deref()),
            tool_calls,
            usage,
            provider: self.name.clone(),
            latency_ms: 0,
            cost: 0.0,
        })
    }

    async fn get_model_info(&self, model: &str) -> Result<ModelInfo, ProviderError> {
        Ok(ModelInfo {
            id: model.to_string(),
            provider: self.name.clone(),
            context_window: 128_000,
            max_output_tokens: 4_096,
            supports_streaming: true,
            supports_functions: true,
            supports_vision: false,
            supports_json_mode: true,
            input_cost_per_1k: 0.0,
            output_cost_per_1k: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trims_trailing_slash() {
        let adapter = HttpAdapter::new("compat", "https://api.example.com/v1/", Duration::from_secs(5));
        assert_eq!(adapter.endpoint(), "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn finish_reason_maps_known_values() {
        assert_eq!(finish_reason(Some("stop")), FinishReason::Stop);
        assert_eq!(finish_reason(Some("tool_calls")), FinishReason::ToolCalls);
        assert_eq!(finish_reason(Some("something_new")), FinishReason::Other);
        assert_eq!(finish_reason(None), FinishReason::Other);
    }
}
