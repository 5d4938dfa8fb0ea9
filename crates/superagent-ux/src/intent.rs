use std::sync::Arc;

use serde::{Deserialize, Serialize};

use superagent_providers::ProviderRouter;
use superagent_types::{LLMRequest, Message, Role};

/// Fixed intent enum the UX state machine resolves user input into (spec
/// §4.6 step 2). Grounded on the teacher's own closed command/intent enums
/// (`middleware/modes.rs`) rather than an open string tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Chat,
    CodeWrite,
    CodeEdit,
    CodeReview,
    FileRead,
    FileWrite,
    Search,
    Execute,
    Plan,
    Explain,
    Debug,
    Test,
    Refactor,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntentClassification {
    pub intent: Intent,
    pub confidence: f32,
}

#[derive(Deserialize)]
struct IntentSpec {
    intent: Intent,
    #[serde(default = "default_confidence")]
    confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

/// Classifies free text into a fixed [`Intent`] via a low-temperature LLM
/// call (spec §4.6: "temperature <= 0.1"). Parse failures yield `Unknown`
/// with confidence 0 rather than propagating an error, since intent
/// resolution is advisory: the UX state machine still proceeds to planning
/// either way.
pub struct IntentResolver {
    router: Arc<ProviderRouter>,
    model: String,
}

const INTENT_PROMPT_PREFIX: &str = "Classify the user request into one of: \
chat, code_write, code_edit, code_review, file_read, file_write, search, \
execute, plan, explain, debug, test, refactor. Respond as JSON \
{\"intent\": \"...\", \"confidence\": 0..1}. Request: ";

impl IntentResolver {
    pub fn new(router: Arc<ProviderRouter>, model: impl Into<String>) -> Self {
        Self { router, model: model.into() }
    }

    pub async fn resolve(&self, text: &str) -> IntentClassification {
        let prompt = format!("{INTENT_PROMPT_PREFIX}{text}");
        let request = match LLMRequest::builder(&self.model, vec![Message::text(Role::User, prompt, 0)])
            .temperature(0.0)
            .build()
        {
            Ok(request) => request,
            Err(_) => return IntentClassification { intent: Intent::Unknown, confidence: 0.0 },
        };

        let response = match self.router.generate(&request, None, true).await {
            Ok(response) => response,
            Err(_) => return IntentClassification { intent: Intent::Unknown, confidence: 0.0 },
        };

        match parse_intent(&response.content) {
            Some(spec) => IntentClassification { intent: spec.intent, confidence: spec.confidence.clamp(0.0, 1.0) },
            None => IntentClassification { intent: Intent::Unknown, confidence: 0.0 },
        }
    }
}

fn parse_intent(content: &str) -> Option<IntentSpec> {
    serde_json::from_str(content.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_classification() {
        let spec = parse_intent(r#"{"intent": "code_edit", "confidence": 0.92}"#).unwrap();
        assert_eq!(spec.intent, Intent::CodeEdit);
        assert!((spec.confidence - 0.92).abs() < f32::EPSILON);
    }

    #[test]
    fn defaults_confidence_when_missing() {
        let spec = parse_intent(r#"{"intent": "chat"}"#).unwrap();
        assert_eq!(spec.intent, Intent::Chat);
        assert_eq!(spec.confidence, 1.0);
    }

    #[test]
    fn malformed_json_yields_none() {
        assert!(parse_intent("not json").is_none());
    }
}
