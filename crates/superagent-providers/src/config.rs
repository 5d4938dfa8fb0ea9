use std::time::Duration;

/// Registration-time configuration for one provider. Spec §3 `ProviderConfig`.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub models: Vec<String>,
    /// Higher is preferred during fallback.
    pub priority: i32,
    pub enabled: bool,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            api_key: None,
            base_url: None,
            models: Vec::new(),
            priority,
            enabled: true,
            timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }

    pub fn with_models(mut self, models: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn supports_model(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }
}
