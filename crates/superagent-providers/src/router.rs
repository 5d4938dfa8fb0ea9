use std::sync::Arc;

use superagent_metrics::{ProviderMetricsRegistry, ProviderMetricsSnapshot, RateSheet};
use superagent_types::{LLMRequest, LLMResponse, ModelInfo};

use crate::adapter::{Capability, ChunkStream, ProviderAdapter};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::retry::{with_retries, RetryPolicy};

struct RegisteredProvider {
    config: ProviderConfig,
    adapter: Arc<dyn ProviderAdapter>,
}

/// Unified entry point for LLM calls: owns the priority-ordered fallback
/// chain, per-provider retry policy, token counting, and cost/metrics
/// bookkeeping described in spec §4.1.
pub struct ProviderRouter {
    providers: Vec<RegisteredProvider>,
    metrics: ProviderMetricsRegistry,
    rates: RateSheet,
}

impl ProviderRouter {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            metrics: ProviderMetricsRegistry::new(),
            rates: RateSheet::new(),
        }
    }

    /// Registers a provider. Providers are tried in descending `priority`
    /// order during fallback; ties keep registration order.
    pub fn register(&mut self, config: ProviderConfig, adapter: Arc<dyn ProviderAdapter>) {
        self.providers.push(RegisteredProvider { config, adapter });
        self.providers
            .sort_by(|a, b| b.config.priority.cmp(&a.config.priority));
    }

    pub fn metrics(&self) -> &ProviderMetricsRegistry {
        &self.metrics
    }

    pub fn rates(&self) -> &RateSheet {
        &self.rates
    }

    fn candidates(&self, model: Option<&str>) -> Vec<&RegisteredProvider> {
        self.providers
            .iter()
            .filter(|p| p.config.enabled)
            .filter(|p| match model {
                Some(m) => p.config.models.is_empty() || p.config.supports_model(m),
                None => true,
            })
            .collect()
    }

    /// All enabled providers in descending priority order, regardless of
    /// whether they already list `request.model` (spec §4.1 fallback:
    /// "iterate remaining enabled providers in descending priority").
    fn enabled_providers(&self) -> Vec<&RegisteredProvider> {
        self.providers.iter().filter(|p| p.config.enabled).collect()
    }

    /// The model a fallback attempt against `candidate` should request:
    /// the provider's first configured model supporting `Capability::Chat`
    /// (spec §4.1 "rewrite `request.model` to that provider's first
    /// configured model supporting the required capability"). A provider
    /// with no configured models is assumed to accept the caller's model
    /// as-is (pass-through adapters, e.g. local servers).
    fn fallback_model_for(&self, candidate: &RegisteredProvider, original_model: &str) -> Option<String> {
        if !candidate.adapter.supports_capability(Capability::Chat) {
            return None;
        }
        match candidate.config.models.first() {
            Some(model) => Some(model.clone()),
            None => Some(original_model.to_string()),
        }
    }

    /// Generates a completion. The initial provider is resolved from
    /// `provider` if given, else mapped from `request.model`. On failure
    /// with `enable_fallback` set, every other enabled provider is tried
    /// in descending priority order with `request.model` rewritten to
    /// that provider's own first configured model (spec §4.1). Each
    /// provider gets exactly one attempt (with its own retry policy);
    /// fallback attempts never chain further.
    pub async fn generate(
        &self,
        request: &LLMRequest,
        provider: Option<&str>,
        enable_fallback: bool,
    ) -> Result<LLMResponse, ProviderError> {
        let mut attempts: Vec<(&RegisteredProvider, String)> = match provider {
            Some(name) => self
                .providers
                .iter()
                .filter(|p| p.config.name == name)
                .map(|p| (p, request.model.clone()))
                .collect(),
            None => {
                let primary = self.candidates(Some(&request.model)).into_iter().next();
                match primary {
                    Some(p) => vec![(p, request.model.clone())],
                    None => Vec::new(),
                }
            }
        };

        if attempts.is_empty() {
            return Err(ProviderError::NoProviderForModel(request.model.clone()));
        }

        if enable_fallback {
            let tried = attempts[0].0.config.name.clone();
            for candidate in self.enabled_providers() {
                if candidate.config.name == tried {
                    continue;
                }
                if let Some(model) = self.fallback_model_for(candidate, &request.model) {
                    attempts.push((candidate, model));
                }
            }
        }

        let mut last_err: Option<ProviderError> = None;
        for (candidate, model) in &attempts {
            let mut attempt_request = request.clone();
            attempt_request.model = model.clone();

            let policy = RetryPolicy::from_max_retries(candidate.config.max_retries);
            let started = std::time::Instant::now();
            let result = with_retries(policy, || candidate.adapter.generate(&attempt_request)).await;

            match result {
                Ok(mut response) => {
                    let latency_ms = started.elapsed().as_millis() as u64;
                    response.latency_ms = latency_ms;
                    response.provider = candidate.config.name.clone();
                    response.model = model.clone();
                    let cost = self.rates.compute_cost(&response.model, response.usage);
                    response.cost = cost;
                    self.metrics.record_success(
                        &candidate.config.name,
                        response.usage.total as u64,
                        cost,
                        latency_ms,
                    );
                    return Ok(response);
                }
                Err(err) => {
                    let latency_ms = started.elapsed().as_millis() as u64;
                    self.metrics
                        .record_failure(&candidate.config.name, latency_ms, err.to_string());
                    last_err = Some(err);
                    if !enable_fallback {
                        break;
                    }
                }
            }
        }

        Err(ProviderError::AllProvidersFailed(Box::new(
            last_err.unwrap_or_else(|| ProviderError::NoProviderForModel(request.model.clone())),
        )))
    }

    /// Streams a completion from a single provider. Streaming never falls
    /// back across providers (spec §4.1).
    pub async fn stream(
        &self,
        request: &LLMRequest,
        provider: Option<&str>,
    ) -> Result<ChunkStream, ProviderError> {
        let candidate = match provider {
            Some(name) => self.providers.iter().find(|p| p.config.name == name),
            None => self.candidates(Some(&request.model)).into_iter().next(),
        }
        .ok_or_else(|| ProviderError::NoProviderForModel(request.model.clone()))?;

        candidate.adapter.stream(request).await
    }

    /// Counts tokens via the provider backing `model`, falling back to the
    /// `ceil(len/4)` heuristic when no registered provider serves it.
    pub async fn count_tokens(&self, text: &str, model: &str) -> Result<u32, ProviderError> {
        match self.candidates(Some(model)).into_iter().next() {
            Some(candidate) => candidate.adapter.count_tokens(text, model).await,
            None => Ok(text.len().div_ceil(4) as u32),
        }
    }

    pub async fn get_model_info(&self, model: &str) -> Result<ModelInfo, ProviderError> {
        let candidate = self
            .candidates(Some(model))
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NoProviderForModel(model.to_string()))?;
        candidate.adapter.get_model_info(model).await
    }

    pub fn metrics_snapshot(&self, provider: &str) -> ProviderMetricsSnapshot {
        self.metrics.snapshot(provider)
    }
}

impl Default for ProviderRouter {
    fn default() -> Self {
        Self::new()
    }
}
