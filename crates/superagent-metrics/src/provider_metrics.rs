use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Snapshot of a single provider's running counters. Spec §3 `ProviderMetrics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderMetricsSnapshot {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub avg_latency_ms: f64,
    pub last_error: Option<String>,
}

/// Mutable per-provider counters, updated under a lock (spec §5:
/// "per-provider metrics are updated under a lock or with atomic counters").
/// A single `parking_lot::Mutex` around the whole struct is simpler than
/// juggling independent atomics and is fine here since updates are brief
/// (no I/O happens while the lock is held), matching the short-critical-
/// section guidance the teacher's `event_bus.rs` follows for its observer
/// list.
#[derive(Debug, Default)]
struct Counters {
    total: u64,
    successful: u64,
    failed: u64,
    total_tokens: u64,
    total_cost: f64,
    avg_latency_ms: f64,
    last_error: Option<String>,
}

impl Counters {
    fn record_success(&mut self, tokens: u64, cost: f64, latency_ms: u64) {
        self.total += 1;
        self.successful += 1;
        self.total_tokens += tokens;
        self.total_cost += cost;
        self.update_running_mean(latency_ms as f64);
    }

    fn record_failure(&mut self, latency_ms: u64, error: String) {
        self.total += 1;
        self.failed += 1;
        self.last_error = Some(error);
        self.update_running_mean(latency_ms as f64);
    }

    fn update_running_mean(&mut self, latency_ms: f64) {
        // Welford-style running mean over `total` samples (successes and
        // failures both contribute a latency sample).
        let n = self.total as f64;
        self.avg_latency_ms += (latency_ms - self.avg_latency_ms) / n;
    }

    fn snapshot(&self) -> ProviderMetricsSnapshot {
        ProviderMetricsSnapshot {
            total: self.total,
            successful: self.successful,
            failed: self.failed,
            total_tokens: self.total_tokens,
            total_cost: self.total_cost,
            avg_latency_ms: self.avg_latency_ms,
            last_error: self.last_error.clone(),
        }
    }
}

#[derive(Default)]
pub struct ProviderMetricsRegistry {
    providers: Mutex<HashMap<String, Counters>>,
}

impl ProviderMetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, provider: &str, tokens: u64, cost: f64, latency_ms: u64) {
        let mut guard = self.providers.lock();
        guard
            .entry(provider.to_string())
            .or_default()
            .record_success(tokens, cost, latency_ms);
    }

    pub fn record_failure(&self, provider: &str, latency_ms: u64, error: impl Into<String>) {
        let mut guard = self.providers.lock();
        guard
            .entry(provider.to_string())
            .or_default()
            .record_failure(latency_ms, error.into());
    }

    pub fn snapshot(&self, provider: &str) -> ProviderMetricsSnapshot {
        self.providers
            .lock()
            .get(provider)
            .map(Counters::snapshot)
            .unwrap_or_default()
    }

    pub fn snapshot_all(&self) -> HashMap<String, ProviderMetricsSnapshot> {
        self.providers
            .lock()
            .iter()
            .map(|(name, c)| (name.clone(), c.snapshot()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_success_and_failure_independently() {
        let registry = ProviderMetricsRegistry::new();
        registry.record_failure("openai", 10, "boom");
        registry.record_success("anthropic", 100, 0.01, 20);

        let openai = registry.snapshot("openai");
        assert_eq!(openai.failed, 1);
        assert_eq!(openai.successful, 0);
        assert_eq!(openai.last_error.as_deref(), Some("boom"));

        let anthropic = registry.snapshot("anthropic");
        assert_eq!(anthropic.successful, 1);
        assert_eq!(anthropic.total_tokens, 100);
    }

    #[test]
    fn avg_latency_is_a_running_mean() {
        let registry = ProviderMetricsRegistry::new();
        registry.record_success("p", 0, 0.0, 10);
        registry.record_success("p", 0, 0.0, 20);
        registry.record_success("p", 0, 0.0, 30);
        let snap = registry.snapshot("p");
        assert!((snap.avg_latency_ms - 20.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_provider_returns_default_snapshot() {
        let registry = ProviderMetricsRegistry::new();
        let snap = registry.snapshot("nonexistent");
        assert_eq!(snap.total, 0);
    }
}
