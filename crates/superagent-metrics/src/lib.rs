//! Per-provider metrics counters and model cost tables.

pub mod cost;
pub mod provider_metrics;

pub use cost::{ModelRate, RateSheet};
pub use provider_metrics::{ProviderMetricsRegistry, ProviderMetricsSnapshot};
