use parking_lot::RwLock;
use std::collections::HashMap;

use superagent_types::{ModelInfo, Usage};

/// Per-1k-token input/output rates for a model, used by cost computation
/// (spec §4.1: "cost computation ... using the model's rate sheet").
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelRate {
    pub input_cost_per_1k: f64,
    pub output_cost_per_1k: f64,
}

/// In-memory rate sheet. A real deployment would refresh this from a
/// pricing feed the way the teacher's `querymt::pricing` module refreshes
/// from the OpenRouter models API on a 24h cache; that refresh mechanism
/// is out of scope here (it is network/config plumbing, not core
/// executor/router logic) so this type just holds whatever rates the
/// embedder registers.
#[derive(Default)]
pub struct RateSheet {
    rates: RwLock<HashMap<String, ModelRate>>,
}

impl RateSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, model: impl Into<String>, rate: ModelRate) {
        self.rates.write().insert(model.into(), rate);
    }

    pub fn register_from_model_info(&self, info: &ModelInfo) {
        self.register(
            info.id.clone(),
            ModelRate {
                input_cost_per_1k: info.input_cost_per_1k,
                output_cost_per_1k: info.output_cost_per_1k,
            },
        );
    }

    /// `cost = (prompt/1000)*input_rate + (completion/1000)*output_rate`.
    /// Unknown models: cost 0 (spec §4.1).
    pub fn compute_cost(&self, model: &str, usage: Usage) -> f64 {
        match self.rates.read().get(model) {
            Some(rate) => {
                (usage.prompt as f64 / 1000.0) * rate.input_cost_per_1k
                    + (usage.completion as f64 / 1000.0) * rate.output_cost_per_1k
            }
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_costs_zero() {
        let sheet = RateSheet::new();
        let cost = sheet.compute_cost(
            "mystery-model",
            Usage { prompt: 1000, completion: 1000, total: 2000 },
        );
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn computes_cost_from_registered_rate() {
        let sheet = RateSheet::new();
        sheet.register(
            "gpt-4",
            ModelRate { input_cost_per_1k: 0.03, output_cost_per_1k: 0.06 },
        );
        let cost = sheet.compute_cost(
            "gpt-4",
            Usage { prompt: 1000, completion: 500, total: 1500 },
        );
        assert!((cost - (0.03 + 0.03)).abs() < 1e-9);
    }
}
