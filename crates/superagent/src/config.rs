//! TOML configuration surface (spec §6): provider registrations, memory
//! tier sizing, executor/snapshot behavior, and UX model selection.
//! Follows the teacher's `agent/src/config.rs` convention of a
//! `#[serde(default = "default_fn")]` per tunable field rather than
//! `Option` everywhere, so a config file only needs to name what it
//! overrides.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use superagent_memory::MemoryConfig;
use superagent_providers::ProviderConfig;

fn default_true() -> bool {
    true
}

fn default_priority() -> i32 {
    0
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_model() -> String {
    "gpt-4".to_string()
}

/// One `[[provider]]` table. Maps onto [`superagent_providers::ProviderConfig`]
/// plus the `base_url` an [`superagent_providers::HttpAdapter`] needs to
/// reach it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    pub name: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl ProviderSettings {
    pub fn to_provider_config(&self) -> ProviderConfig {
        let mut config = ProviderConfig::new(&self.name, self.priority).with_models(self.models.clone());
        config.enabled = self.enabled;
        config.timeout = Duration::from_secs(self.timeout_secs);
        config.max_retries = self.max_retries;
        config.base_url = self.base_url.clone();
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key.clone());
        }
        config
    }
}

fn default_working_tier_capacity() -> usize {
    200
}

fn default_episodic_tier_capacity() -> usize {
    2_000
}

fn default_compression_threshold() -> usize {
    50
}

/// `[memory]` table (spec §4.5 tunables).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemorySettings {
    #[serde(default = "default_working_tier_capacity")]
    pub working_capacity: usize,
    #[serde(default = "default_episodic_tier_capacity")]
    pub episodic_capacity: usize,
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            working_capacity: default_working_tier_capacity(),
            episodic_capacity: default_episodic_tier_capacity(),
            compression_threshold: default_compression_threshold(),
        }
    }
}

impl MemorySettings {
    pub fn to_memory_config(&self) -> MemoryConfig {
        MemoryConfig {
            working_capacity: self.working_capacity,
            episodic_capacity: self.episodic_capacity,
            compression_threshold: self.compression_threshold,
        }
    }
}

fn default_worktree() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_parallel_steps() -> usize {
    5
}

/// `[executor]` table (spec §4.4 tunables).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutorSettings {
    #[serde(default = "default_worktree")]
    pub worktree: PathBuf,
    #[serde(default = "default_true")]
    pub snapshots_enabled: bool,
    #[serde(default = "default_max_parallel_steps")]
    pub max_parallel_steps: usize,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            worktree: default_worktree(),
            snapshots_enabled: true,
            max_parallel_steps: default_max_parallel_steps(),
        }
    }
}

/// `[security]` table (spec §6 "Any text emitted to logs or NDJSON events
/// must pass through a redactor" -- redaction itself is unconditional, this
/// only gates whether tool calls require explicit user consent).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SecuritySettings {
    #[serde(default = "default_true")]
    pub require_tool_consent: bool,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self { require_tool_consent: true }
    }
}

/// `[ux]` table: the model used by the UX pipeline's own intent resolver
/// and preview-only planner (spec §4.6, §4.7).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UxSettings {
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for UxSettings {
    fn default() -> Self {
        Self { model: default_model() }
    }
}

/// Top-level runtime configuration: one TOML document describing every
/// subsystem [`crate::Runtime::new`] wires together.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, rename = "provider")]
    pub providers: Vec<ProviderSettings>,
    #[serde(default)]
    pub memory: MemorySettings,
    #[serde(default)]
    pub executor: ExecutorSettings,
    #[serde(default)]
    pub security: SecuritySettings,
    #[serde(default)]
    pub ux: UxSettings,
}

impl RuntimeConfig {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_document_with_all_defaults() {
        let config = RuntimeConfig::from_toml("").unwrap();
        assert_eq!(config.model, "gpt-4");
        assert!(config.providers.is_empty());
        assert_eq!(config.memory.working_capacity, 200);
        assert!(config.executor.snapshots_enabled);
        assert!(config.security.require_tool_consent);
    }

    #[test]
    fn parses_provider_table_array() {
        let toml = r#"
            model = "gpt-4o"

            [[provider]]
            name = "local"
            base_url = "http://localhost:8080/v1"
            priority = 10
            models = ["gpt-4o"]
        "#;
        let config = RuntimeConfig::from_toml(toml).unwrap();
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers[0].name, "local");
        assert_eq!(config.providers[0].priority, 10);
    }

    #[test]
    fn rejects_unknown_fields() {
        let toml = r#"
            [[provider]]
            name = "local"
            bogus_field = true
        "#;
        assert!(RuntimeConfig::from_toml(toml).is_err());
    }
}
