use std::fmt;

/// Error type for the provider router and its adapters.
///
/// Hand-written `Display` rather than `thiserror`, matching the teacher's
/// lower-level provider crate (`querymt::error::LLMError`) -- the rest of
/// the execution core uses `thiserror`-derived errors, but this crate sits
/// at the same layer the teacher chose not to.
#[derive(Debug, Clone)]
pub enum ProviderError {
    /// Adapter-side failure. `retryable` controls whether the router's
    /// fallback chain is engaged (spec §7 `ProviderError{retryable}`).
    Provider { message: String, retryable: bool },
    /// No provider is registered for the requested model and none was
    /// given explicitly.
    NoProviderForModel(String),
    /// Every provider in the fallback chain failed; carries the last
    /// underlying error (spec §4.1, §7 `AllProvidersFailed`).
    AllProvidersFailed(Box<ProviderError>),
    /// Request failed validation before being sent to any adapter.
    InvalidRequest(String),
    Timeout(String),
    NotImplemented(String),
}

impl ProviderError {
    pub fn retryable(&self) -> bool {
        matches!(self, ProviderError::Provider { retryable: true, .. } | ProviderError::Timeout(_))
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Provider { message, retryable } => {
                write!(f, "provider error (retryable={retryable}): {message}")
            }
            ProviderError::NoProviderForModel(model) => {
                write!(f, "no provider registered for model '{model}'")
            }
            ProviderError::AllProvidersFailed(last) => {
                write!(f, "all providers failed, last error: {last}")
            }
            ProviderError::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            ProviderError::Timeout(msg) => write!(f, "timeout: {msg}"),
            ProviderError::NotImplemented(msg) => write!(f, "not implemented: {msg}"),
        }
    }
}

impl std::error::Error for ProviderError {}

#[cfg(feature = "reqwest-client")]
impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        let retryable = err.is_timeout() || err.is_connect() || err.status().map(|s| s.is_server_error()).unwrap_or(false);
        ProviderError::Provider { message: err.to_string(), retryable }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::InvalidRequest(format!("json error: {err}"))
    }
}
