use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use superagent_types::{LLMRequest, LLMResponse, LLMStreamChunk, ModelInfo};

use crate::error::ProviderError;

/// Capability a provider/model must support for a given call. Only `Chat`
/// is required by this spec; the enum leaves room for future capability
/// checks during fallback model selection without changing the trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Chat,
}

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<LLMStreamChunk, ProviderError>> + Send>>;

/// One vendor adapter behind the unified provider interface (spec §4.1).
/// Adapters must be safe for concurrent use: the router may invoke the
/// same adapter from multiple callers in parallel.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: &LLMRequest) -> Result<LLMResponse, ProviderError>;

    /// Default: streaming unsupported. Adapters that support it override.
    async fn stream(&self, request: &LLMRequest) -> Result<ChunkStream, ProviderError> {
        let _ = request;
        Err(ProviderError::NotImplemented(format!(
            "{} does not support streaming",
            self.name()
        )))
    }

    /// Default: approximate via `ceil(len(text)/4)`, overridden by
    /// adapters with an exact tokenizer (spec §4.1 `count_tokens`).
    async fn count_tokens(&self, text: &str, _model: &str) -> Result<u32, ProviderError> {
        Ok(text.len().div_ceil(4) as u32)
    }

    async fn get_model_info(&self, model: &str) -> Result<ModelInfo, ProviderError>;

    fn supports_capability(&self, _capability: Capability) -> bool {
        true
    }
}
