//! Unified multi-vendor LLM provider interface: adapter trait, priority
//! fallback router, retry policy, and per-provider configuration.

pub mod adapter;
pub mod config;
pub mod error;
#[cfg(feature = "reqwest-client")]
pub mod http_adapter;
pub mod retry;
pub mod router;

pub use adapter::{Capability, ChunkStream, ProviderAdapter};
pub use config::ProviderConfig;
pub use error::ProviderError;
#[cfg(feature = "reqwest-client")]
pub use http_adapter::HttpAdapter;
pub use retry::{with_retries, RetryPolicy};
pub use router::ProviderRouter;
