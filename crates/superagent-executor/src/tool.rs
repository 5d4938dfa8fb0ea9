use async_trait::async_trait;
use serde_json::Value;

use crate::error::ExecutorError;
use crate::schema::ToolSchema;

/// One callable tool behind the transactional executor (spec §4.4). Mirrors
/// the teacher's `Tool` trait (`agent/src/tools/context.rs`), generalized
/// with a declared [`ToolSchema`] so Phase 1 validation can be shared
/// rather than re-implemented ad hoc per tool.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn schema(&self) -> ToolSchema;

    async fn call(&self, params: Value) -> Result<String, ExecutorError>;
}
