//! Core data model for the SuperAgent execution core.
//!
//! Types here are shared by every other `superagent-*` crate; this crate
//! has no dependency on the bus, providers, or executor so that it can sit
//! at the bottom of the dependency order.

pub mod context;
pub mod ids;
pub mod llm;
pub mod memory;
pub mod message;
pub mod plan;
pub mod tool;
pub mod transaction;

pub use context::{ContextNode, ContextNodeType, UnifiedContext};
pub use ids::{
    CheckpointId, ContextNodeId, CorrelationId, EventId, MemoryItemId, SessionId, StepId, TaskId,
    ToolCallId, TransactionId,
};
pub use llm::{
    FinishReason, LLMRequest, LLMRequestBuilder, LLMResponse, LLMStreamChunk, ModelInfo,
    RequestValidationError, ToolChoice, ToolDefinition, Usage,
};
pub use memory::{MemoryItem, MemoryType};
pub use message::{Message, MessageContent, MessagePart, Role};
pub use plan::{Plan, PlanValidationError, Step, StepType, Task, TaskPriority};
pub use tool::{ToolCall, ToolOutput};
pub use transaction::{Checkpoint, IsolationLevel, Transaction};
