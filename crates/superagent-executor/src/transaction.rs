use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use superagent_types::{IsolationLevel, Transaction, TransactionId};
use superagent_types::{ToolCall, ToolOutput};

use crate::error::ExecutorError;
use crate::registry::ToolRegistry;
use crate::snapshot::SnapshotManager;

const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of running a sequence of tool calls through the transactional
/// executor (spec §4.4 "Result").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResult {
    pub success: bool,
    pub results: Vec<ToolOutput>,
    pub error: Option<String>,
    pub transaction_id: TransactionId,
    pub execution_time_ms: u64,
}

/// Two-phase, checkpointed runner for a sequence of tool calls (spec
/// §4.4). Grounded on the teacher's `tools/registry.rs` +
/// `tools/context.rs` `Tool`/`ToolContext` split, generalized with the
/// shared Phase 1 validation step and checkpoint/rollback protocol that
/// spec §4.4 adds on top.
pub struct TransactionalExecutor {
    registry: Arc<ToolRegistry>,
    snapshots: Arc<SnapshotManager>,
    default_tool_timeout: Duration,
}

impl TransactionalExecutor {
    pub fn new(registry: Arc<ToolRegistry>, snapshots: Arc<SnapshotManager>) -> Self {
        Self { registry, snapshots, default_tool_timeout: DEFAULT_TOOL_TIMEOUT }
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.default_tool_timeout = timeout;
        self
    }

    /// Runs `calls` in order under `isolation`, cooperatively honoring
    /// `cancel` (spec §5: "a cancelled transaction must roll back to the
    /// initial checkpoint before returning").
    pub async fn execute(
        &self,
        calls: Vec<ToolCall>,
        isolation: IsolationLevel,
        cancel: CancellationToken,
    ) -> Result<TransactionResult, ExecutorError> {
        let started = std::time::Instant::now();
        let transaction_id = TransactionId::generate();
        let mut transaction = Transaction::new(
            transaction_id.clone(),
            isolation,
            time::OffsetDateTime::now_utc().unix_timestamp(),
        );

        // Phase 1: resolve every tool and validate/coerce its parameters
        // before any call runs or any checkpoint is taken.
        let mut resolved = Vec::with_capacity(calls.len());
        for call in &calls {
            let tool = self
                .registry
                .find(&call.tool_name)
                .ok_or_else(|| ExecutorError::ToolNotFound(call.tool_name.clone()))?;
            let params = tool.schema().validate_and_coerce(&call.parameters)?;
            resolved.push((tool, params));
        }

        let initial_checkpoint = self.snapshots.checkpoint().await?;
        transaction.checkpoints.push(initial_checkpoint.checkpoint_id.clone());

        let mut results = Vec::with_capacity(calls.len());
        let mut checkpoint_before_call = initial_checkpoint.clone();

        for (idx, (call, (tool, params))) in calls.iter().zip(resolved).enumerate() {
            if cancel.is_cancelled() {
                self.snapshots.restore(&initial_checkpoint).await?;
                self.snapshots.discard_all(&transaction.checkpoints);
                return Err(ExecutorError::Cancelled);
            }

            if idx > 0 {
                checkpoint_before_call = self.snapshots.checkpoint().await?;
                transaction.checkpoints.push(checkpoint_before_call.checkpoint_id.clone());
            }

            let call_started = std::time::Instant::now();
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ExecutorError::Cancelled),
                result = tokio::time::timeout(self.default_tool_timeout, tool.call(params)) => {
                    match result {
                        Ok(Ok(text)) => Ok(text),
                        Ok(Err(err)) => Err(err),
                        Err(_) => Err(ExecutorError::ToolTimeout(format!(
                            "Timeout after {}s",
                            self.default_tool_timeout.as_secs()
                        ))),
                    }
                }
            };

            match outcome {
                Ok(text) => {
                    results.push(ToolOutput {
                        call_id: call.id.clone(),
                        tool_name: call.tool_name.clone(),
                        success: true,
                        output: text,
                        error: None,
                        execution_time_ms: call_started.elapsed().as_millis() as u64,
                    });
                }
                Err(err) => {
                    let failed_output = ToolOutput {
                        call_id: call.id.clone(),
                        tool_name: call.tool_name.clone(),
                        success: false,
                        output: String::new(),
                        error: Some(err.to_string()),
                        execution_time_ms: call_started.elapsed().as_millis() as u64,
                    };
                    self.snapshots.restore(&checkpoint_before_call).await?;
                    transaction.rolled_back = true;
                    self.snapshots.discard_all(&transaction.checkpoints);
                    let mut results = results;
                    results.push(failed_output);
                    return Ok(TransactionResult {
                        success: false,
                        results,
                        error: Some(format!(
                            "call {} ({}) failed: {err}",
                            call.id, call.tool_name
                        )),
                        transaction_id,
                        execution_time_ms: started.elapsed().as_millis() as u64,
                    });
                }
            }
        }

        transaction.committed = true;
        self.snapshots.discard_all(&transaction.checkpoints);
        debug_assert!(transaction.is_terminal_consistent());

        Ok(TransactionResult {
            success: true,
            results,
            error: None,
            transaction_id,
            execution_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}
