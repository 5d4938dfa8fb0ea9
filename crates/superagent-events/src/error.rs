/// Error surfaced by a single handler invocation. The bus logs these and
/// keeps dispatching to the remaining handlers (spec §4.2: "do **not**
/// prevent other handlers from running").
#[derive(Debug, Clone, thiserror::Error)]
pub enum EventBusError {
    #[error("handler failed: {0}")]
    HandlerFailed(String),
    #[error("handler timed out after {0:?}")]
    HandlerTimedOut(std::time::Duration),
}
