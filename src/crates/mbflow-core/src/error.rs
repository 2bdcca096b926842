//! Error types for the MBFlow execution engine.
//!
//! The engine distinguishes errors by how they affect a running execution:
//! load-time problems (`InvalidInput`, `NotFound`, `Validation`) reject a
//! run before any state is created, node-level problems (`ExecutorFailed`,
//! `Timeout`) mark the node and fail the execution, and `Internal` covers
//! faults the engine did not anticipate. Observer failures never surface
//! here; the observer bus logs and counts them instead.

use crate::expression::ExpressionError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed workflow definition, expression, or node configuration.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unknown workflow, execution, or node.
    #[error("not found: {0}")]
    NotFound(String),

    /// A workflow definition violated a structural invariant.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An executor returned an error while running a node.
    #[error("node '{node}' failed: {message}")]
    ExecutorFailed { node: String, message: String },

    /// An executor exceeded its time budget.
    #[error("node '{node}' timed out after {timeout_ms}ms")]
    Timeout { node: String, timeout_ms: u64 },

    /// Cancellation was observed.
    #[error("execution cancelled")]
    Cancelled,

    /// Expression compilation or evaluation failed.
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// The event log could not record an event. Fatal to the execution.
    #[error("event log error: {0}")]
    EventLog(String),

    /// A repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unexpected engine fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Short machine-readable kind string, used in event payloads and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid-input",
            Self::NotFound(_) => "not-found",
            Self::Validation(_) => "validation-failed",
            Self::ExecutorFailed { .. } => "executor-failed",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled => "cancelled",
            Self::Expression(_) => "invalid-input",
            Self::EventLog(_) => "internal",
            Self::Repository(_) => "internal",
            Self::Serialization(_) => "invalid-input",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether this error rejects a run before any execution state exists.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::NotFound(_) | Self::Validation(_)
        )
    }
}
