//! Per-node execution context
//!
//! Everything an executor may touch during one invocation: a stable
//! snapshot of the namespace as of the wave boundary, live namespace
//! access, template rendering, debug event emission, and the execution's
//! cancellation token.

use crate::cancel::CancellationToken;
use crate::event::Event;
use crate::event_log::EventEmitter;
use crate::expression::{ExpressionError, ExpressionEvaluator};
use crate::model::JsonMap;
use crate::namespace::VariableNamespace;
use crate::template;
use serde_json::Value;
use std::sync::Arc;

/// Context handed to an executor for a single node invocation.
#[derive(Clone)]
pub struct ExecutionContext {
    execution_id: String,
    namespace: Arc<VariableNamespace>,
    evaluator: Arc<ExpressionEvaluator>,
    emitter: EventEmitter,
    cancel: CancellationToken,
    predecessors: Vec<String>,
    snapshot: JsonMap,
}

impl ExecutionContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        execution_id: impl Into<String>,
        namespace: Arc<VariableNamespace>,
        evaluator: Arc<ExpressionEvaluator>,
        emitter: EventEmitter,
        cancel: CancellationToken,
        predecessors: Vec<String>,
        snapshot: JsonMap,
    ) -> Self {
        Self {
            execution_id: execution_id.into(),
            namespace,
            evaluator,
            emitter,
            cancel,
            predecessors,
            snapshot,
        }
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    /// Stable namespace view captured at the wave boundary.
    pub fn snapshot(&self) -> &JsonMap {
        &self.snapshot
    }

    /// Node IDs whose outgoing edges into this node were taken, in
    /// completion order. Fan-in executors combine these.
    pub fn predecessors(&self) -> &[String] {
        &self.predecessors
    }

    /// Live namespace lookup by dotted path.
    pub fn get_var(&self, path: &str) -> Option<Value> {
        self.namespace.get(path)
    }

    /// Live namespace write. Engine-level output merging still happens at
    /// the wave boundary; direct writes are for executor-internal state.
    pub fn set_var(&self, key: impl Into<String>, value: Value) {
        self.namespace.set(key, value);
    }

    /// Render a value against the wave-boundary snapshot.
    pub fn render(&self, value: &Value) -> Value {
        template::render_value(value, &self.snapshot, &self.evaluator)
    }

    /// Evaluate a boolean expression against the wave-boundary snapshot.
    pub fn eval_bool(&self, expr: &str) -> Result<bool, ExpressionError> {
        self.evaluator.eval_bool(expr, &self.snapshot)
    }

    /// Emit a debug-level `node.log` event. Best-effort: a closed log is
    /// ignored rather than failing the executor.
    pub fn emit_log(&self, node_id: &str, message: &str) {
        let _ = self
            .emitter
            .emit(Event::node_log(&self.execution_id, node_id, message));
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}
