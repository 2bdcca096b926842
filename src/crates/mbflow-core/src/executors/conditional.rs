//! Conditional executor
//!
//! Evaluates a boolean expression against the namespace snapshot and
//! publishes `{result: bool}`. Downstream edges typically route on the
//! `"true"`/`"false"` source handles.

use crate::context::ExecutionContext;
use crate::error::{EngineError, Result};
use crate::model::JsonMap;
use crate::registry::NodeExecutor;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

pub struct ConditionalExecutor;

#[async_trait]
impl NodeExecutor for ConditionalExecutor {
    fn type_name(&self) -> &str {
        "conditional"
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        node_id: &str,
        config: &JsonMap,
    ) -> Result<Value> {
        let condition = config
            .get("condition")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                EngineError::InvalidInput(format!(
                    "conditional node '{}' requires a 'condition'",
                    node_id
                ))
            })?;

        let result = ctx
            .eval_bool(condition)
            .map_err(|e| EngineError::ExecutorFailed {
                node: node_id.to_string(),
                message: e.to_string(),
            })?;

        debug!(node_id, condition, result, "condition evaluated");
        Ok(json!({ "result": result }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::testing::test_context;
    use serde_json::json;

    fn config(value: Value) -> JsonMap {
        value.as_object().cloned().unwrap()
    }

    fn snapshot(value: Value) -> JsonMap {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_true_branch() {
        let executor = ConditionalExecutor;
        let ctx = test_context(snapshot(json!({"count": 10})), vec![]);
        let output = executor
            .execute(&ctx, "gate", &config(json!({"condition": "count > 5"})))
            .await
            .unwrap();
        assert_eq!(output, json!({"result": true}));
    }

    #[tokio::test]
    async fn test_false_branch() {
        let executor = ConditionalExecutor;
        let ctx = test_context(snapshot(json!({"count": 2})), vec![]);
        let output = executor
            .execute(&ctx, "gate", &config(json!({"condition": "count > 5"})))
            .await
            .unwrap();
        assert_eq!(output, json!({"result": false}));
    }

    #[tokio::test]
    async fn test_missing_variable_degrades_to_false() {
        let executor = ConditionalExecutor;
        let ctx = test_context(JsonMap::new(), vec![]);
        let output = executor
            .execute(&ctx, "gate", &config(json!({"condition": "missing == 1"})))
            .await
            .unwrap();
        assert_eq!(output, json!({"result": false}));
    }

    #[tokio::test]
    async fn test_missing_condition_is_rejected() {
        let executor = ConditionalExecutor;
        let ctx = test_context(JsonMap::new(), vec![]);
        let err = executor
            .execute(&ctx, "gate", &JsonMap::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("requires a 'condition'"));
    }

    #[tokio::test]
    async fn test_malformed_condition_fails_the_node() {
        let executor = ConditionalExecutor;
        let ctx = test_context(JsonMap::new(), vec![]);
        let err = executor
            .execute(&ctx, "gate", &config(json!({"condition": "a ===== b"})))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ExecutorFailed { .. }));
    }
}
