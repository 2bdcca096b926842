//! Fan-in merge executor
//!
//! Combines the outputs of the node's resolved predecessors according to
//! the configured strategy. Predecessors arrive in completion order
//! (wave, then node ID), so `first`/`last` are deterministic.

use crate::context::ExecutionContext;
use crate::error::{EngineError, Result};
use crate::model::JsonMap;
use crate::registry::NodeExecutor;
use async_trait::async_trait;
use serde_json::Value;

pub struct MergeExecutor;

#[async_trait]
impl NodeExecutor for MergeExecutor {
    fn type_name(&self) -> &str {
        "merge"
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        node_id: &str,
        config: &JsonMap,
    ) -> Result<Value> {
        let strategy = config
            .get("strategy")
            .and_then(Value::as_str)
            .unwrap_or("all");

        let outputs: Vec<(String, Value)> = ctx
            .predecessors()
            .iter()
            .map(|pred| {
                let value = ctx
                    .snapshot()
                    .get(pred)
                    .cloned()
                    .unwrap_or(Value::Null);
                (pred.clone(), value)
            })
            .collect();

        match strategy {
            "all" => {
                let mut combined = JsonMap::new();
                for (pred, value) in outputs {
                    combined.insert(pred, value);
                }
                Ok(Value::Object(combined))
            }
            "any" => Ok(outputs
                .into_iter()
                .map(|(_, value)| value)
                .find(|value| !value.is_null())
                .unwrap_or(Value::Null)),
            "first" => Ok(outputs
                .into_iter()
                .next()
                .map(|(_, value)| value)
                .unwrap_or(Value::Null)),
            "last" => Ok(outputs
                .into_iter()
                .last()
                .map(|(_, value)| value)
                .unwrap_or(Value::Null)),
            other => Err(EngineError::InvalidInput(format!(
                "merge node '{}' has an unknown strategy '{}'",
                node_id, other
            ))),
        }
    }
}
