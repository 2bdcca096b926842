//! Pure transform executor
//!
//! The node configuration is rendered against the namespace snapshot
//! before dispatch, so this executor only selects what to publish:
//! either the rendered `template` value, or the rendered `fields`
//! mapping.

use crate::context::ExecutionContext;
use crate::error::{EngineError, Result};
use crate::model::JsonMap;
use crate::registry::NodeExecutor;
use async_trait::async_trait;
use serde_json::Value;

pub struct TransformExecutor;

#[async_trait]
impl NodeExecutor for TransformExecutor {
    fn type_name(&self) -> &str {
        "transform"
    }

    async fn execute(
        &self,
        _ctx: &ExecutionContext,
        node_id: &str,
        config: &JsonMap,
    ) -> Result<Value> {
        if let Some(template) = config.get("template") {
            return Ok(template.clone());
        }
        if let Some(fields) = config.get("fields").and_then(Value::as_object) {
            return Ok(Value::Object(fields.clone()));
        }
        Err(EngineError::InvalidInput(format!(
            "transform node '{}' requires 'template' or 'fields'",
            node_id
        )))
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

    #[tokio::test]
    async fn test_template_value_passes_through() {
        let executor = TransformExecutor;
        let ctx = test_context(JsonMap::new(), vec![]);
        let output = executor
            .execute(&ctx, "t", &config(json!({"template": "rendered text"})))
            .await
            .unwrap();
        assert_eq!(output, json!("rendered text"));
    }

    #[tokio::test]
    async fn test_fields_mapping_passes_through() {
        let executor = TransformExecutor;
        let ctx = test_context(JsonMap::new(), vec![]);
        let output = executor
            .execute(
                &ctx,
                "t",
                &config(json!({"fields": {"greeting": "hello", "count": 2}})),
            )
            .await
            .unwrap();
        assert_eq!(output, json!({"greeting": "hello", "count": 2}));
    }

    #[tokio::test]
    async fn test_missing_configuration_is_rejected() {
        let executor = TransformExecutor;
        let ctx = test_context(JsonMap::new(), vec![]);
        let err = executor
            .execute(&ctx, "t", &JsonMap::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'template' or 'fields'"));
    }
}
