//! Passthrough executor
//!
//! Identity node used for structural purposes (entry points, join
//! points). Publishes its rendered configuration unchanged.

use crate::context::ExecutionContext;
use crate::error::Result;
use crate::model::JsonMap;
use crate::registry::NodeExecutor;
use async_trait::async_trait;
use serde_json::Value;

pub struct PassthroughExecutor;

#[async_trait]
impl NodeExecutor for PassthroughExecutor {
    fn type_name(&self) -> &str {
        "passthrough"
    }

    async fn execute(
        &self,
        _ctx: &ExecutionContext,
        _node_id: &str,
        config: &JsonMap,
    ) -> Result<Value> {
        Ok(Value::Object(config.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::testing::test_context;
    use serde_json::json;

    #[tokio::test]
    async fn test_identity() {
        let executor = PassthroughExecutor;
        let ctx = test_context(JsonMap::new(), vec![]);

        let config = json!({"note": "kept"}).as_object().cloned().unwrap();
        let output = executor.execute(&ctx, "p", &config).await.unwrap();
        assert_eq!(output, json!({"note": "kept"}));

        let empty = executor.execute(&ctx, "p", &JsonMap::new()).await.unwrap();
        assert_eq!(empty, json!({}));
    }
}
