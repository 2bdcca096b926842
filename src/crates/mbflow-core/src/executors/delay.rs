//! Delay executor
//!
//! Sleeps for the configured duration, honouring cancellation.

use crate::context::ExecutionContext;
use crate::error::{EngineError, Result};
use crate::model::JsonMap;
use crate::registry::NodeExecutor;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

pub struct DelayExecutor;

#[async_trait]
impl NodeExecutor for DelayExecutor {
    fn type_name(&self) -> &str {
        "delay"
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        _node_id: &str,
        config: &JsonMap,
    ) -> Result<Value> {
        let duration_ms = config
            .get("duration_ms")
            .and_then(Value::as_u64)
            .unwrap_or(0);

        tokio::select! {
            _ = ctx.cancellation().cancelled() => Err(EngineError::Cancelled),
            _ = tokio::time::sleep(Duration::from_millis(duration_ms)) => {
                Ok(json!({ "slept_ms": duration_ms }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::testing::test_context;

    #[tokio::test]
    async fn test_sleeps_and_reports() {
        let executor = DelayExecutor;
        let ctx = test_context(JsonMap::new(), vec![]);
        let config = serde_json::json!({"duration_ms": 5}).as_object().cloned().unwrap();

        let output = executor.execute(&ctx, "wait", &config).await.unwrap();
        assert_eq!(output, serde_json::json!({"slept_ms": 5}));
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_sleep() {
        let executor = DelayExecutor;
        let ctx = test_context(JsonMap::new(), vec![]);
        let config = serde_json::json!({"duration_ms": 10_000})
            .as_object()
            .cloned()
            .unwrap();

        let cancel = ctx.cancellation().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });

        let started = std::time::Instant::now();
        let err = executor.execute(&ctx, "wait", &config).await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
