//! Executor registry
//!
//! A process-wide table mapping node-type strings to executor
//! implementations. Registration happens at process start; the table is
//! read-mostly afterwards.

use crate::context::ExecutionContext;
use crate::error::{EngineError, Result};
use crate::model::JsonMap;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A type-specific node executor.
///
/// Executors receive the rendered node configuration and the execution
/// context; the output value is merged into the namespace under the
/// node's ID at the wave boundary.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// The node-type string this executor handles.
    fn type_name(&self) -> &str;

    /// Run the node. Long-running executors should honour
    /// `ctx.cancellation()`.
    async fn execute(
        &self,
        ctx: &ExecutionContext,
        node_id: &str,
        config: &JsonMap,
    ) -> Result<Value>;
}

/// Name → executor dispatch table.
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: RwLock<HashMap<String, Arc<dyn NodeExecutor>>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self {
            executors: RwLock::new(HashMap::new()),
        }
    }

    /// Register an executor under its type string. Re-registration of a
    /// type is an error.
    pub fn register(&self, executor: Arc<dyn NodeExecutor>) -> Result<()> {
        let type_name = executor.type_name().to_string();
        let mut guard = self.executors.write();
        if guard.contains_key(&type_name) {
            return Err(EngineError::InvalidInput(format!(
                "executor type '{}' is already registered",
                type_name
            )));
        }
        guard.insert(type_name, executor);
        Ok(())
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<dyn NodeExecutor>> {
        self.executors.read().get(type_name).cloned()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.executors.read().contains_key(type_name)
    }

    /// Registered type strings, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut types: Vec<String> = self.executors.read().keys().cloned().collect();
        types.sort();
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoExecutor;

    #[async_trait]
    impl NodeExecutor for EchoExecutor {
        fn type_name(&self) -> &str {
            "echo"
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

    #[test]
    fn test_register_and_lookup() {
        let registry = ExecutorRegistry::new();
        registry.register(Arc::new(EchoExecutor)).unwrap();

        assert!(registry.contains("echo"));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = ExecutorRegistry::new();
        registry.register(Arc::new(EchoExecutor)).unwrap();

        let err = registry.register(Arc::new(EchoExecutor)).unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn test_list_is_sorted() {
        struct Named(&'static str);

        #[async_trait]
        impl NodeExecutor for Named {
            fn type_name(&self) -> &str {
                self.0
            }

            async fn execute(
                &self,
                _ctx: &ExecutionContext,
                _node_id: &str,
                _config: &JsonMap,
            ) -> Result<Value> {
                Ok(json!(null))
            }
        }

        let registry = ExecutorRegistry::new();
        registry.register(Arc::new(Named("zeta"))).unwrap();
        registry.register(Arc::new(Named("alpha"))).unwrap();
        registry.register(Arc::new(Named("mid"))).unwrap();

        assert_eq!(registry.list(), vec!["alpha", "mid", "zeta"]);
    }
}
