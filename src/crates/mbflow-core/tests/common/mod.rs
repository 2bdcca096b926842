//! Shared helpers for engine integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use mbflow_core::{
    builtin_registry, BusConfig, EngineConfig, Event, EventFilter, ExecutionContext,
    ExecutionManager, ExecutorRegistry, JsonMap, NodeExecutor, Observer, ObserverBus,
    ObserverError, Result, Workflow, WorkflowRepository,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Returns the value under the `output` config key, or an empty mapping.
pub struct StubExecutor;

#[async_trait]
impl NodeExecutor for StubExecutor {
    fn type_name(&self) -> &str {
        "stub"
    }

    async fn execute(
        &self,
        _ctx: &ExecutionContext,
        _node_id: &str,
        config: &JsonMap,
    ) -> Result<Value> {
        Ok(config
            .get("output")
            .cloned()
            .unwrap_or(Value::Object(JsonMap::new())))
    }
}

/// Always fails with the configured message.
pub struct FailExecutor;

#[async_trait]
impl NodeExecutor for FailExecutor {
    fn type_name(&self) -> &str {
        "fail"
    }

    async fn execute(
        &self,
        _ctx: &ExecutionContext,
        node_id: &str,
        config: &JsonMap,
    ) -> Result<Value> {
        let message = config
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("deliberate failure");
        Err(mbflow_core::EngineError::ExecutorFailed {
            node: node_id.to_string(),
            message: message.to_string(),
        })
    }
}

/// Builtins plus the stub and fail executors.
pub fn test_registry() -> Arc<ExecutorRegistry> {
    let registry = builtin_registry();
    registry.register(Arc::new(StubExecutor)).unwrap();
    registry.register(Arc::new(FailExecutor)).unwrap();
    registry
}

pub fn test_manager() -> (Arc<ExecutionManager>, Arc<ObserverBus>) {
    test_manager_with(BusConfig::default(), EngineConfig::default())
}

pub fn test_manager_with(
    bus_config: BusConfig,
    engine_config: EngineConfig,
) -> (Arc<ExecutionManager>, Arc<ObserverBus>) {
    let bus = ObserverBus::new(bus_config);
    let manager = ExecutionManager::in_memory(test_registry(), Arc::clone(&bus), engine_config);
    (manager, bus)
}

/// Store a workflow and start an execution.
pub async fn create_and_run(
    manager: &Arc<ExecutionManager>,
    workflow: &Workflow,
    input: JsonMap,
) -> String {
    manager.workflows().create(workflow).await.unwrap();
    manager.run(&workflow.id, input).await.unwrap()
}

pub fn obj(value: Value) -> JsonMap {
    value.as_object().cloned().unwrap_or_default()
}

/// Observer that records every delivered event.
pub struct RecordingObserver {
    name: String,
    filter: EventFilter,
    pub seen: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            filter: EventFilter::all(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn events_for(&self, execution_id: &str) -> Vec<Event> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.execution_id == execution_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Observer for RecordingObserver {
    fn name(&self) -> &str {
        &self.name
    }

    fn filter(&self) -> EventFilter {
        self.filter.clone()
    }

    async fn on_event(&self, event: &Event) -> std::result::Result<(), ObserverError> {
        self.seen.lock().unwrap().push(event.clone());
        Ok(())
    }
}
