//! Repository contracts
//!
//! The engine persists through these traits and never names a concrete
//! store. In-memory implementations back the engine's own tests; the
//! service crate provides the SQLite implementations.

pub mod memory;

use crate::error::Result;
use crate::event::Event;
use crate::model::{Execution, NodeExecution, Trigger, Workflow};
use async_trait::async_trait;

/// Workflow definition storage.
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    async fn create(&self, workflow: &Workflow) -> Result<()>;
    async fn update(&self, workflow: &Workflow) -> Result<()>;
    /// Returns `EngineError::NotFound` for unknown IDs.
    async fn find_by_id(&self, id: &str) -> Result<Workflow>;
    async fn list(&self) -> Result<Vec<Workflow>>;
}

/// Execution record storage.
#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    async fn create(&self, execution: &Execution) -> Result<()>;
    async fn update(&self, execution: &Execution) -> Result<()>;
    /// Returns `EngineError::NotFound` for unknown IDs.
    async fn find_by_id(&self, id: &str) -> Result<Execution>;
    async fn list_by_workflow(&self, workflow_id: &str) -> Result<Vec<Execution>>;
    async fn list_by_status(&self, status: &str) -> Result<Vec<Execution>>;
    async fn count(&self) -> Result<i64>;
}

/// Node execution record storage.
#[async_trait]
pub trait NodeExecutionRepository: Send + Sync {
    async fn create(&self, node_execution: &NodeExecution) -> Result<()>;
    async fn update(&self, node_execution: &NodeExecution) -> Result<()>;
    /// Records for one execution, ordered by creation.
    async fn list_by_execution(&self, execution_id: &str) -> Result<Vec<NodeExecution>>;
    async fn list_by_wave(&self, execution_id: &str, wave: i64) -> Result<Vec<NodeExecution>>;
}

/// Durable event storage.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Store an event. An event carrying a sequence keeps it; sequence 0
    /// gets the next free sequence for its execution, allocated
    /// atomically. Returns the stored event.
    async fn append(&self, event: &Event) -> Result<Event>;
    /// Events with `sequence > from_sequence`, in order.
    async fn since(&self, execution_id: &str, from_sequence: i64) -> Result<Vec<Event>>;
    async fn count(&self, execution_id: &str) -> Result<i64>;
}

/// Trigger record storage. Trigger ingress drivers are external; the
/// engine only reads enabled triggers and records firings.
#[async_trait]
pub trait TriggerRepository: Send + Sync {
    async fn create(&self, trigger: &Trigger) -> Result<()>;
    async fn find_enabled(&self) -> Result<Vec<Trigger>>;
    async fn mark_triggered(&self, id: &str) -> Result<()>;
}
