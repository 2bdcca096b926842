//! In-memory repository implementations
//!
//! Back the engine's integration tests and embedded use; the service
//! crate swaps in SQLite-backed equivalents.

use crate::error::{EngineError, Result};
use crate::event::Event;
use crate::model::{Execution, NodeExecution, Trigger, Workflow};
use crate::repository::{
    EventRepository, ExecutionRepository, NodeExecutionRepository, TriggerRepository,
    WorkflowRepository,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryWorkflowRepository {
    workflows: RwLock<HashMap<String, Workflow>>,
}

impl MemoryWorkflowRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowRepository for MemoryWorkflowRepository {
    async fn create(&self, workflow: &Workflow) -> Result<()> {
        let mut guard = self.workflows.write();
        if guard.contains_key(&workflow.id) {
            return Err(EngineError::Repository(format!(
                "workflow '{}' already exists",
                workflow.id
            )));
        }
        guard.insert(workflow.id.clone(), workflow.clone());
        Ok(())
    }

    async fn update(&self, workflow: &Workflow) -> Result<()> {
        self.workflows
            .write()
            .insert(workflow.id.clone(), workflow.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Workflow> {
        self.workflows
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("workflow '{}'", id)))
    }

    async fn list(&self) -> Result<Vec<Workflow>> {
        let mut workflows: Vec<Workflow> = self.workflows.read().values().cloned().collect();
        workflows.sort_by_key(|w| std::cmp::Reverse(w.created_at));
        Ok(workflows)
    }
}

#[derive(Default)]
pub struct MemoryExecutionRepository {
    executions: RwLock<HashMap<String, Execution>>,
}

impl MemoryExecutionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionRepository for MemoryExecutionRepository {
    async fn create(&self, execution: &Execution) -> Result<()> {
        self.executions
            .write()
            .insert(execution.id.clone(), execution.clone());
        Ok(())
    }

    async fn update(&self, execution: &Execution) -> Result<()> {
        self.executions
            .write()
            .insert(execution.id.clone(), execution.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Execution> {
        self.executions
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("execution '{}'", id)))
    }

    async fn list_by_workflow(&self, workflow_id: &str) -> Result<Vec<Execution>> {
        let mut executions: Vec<Execution> = self
            .executions
            .read()
            .values()
            .filter(|e| e.workflow_id == workflow_id)
            .cloned()
            .collect();
        executions.sort_by_key(|e| std::cmp::Reverse(e.created_at));
        Ok(executions)
    }

    async fn list_by_status(&self, status: &str) -> Result<Vec<Execution>> {
        let mut executions: Vec<Execution> = self
            .executions
            .read()
            .values()
            .filter(|e| e.status == status)
            .cloned()
            .collect();
        executions.sort_by_key(|e| std::cmp::Reverse(e.created_at));
        Ok(executions)
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.executions.read().len() as i64)
    }
}

#[derive(Default)]
pub struct MemoryNodeExecutionRepository {
    records: RwLock<Vec<NodeExecution>>,
}

impl MemoryNodeExecutionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NodeExecutionRepository for MemoryNodeExecutionRepository {
    async fn create(&self, node_execution: &NodeExecution) -> Result<()> {
        self.records.write().push(node_execution.clone());
        Ok(())
    }

    async fn update(&self, node_execution: &NodeExecution) -> Result<()> {
        let mut guard = self.records.write();
        match guard.iter_mut().find(|r| r.id == node_execution.id) {
            Some(record) => {
                *record = node_execution.clone();
                Ok(())
            }
            None => Err(EngineError::NotFound(format!(
                "node execution '{}'",
                node_execution.id
            ))),
        }
    }

    async fn list_by_execution(&self, execution_id: &str) -> Result<Vec<NodeExecution>> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|r| r.execution_id == execution_id)
            .cloned()
            .collect())
    }

    async fn list_by_wave(&self, execution_id: &str, wave: i64) -> Result<Vec<NodeExecution>> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|r| r.execution_id == execution_id && r.wave == wave)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryEventRepository {
    events: RwLock<HashMap<String, Vec<Event>>>,
}

impl MemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for MemoryEventRepository {
    async fn append(&self, event: &Event) -> Result<Event> {
        let mut guard = self.events.write();
        let log = guard.entry(event.execution_id.clone()).or_default();
        let mut stored = event.clone();
        if stored.sequence == 0 {
            stored.sequence = log.last().map(|e| e.sequence).unwrap_or(0) + 1;
        }
        if log.iter().any(|e| e.sequence == stored.sequence) {
            return Err(EngineError::Repository(format!(
                "duplicate sequence {} for execution '{}'",
                stored.sequence, stored.execution_id
            )));
        }
        log.push(stored.clone());
        log.sort_by_key(|e| e.sequence);
        Ok(stored)
    }

    async fn since(&self, execution_id: &str, from_sequence: i64) -> Result<Vec<Event>> {
        Ok(self
            .events
            .read()
            .get(execution_id)
            .map(|log| {
                log.iter()
                    .filter(|e| e.sequence > from_sequence)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, execution_id: &str) -> Result<i64> {
        Ok(self
            .events
            .read()
            .get(execution_id)
            .map(|log| log.len() as i64)
            .unwrap_or(0))
    }
}

#[derive(Default)]
pub struct MemoryTriggerRepository {
    triggers: RwLock<HashMap<String, Trigger>>,
}

impl MemoryTriggerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TriggerRepository for MemoryTriggerRepository {
    async fn create(&self, trigger: &Trigger) -> Result<()> {
        self.triggers
            .write()
            .insert(trigger.id.clone(), trigger.clone());
        Ok(())
    }

    async fn find_enabled(&self) -> Result<Vec<Trigger>> {
        let mut triggers: Vec<Trigger> = self
            .triggers
            .read()
            .values()
            .filter(|t| t.enabled)
            .cloned()
            .collect();
        triggers.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(triggers)
    }

    async fn mark_triggered(&self, id: &str) -> Result<()> {
        let mut guard = self.triggers.write();
        let trigger = guard
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(format!("trigger '{}'", id)))?;
        let now = Utc::now().timestamp();
        trigger.last_triggered_at = Some(now);
        trigger.updated_at = now;
        Ok(())
    }
}
