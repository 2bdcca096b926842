//! Execution manager
//!
//! Owns the execution lifecycle: loads and validates the workflow,
//! creates the execution record, runs the scheduler on a background task,
//! persists the terminal state exactly once, and exposes run / get /
//! cancel / retry / watch / logs to callers. Cancellation and the
//! per-execution wall-clock budget both funnel into the scheduler's
//! cancellation token; the background task is the sole writer of
//! terminal state, so racing `cancel()` against natural completion
//! yields exactly one terminal transition.

use crate::bus::ObserverBus;
use crate::cancel::CancellationToken;
use crate::error::{EngineError, Result};
use crate::event::Event;
use crate::event_log::{EventEmitter, EventLog};
use crate::model::{
    Execution, ExecutionStatus, JsonMap, NodeExecution, Workflow, WorkflowStatus,
};
use crate::registry::ExecutorRegistry;
use crate::repository::{
    EventRepository, ExecutionRepository, NodeExecutionRepository, WorkflowRepository,
};
use crate::scheduler::{EngineConfig, Scheduler};
use futures::Stream;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{error, info, warn};

struct RunningExecution {
    cancel: CancellationToken,
}

type RunningMap = Arc<Mutex<HashMap<String, RunningExecution>>>;

/// Repository bundle for the execution manager.
pub struct ManagerDeps {
    pub workflows: Arc<dyn WorkflowRepository>,
    pub executions: Arc<dyn ExecutionRepository>,
    pub node_executions: Arc<dyn NodeExecutionRepository>,
    pub events: Arc<dyn EventRepository>,
}

/// Lifecycle orchestrator for workflow executions.
pub struct ExecutionManager {
    workflows: Arc<dyn WorkflowRepository>,
    executions: Arc<dyn ExecutionRepository>,
    node_executions: Arc<dyn NodeExecutionRepository>,
    events: Arc<dyn EventRepository>,
    registry: Arc<ExecutorRegistry>,
    bus: Arc<ObserverBus>,
    log: Arc<EventLog>,
    scheduler: Arc<Scheduler>,
    config: EngineConfig,
    running: RunningMap,
}

impl ExecutionManager {
    pub fn new(
        deps: ManagerDeps,
        registry: Arc<ExecutorRegistry>,
        bus: Arc<ObserverBus>,
        config: EngineConfig,
    ) -> Arc<Self> {
        let log = Arc::new(EventLog::new());
        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&registry),
            Arc::clone(&deps.node_executions),
            Arc::clone(&log),
            Arc::clone(&bus),
            config.clone(),
        ));
        Arc::new(Self {
            workflows: deps.workflows,
            executions: deps.executions,
            node_executions: deps.node_executions,
            events: deps.events,
            registry,
            bus,
            log,
            scheduler,
            config,
            running: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Build a manager over the in-memory repositories (tests, embedded
    /// use).
    pub fn in_memory(
        registry: Arc<ExecutorRegistry>,
        bus: Arc<ObserverBus>,
        config: EngineConfig,
    ) -> Arc<Self> {
        use crate::repository::memory::{
            MemoryEventRepository, MemoryExecutionRepository, MemoryNodeExecutionRepository,
            MemoryWorkflowRepository,
        };
        Self::new(
            ManagerDeps {
                workflows: Arc::new(MemoryWorkflowRepository::new()),
                executions: Arc::new(MemoryExecutionRepository::new()),
                node_executions: Arc::new(MemoryNodeExecutionRepository::new()),
                events: Arc::new(MemoryEventRepository::new()),
            },
            registry,
            bus,
            config,
        )
    }

    pub fn workflows(&self) -> &Arc<dyn WorkflowRepository> {
        &self.workflows
    }

    pub fn registry(&self) -> &Arc<ExecutorRegistry> {
        &self.registry
    }

    pub fn event_log(&self) -> &Arc<EventLog> {
        &self.log
    }

    /// Start an execution asynchronously; returns the execution ID as
    /// soon as the record exists. Load-time problems (unknown workflow,
    /// archived workflow, structural violations, unregistered node types)
    /// reject the run before any execution state is created.
    pub async fn run(&self, workflow_id: &str, input: JsonMap) -> Result<String> {
        let workflow = self.workflows.find_by_id(workflow_id).await?;
        if workflow.status() == WorkflowStatus::Archived {
            return Err(EngineError::Validation(format!(
                "workflow '{}' is archived",
                workflow_id
            )));
        }
        workflow.validate()?;
        for node in &workflow.nodes {
            if !self.registry.contains(&node.node_type) {
                return Err(EngineError::InvalidInput(format!(
                    "no executor registered for node type '{}'",
                    node.node_type
                )));
            }
        }

        let execution = Execution::new(workflow_id, input);
        let execution_id = execution.id.clone();
        self.executions.create(&execution).await?;

        let cancel = CancellationToken::new();
        self.running.lock().insert(
            execution_id.clone(),
            RunningExecution {
                cancel: cancel.clone(),
            },
        );

        let driver = Driver {
            scheduler: Arc::clone(&self.scheduler),
            executions: Arc::clone(&self.executions),
            log: Arc::clone(&self.log),
            bus: Arc::clone(&self.bus),
            running: Arc::clone(&self.running),
            config: self.config.clone(),
        };
        tokio::spawn(driver.drive(Arc::new(workflow), execution, cancel));

        Ok(execution_id)
    }

    /// Fetch an execution with its node execution records.
    pub async fn get(&self, execution_id: &str) -> Result<(Execution, Vec<NodeExecution>)> {
        let execution = self.executions.find_by_id(execution_id).await?;
        let node_executions = self.node_executions.list_by_execution(execution_id).await?;
        Ok((execution, node_executions))
    }

    /// Signal cancellation. Idempotent: terminal executions are left
    /// untouched and the call succeeds.
    pub async fn cancel(&self, execution_id: &str) -> Result<()> {
        if let Some(running) = self.running.lock().get(execution_id) {
            running.cancel.cancel();
            return Ok(());
        }
        // Not running: verify it exists; a terminal record is a no-op.
        let execution = self.executions.find_by_id(execution_id).await?;
        if execution.is_terminal() {
            return Ok(());
        }
        warn!(execution_id, "cancel requested for an execution that never started running");
        Ok(())
    }

    /// Re-run the source workflow with the same input. Produces a fresh
    /// execution sharing no state with the original.
    pub async fn retry(&self, execution_id: &str) -> Result<String> {
        let source = self.executions.find_by_id(execution_id).await?;
        self.run(&source.workflow_id, source.input.clone()).await
    }

    /// Follow an execution's events from `from_sequence` (exclusive).
    /// The stream ends when the execution reaches a terminal state and
    /// the backlog is drained.
    pub fn watch(
        &self,
        execution_id: &str,
        from_sequence: i64,
    ) -> Pin<Box<dyn Stream<Item = Event> + Send>> {
        Arc::clone(&self.log).stream(execution_id, from_sequence)
    }

    /// One-shot event fetch. Served from the in-memory log while the
    /// execution is held there, falling back to the durable event store.
    pub async fn logs(&self, execution_id: &str, from_sequence: i64) -> Result<Vec<Event>> {
        if self.log.contains(execution_id) {
            return Ok(self.log.since(execution_id, from_sequence));
        }
        self.events.since(execution_id, from_sequence).await
    }

    pub async fn list_by_workflow(&self, workflow_id: &str) -> Result<Vec<Execution>> {
        self.executions.list_by_workflow(workflow_id).await
    }

    pub async fn list_by_status(&self, status: &str) -> Result<Vec<Execution>> {
        self.executions.list_by_status(status).await
    }

    /// Number of executions currently in flight.
    pub fn running_count(&self) -> usize {
        self.running.lock().len()
    }

    /// Cancel every in-flight execution (shutdown path).
    pub fn cancel_all(&self) {
        for running in self.running.lock().values() {
            running.cancel.cancel();
        }
    }

    /// Wait until an execution reaches a terminal state and return the
    /// final record.
    pub async fn wait(&self, execution_id: &str) -> Result<Execution> {
        use tokio_stream::StreamExt;
        loop {
            let execution = self.executions.find_by_id(execution_id).await?;
            if execution.is_terminal() {
                return Ok(execution);
            }
            let mut stream = self.watch(execution_id, 0);
            while (stream.next().await).is_some() {}
            // The terminal record is persisted before the log closes, so
            // the next read should observe it; the pause guards against a
            // watch that ended without a log entry.
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }
}

/// Owned handle for the background task driving one execution. Sole
/// writer of the execution's terminal state.
struct Driver {
    scheduler: Arc<Scheduler>,
    executions: Arc<dyn ExecutionRepository>,
    log: Arc<EventLog>,
    bus: Arc<ObserverBus>,
    running: RunningMap,
    config: EngineConfig,
}

impl Driver {
    async fn drive(self, workflow: Arc<Workflow>, mut execution: Execution, cancel: CancellationToken) {
        execution.mark_running();
        if let Err(e) = self.executions.update(&execution).await {
            error!(execution_id = execution.id.as_str(), error = %e, "failed to persist running state");
        }

        let mut run = Box::pin(self.scheduler.run(&workflow, &execution, &cancel));

        let mut timed_out = false;
        let outcome = tokio::select! {
            outcome = &mut run => outcome,
            _ = tokio::time::sleep(self.config.execution_timeout) => {
                warn!(
                    execution_id = execution.id.as_str(),
                    timeout_secs = self.config.execution_timeout.as_secs(),
                    "execution exceeded its wall-clock budget, cancelling"
                );
                timed_out = true;
                cancel.cancel();
                run.as_mut().await
            }
        };
        drop(run);

        match outcome {
            Ok(outcome) => {
                match outcome.status {
                    ExecutionStatus::Completed => {
                        execution.mark_completed(outcome.output, outcome.duration_ms);
                    }
                    ExecutionStatus::Failed => {
                        execution.mark_failed(
                            outcome
                                .error
                                .unwrap_or_else(|| "execution failed".to_string()),
                            outcome.duration_ms,
                        );
                    }
                    _ => {
                        execution.mark_cancelled(outcome.duration_ms);
                        if timed_out {
                            execution.error = Some(format!(
                                "execution exceeded wall-clock budget of {}s",
                                self.config.execution_timeout.as_secs()
                            ));
                        }
                    }
                }
                info!(
                    execution_id = execution.id.as_str(),
                    status = execution.status.as_str(),
                    waves = outcome.waves,
                    "execution reached terminal state"
                );
            }
            Err(e) => {
                // Engine fault: the scheduler did not reach a terminal
                // event. Detail stays in the logs; the record carries a
                // short message.
                error!(execution_id = execution.id.as_str(), error = %e, "execution aborted by engine fault");
                let emitter = EventEmitter::new(
                    Arc::clone(&self.log),
                    Arc::clone(&self.bus),
                    execution.id.clone(),
                );
                let _ = emitter.emit(Event::execution_failed(&execution.id, e.kind(), 0));
                execution.mark_failed(format!("internal error: {}", e.kind()), 0);
            }
        }

        if let Err(e) = self.executions.update(&execution).await {
            error!(execution_id = execution.id.as_str(), error = %e, "failed to persist terminal state");
        }
        self.log.close(&execution.id);
        self.running.lock().remove(&execution.id);
    }
}
