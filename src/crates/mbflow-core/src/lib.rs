//! # mbflow-core: Workflow Execution Engine
//!
//! The core of MBFlow: executes directed acyclic graphs of typed
//! computation nodes with runtime variable propagation, conditional
//! branching, bounded loop edges, parallel wave dispatch, and a totally
//! ordered lifecycle event stream.
//!
//! ## Architecture
//!
//! ```text
//!                ┌──────────────────────────────────┐
//!                │         ExecutionManager         │
//!                │  run / get / cancel / retry      │
//!                │  watch / logs                    │
//!                └───────────────┬──────────────────┘
//!                                │
//!                                ▼
//!                ┌──────────────────────────────────┐
//!                │            Scheduler             │
//!                │  wave planning · readiness       │
//!                │  loop replay · parallel dispatch │
//!                └──────┬──────────────────┬────────┘
//!                       │                  │
//!                       ▼                  ▼
//!        ┌──────────────────┐    ┌──────────────────┐
//!        │ ExecutorRegistry │    │     EventLog     │
//!        │ http · transform │    │  seq 1,2,3,…     │
//!        │ conditional · …  │    └────────┬─────────┘
//!        └────────┬─────────┘             │
//!                 │                       ▼
//!        ┌────────┴─────────┐    ┌──────────────────┐
//!        │ VariableNamespace│    │   ObserverBus    │
//!        │ templates · exprs│    │ bounded fan-out  │
//!        └──────────────────┘    └──────────────────┘
//! ```
//!
//! Executors run concurrently within a wave; outputs merge into the
//! shared namespace in deterministic order at the wave boundary, where
//! outgoing edges are resolved by source handle or condition expression.
//! Observers consume the event stream with best-effort, at-most-once
//! delivery per observer.

pub mod bus;
pub mod cancel;
pub mod context;
pub mod error;
pub mod event;
pub mod event_log;
pub mod executors;
pub mod expression;
pub mod manager;
pub mod model;
pub mod namespace;
pub mod observers;
pub mod registry;
pub mod repository;
pub mod retry;
pub mod scheduler;
pub mod template;

// Re-export main types
pub use bus::{BusConfig, BusMetricsSnapshot, EventFilter, Observer, ObserverBus, ObserverError};
pub use cancel::CancellationToken;
pub use context::ExecutionContext;
pub use error::{EngineError, Result};
pub use event::{Event, EventType};
pub use event_log::{EventEmitter, EventLog};
pub use executors::builtin_registry;
pub use expression::{ExpressionError, ExpressionEvaluator};
pub use manager::{ExecutionManager, ManagerDeps};
pub use model::{
    Edge, Execution, ExecutionStatus, JsonMap, LoopConfig, Node, NodeExecution,
    NodeExecutionStatus, Trigger, Workflow, WorkflowStatus,
};
pub use namespace::VariableNamespace;
pub use registry::{ExecutorRegistry, NodeExecutor};
pub use repository::{
    EventRepository, ExecutionRepository, NodeExecutionRepository, TriggerRepository,
    WorkflowRepository,
};
pub use retry::{with_retry, RetryConfig};
pub use scheduler::{EngineConfig, Scheduler, SchedulerOutcome};
