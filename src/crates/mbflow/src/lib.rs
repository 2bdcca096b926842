//! # mbflow: Workflow Orchestrator Service
//!
//! The service layer around [`mbflow_core`]: SQLite persistence for
//! workflows, executions, node executions, events, and triggers; the
//! database observer that makes the event stream durable; layered TOML
//! configuration; and the `mbflow` CLI.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod init;
pub mod observers;
pub mod repositories;
pub mod shutdown;

pub use config::{ConfigLoader, MbflowConfig};
pub use db::Database;
pub use error::{MbflowError, Result};
pub use observers::DatabaseObserver;
pub use shutdown::ShutdownCoordinator;
pub use repositories::{
    SqliteEventRepository, SqliteExecutionRepository, SqliteNodeExecutionRepository,
    SqliteTriggerRepository, SqliteWorkflowRepository,
};
