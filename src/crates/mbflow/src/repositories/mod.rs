//! SQLite implementations of the engine repository contracts.

pub mod event_repository;
pub mod execution_repository;
pub mod node_execution_repository;
pub mod trigger_repository;
pub mod workflow_repository;

pub use event_repository::SqliteEventRepository;
pub use execution_repository::SqliteExecutionRepository;
pub use node_execution_repository::SqliteNodeExecutionRepository;
pub use trigger_repository::SqliteTriggerRepository;
pub use workflow_repository::SqliteWorkflowRepository;
