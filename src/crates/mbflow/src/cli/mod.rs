//! CLI command implementations
//!
//! Provides the application context (database, repositories, observer
//! bus, execution manager) and the command handlers for the `mbflow`
//! binary.

pub mod execution;
pub mod workflow;

use crate::config::{ConfigLoader, MbflowConfig};
use crate::db::Database;
use crate::error::Result;
use crate::observers::DatabaseObserver;
use crate::repositories::{
    SqliteEventRepository, SqliteExecutionRepository, SqliteNodeExecutionRepository,
    SqliteWorkflowRepository,
};
use crate::shutdown::ShutdownCoordinator;
use mbflow_core::observers::{HttpCallbackObserver, LoggerObserver};
use mbflow_core::{builtin_registry, ExecutionManager, ManagerDeps, ObserverBus};
use std::sync::Arc;

/// Everything a command handler needs.
pub struct AppContext {
    pub config: MbflowConfig,
    pub db: Arc<Database>,
    pub bus: Arc<ObserverBus>,
    pub manager: Arc<ExecutionManager>,
    pub shutdown: ShutdownCoordinator,
}

impl AppContext {
    /// Load configuration, open the database, and wire the engine with
    /// its observers.
    pub async fn build() -> Result<Self> {
        let config = ConfigLoader::new()?.load().await?;
        let db = Arc::new(Database::initialize(config.database_path()?).await?);

        let events = Arc::new(SqliteEventRepository::new(Arc::clone(&db)));
        let deps = ManagerDeps {
            workflows: Arc::new(SqliteWorkflowRepository::new(Arc::clone(&db))),
            executions: Arc::new(SqliteExecutionRepository::new(Arc::clone(&db))),
            node_executions: Arc::new(SqliteNodeExecutionRepository::new(Arc::clone(&db))),
            events: events.clone(),
        };

        let bus = ObserverBus::new(config.bus_config());
        bus.register(Arc::new(DatabaseObserver::new(events)));
        if config.log_events() {
            bus.register(Arc::new(LoggerObserver::new()));
        }
        for endpoint in &config.observers.http_endpoints {
            bus.register(Arc::new(HttpCallbackObserver::new(
                format!("http:{}", endpoint),
                endpoint.clone(),
            )));
        }

        let manager = ExecutionManager::new(
            deps,
            builtin_registry(),
            Arc::clone(&bus),
            config.engine_config(),
        );
        let shutdown = ShutdownCoordinator::new(Arc::clone(&manager));

        Ok(Self {
            config,
            db,
            bus,
            manager,
            shutdown,
        })
    }

    /// Let the bus drain, then release the database.
    pub async fn close(&self) {
        self.bus.flush(std::time::Duration::from_secs(5)).await;
        self.bus.close().await;
        self.db.close().await;
    }
}
