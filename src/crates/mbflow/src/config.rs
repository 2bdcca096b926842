//! Configuration schema and layered loading
//!
//! Configuration merges three layers, later layers overriding earlier
//! ones:
//! 1. Built-in defaults
//! 2. User-level config: ~/.mbflow/mbflow.toml
//! 3. Project-level config: ./.mbflow/mbflow.toml

use crate::error::Result;
use crate::init;
use mbflow_core::{BusConfig, EngineConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MbflowConfig {
    #[serde(default)]
    pub database: DatabaseSection,

    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub observers: ObserverSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSection {
    /// Database file path; defaults to ~/.mbflow/mbflow.db
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSection {
    /// Default per-node executor budget in seconds
    pub node_timeout_secs: Option<u64>,

    /// Per-execution wall-clock budget in seconds
    pub execution_timeout_secs: Option<u64>,

    /// Observer bus main buffer capacity
    pub bus_buffer_size: Option<usize>,

    /// Emit variable.set events on every namespace write
    pub debug_variable_events: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObserverSection {
    /// HTTP sinks receiving every event
    #[serde(default)]
    pub http_endpoints: Vec<String>,

    /// Register the structured-log observer
    pub log_events: Option<bool>,
}

impl MbflowConfig {
    /// Overlay `other` on top of this config; fields present in `other`
    /// win.
    pub fn merge(&mut self, other: MbflowConfig) {
        if other.database.path.is_some() {
            self.database.path = other.database.path;
        }
        if other.engine.node_timeout_secs.is_some() {
            self.engine.node_timeout_secs = other.engine.node_timeout_secs;
        }
        if other.engine.execution_timeout_secs.is_some() {
            self.engine.execution_timeout_secs = other.engine.execution_timeout_secs;
        }
        if other.engine.bus_buffer_size.is_some() {
            self.engine.bus_buffer_size = other.engine.bus_buffer_size;
        }
        if other.engine.debug_variable_events.is_some() {
            self.engine.debug_variable_events = other.engine.debug_variable_events;
        }
        if !other.observers.http_endpoints.is_empty() {
            self.observers.http_endpoints = other.observers.http_endpoints;
        }
        if other.observers.log_events.is_some() {
            self.observers.log_events = other.observers.log_events;
        }
    }

    /// Resolved database path.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => init::get_database_path(),
        }
    }

    /// Engine configuration with defaults applied.
    pub fn engine_config(&self) -> EngineConfig {
        let defaults = EngineConfig::default();
        EngineConfig {
            node_timeout: self
                .engine
                .node_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.node_timeout),
            execution_timeout: self
                .engine
                .execution_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.execution_timeout),
            debug_variable_events: self.engine.debug_variable_events.unwrap_or(false),
        }
    }

    /// Observer bus configuration with defaults applied.
    pub fn bus_config(&self) -> BusConfig {
        let defaults = BusConfig::default();
        BusConfig {
            buffer_size: self.engine.bus_buffer_size.unwrap_or(defaults.buffer_size),
            ..defaults
        }
    }

    pub fn log_events(&self) -> bool {
        self.observers.log_events.unwrap_or(true)
    }
}

/// Configuration loader that handles both user and project configs
pub struct ConfigLoader {
    user_config_path: PathBuf,
    project_config_path: PathBuf,
}

impl ConfigLoader {
    pub fn new() -> Result<Self> {
        Ok(Self {
            user_config_path: init::get_user_config_path()?,
            project_config_path: init::get_project_config_path(),
        })
    }

    /// Load configuration with project config taking precedence over the
    /// user config; missing files fall back to defaults.
    pub async fn load(&self) -> Result<MbflowConfig> {
        let mut config = MbflowConfig::default();
        info!("Loading configuration");

        match self.load_from_path(&self.user_config_path).await {
            Ok(user_config) => {
                debug!(path = %self.user_config_path.display(), "Loaded user-level config");
                config.merge(user_config);
            }
            Err(e) => {
                debug!(
                    path = %self.user_config_path.display(),
                    error = %e,
                    "User-level config not found, using defaults"
                );
            }
        }

        match self.load_from_path(&self.project_config_path).await {
            Ok(project_config) => {
                debug!(path = %self.project_config_path.display(), "Loaded project-level config");
                config.merge(project_config);
            }
            Err(e) => {
                debug!(
                    path = %self.project_config_path.display(),
                    error = %e,
                    "Project-level config not found"
                );
            }
        }

        Ok(config)
    }

    async fn load_from_path(&self, path: &PathBuf) -> Result<MbflowConfig> {
        let contents = tokio::fs::read_to_string(path).await?;
        Ok(toml::from_str(&contents)?)
    }
}
