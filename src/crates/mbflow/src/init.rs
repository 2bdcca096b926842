//! Initialization
//!
//! First-time setup: directory creation, default configuration, and
//! database bootstrap under ~/.mbflow.

use crate::config::MbflowConfig;
use crate::db::Database;
use crate::error::{MbflowError, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Configuration directory name
pub const CONFIG_DIR: &str = ".mbflow";

/// Configuration file name
pub const CONFIG_FILE: &str = "mbflow.toml";

/// Database file name
pub const DATABASE_FILE: &str = "mbflow.db";

/// Get the MBFlow home directory (~/.mbflow)
pub fn get_mbflow_home() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR))
        .ok_or_else(|| MbflowError::Config("Could not determine home directory".to_string()))
}

/// Get the path to the user-level configuration file
pub fn get_user_config_path() -> Result<PathBuf> {
    Ok(get_mbflow_home()?.join(CONFIG_FILE))
}

/// Get the path to the project-level configuration file
pub fn get_project_config_path() -> PathBuf {
    PathBuf::from(".").join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Get the path to the database file
pub fn get_database_path() -> Result<PathBuf> {
    Ok(get_mbflow_home()?.join(DATABASE_FILE))
}

/// Check if MBFlow is initialized: the home directory exists and holds a
/// database file.
pub fn is_initialized() -> bool {
    get_mbflow_home()
        .map(|home| home.exists() && home.join(DATABASE_FILE).exists())
        .unwrap_or(false)
}

/// Initialize directories, write a default config if none exists, and
/// create the database with its schema.
pub async fn initialize() -> Result<PathBuf> {
    let home = get_mbflow_home()?;
    if !home.exists() {
        fs::create_dir_all(&home)?;
        info!(path = %home.display(), "Created configuration directory");
    }

    let config_path = home.join(CONFIG_FILE);
    if !config_path.exists() {
        let default_config = toml::to_string_pretty(&MbflowConfig::default())
            .map_err(|e| MbflowError::Config(format!("Failed to render default config: {}", e)))?;
        fs::write(&config_path, default_config)?;
        info!(path = %config_path.display(), "Wrote default configuration");
    }

    let database_path = home.join(DATABASE_FILE);
    let db = Database::initialize(&database_path).await?;
    db.close().await;
    info!(path = %database_path.display(), "Database initialized");

    Ok(home)
}
