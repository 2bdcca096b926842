//! Database management and migrations
//!
//! Provides the SQLite connection pool and schema management for
//! persistent workflow, execution, and event storage.

use crate::error::{MbflowError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Type alias for the database connection pool
pub type DatabasePool = SqlitePool;

/// Database connection wrapper
#[derive(Clone, Debug)]
pub struct Database {
    pub(crate) pool: Arc<DatabasePool>,
}

impl Database {
    /// Open (creating if necessary) the SQLite database at `path`.
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        Self::with_max_connections(database_path, 5).await
    }

    /// Open the database with a custom pool size.
    pub async fn with_max_connections<P: AsRef<Path>>(
        database_path: P,
        max_connections: u32,
    ) -> Result<Self> {
        let path = database_path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    MbflowError::Database(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        debug!(path = %path.display(), "Connecting to database");
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| MbflowError::Database(format!("Failed to connect to database: {}", e)))?;

        info!(path = %path.display(), "Database connection established");
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Run migrations on the database.
    ///
    /// Migrations are embedded in the binary from ./migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await
            .map_err(|e| MbflowError::Database(format!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Perform a health check by running a simple query
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| MbflowError::Database(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Close the database connection
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection closed");
    }

    /// Create the database and run all migrations
    pub async fn initialize<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let db = Self::new(database_path).await?;
        db.run_migrations().await?;
        Ok(db)
    }

    /// Create an in-memory test database with migrations applied.
    ///
    /// Single connection: every pooled connection to `:memory:` would
    /// otherwise open its own blank database.
    pub async fn test_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                MbflowError::Database(format!("Failed to connect to in-memory database: {}", e))
            })?;

        let db = Self {
            pool: Arc::new(pool),
        };
        db.run_migrations().await?;
        Ok(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_in_memory_database_health() {
        let db = Database::test_in_memory().await.unwrap();
        db.health_check().await.unwrap();
        db.close().await;
    }

    #[tokio::test]
    async fn test_initialize_creates_file_and_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("mbflow.db");

        let db = Database::initialize(&path).await.unwrap();
        db.health_check().await.unwrap();
        assert!(path.exists());

        // Schema is queryable after migration.
        sqlx::query("SELECT COUNT(*) FROM workflows")
            .execute(db.pool())
            .await
            .unwrap();
        db.close().await;
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mbflow.db");

        let db = Database::initialize(&path).await.unwrap();
        db.run_migrations().await.unwrap();
        db.close().await;
    }
}
