//! Execution repository for database operations

use crate::db::Database;
use async_trait::async_trait;
use mbflow_core::error::Result;
use mbflow_core::{EngineError, Execution, ExecutionRepository, JsonMap};
use sqlx::Row;
use std::sync::Arc;

/// Repository for execution database operations
#[derive(Clone, Debug)]
pub struct SqliteExecutionRepository {
    db: Arc<Database>,
}

impl SqliteExecutionRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Execution> {
        let input: JsonMap = serde_json::from_str(row.get::<String, _>("input").as_str())?;
        let output: JsonMap = serde_json::from_str(row.get::<String, _>("output").as_str())?;
        Ok(Execution {
            id: row.get("id"),
            workflow_id: row.get("workflow_id"),
            status: row.get("status"),
            input,
            output,
            error: row.get("error"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
            duration_ms: row.get("duration_ms"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    const COLUMNS: &'static str = "id, workflow_id, status, input, output, error, \
         started_at, completed_at, duration_ms, created_at, updated_at";
}

#[async_trait]
impl ExecutionRepository for SqliteExecutionRepository {
    async fn create(&self, execution: &Execution) -> Result<()> {
        sqlx::query(
            "INSERT INTO executions (id, workflow_id, status, input, output, error,
                                     started_at, completed_at, duration_ms, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&execution.id)
        .bind(&execution.workflow_id)
        .bind(&execution.status)
        .bind(serde_json::to_string(&execution.input)?)
        .bind(serde_json::to_string(&execution.output)?)
        .bind(&execution.error)
        .bind(execution.started_at)
        .bind(execution.completed_at)
        .bind(execution.duration_ms)
        .bind(execution.created_at)
        .bind(execution.updated_at)
        .execute(self.db.pool())
        .await
        .map_err(|e| EngineError::Repository(format!("Failed to save execution: {}", e)))?;
        Ok(())
    }

    async fn update(&self, execution: &Execution) -> Result<()> {
        sqlx::query(
            "UPDATE executions
             SET status = ?, input = ?, output = ?, error = ?,
                 started_at = ?, completed_at = ?, duration_ms = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&execution.status)
        .bind(serde_json::to_string(&execution.input)?)
        .bind(serde_json::to_string(&execution.output)?)
        .bind(&execution.error)
        .bind(execution.started_at)
        .bind(execution.completed_at)
        .bind(execution.duration_ms)
        .bind(execution.updated_at)
        .bind(&execution.id)
        .execute(self.db.pool())
        .await
        .map_err(|e| EngineError::Repository(format!("Failed to update execution: {}", e)))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Execution> {
        let query = format!("SELECT {} FROM executions WHERE id = ?", Self::COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| EngineError::Repository(format!("Failed to load execution: {}", e)))?
            .ok_or_else(|| EngineError::NotFound(format!("execution '{}'", id)))?;
        Self::from_row(&row)
    }

    async fn list_by_workflow(&self, workflow_id: &str) -> Result<Vec<Execution>> {
        let query = format!(
            "SELECT {} FROM executions WHERE workflow_id = ? ORDER BY created_at DESC",
            Self::COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(workflow_id)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| EngineError::Repository(format!("Failed to list executions: {}", e)))?;
        rows.iter().map(Self::from_row).collect()
    }

    async fn list_by_status(&self, status: &str) -> Result<Vec<Execution>> {
        let query = format!(
            "SELECT {} FROM executions WHERE status = ? ORDER BY created_at DESC",
            Self::COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(status)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| EngineError::Repository(format!("Failed to list executions: {}", e)))?;
        rows.iter().map(Self::from_row).collect()
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM executions")
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| EngineError::Repository(format!("Failed to count executions: {}", e)))?;
        Ok(row.get("count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn setup() -> SqliteExecutionRepository {
        let db = Arc::new(Database::test_in_memory().await.unwrap());
        SqliteExecutionRepository::new(db)
    }

    fn input() -> JsonMap {
        json!({"x": 1}).as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let repo = setup().await;
        let execution = Execution::new("wf-1", input());
        repo.create(&execution).await.unwrap();

        let loaded = repo.find_by_id(&execution.id).await.unwrap();
        assert_eq!(loaded.workflow_id, "wf-1");
        assert_eq!(loaded.status, "pending");
        assert_eq!(loaded.input["x"], json!(1));
        assert!(loaded.error.is_none());
    }

    #[tokio::test]
    async fn test_terminal_update_round_trips() {
        let repo = setup().await;
        let mut execution = Execution::new("wf-1", input());
        repo.create(&execution).await.unwrap();

        execution.mark_running();
        let mut output = JsonMap::new();
        output.insert("result".to_string(), json!("done"));
        execution.mark_completed(output, 123);
        repo.update(&execution).await.unwrap();

        let loaded = repo.find_by_id(&execution.id).await.unwrap();
        assert_eq!(loaded.status, "completed");
        assert_eq!(loaded.output["result"], json!("done"));
        assert_eq!(loaded.duration_ms, 123);
        assert!(loaded.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_queries_by_workflow_and_status() {
        let repo = setup().await;
        let mut running = Execution::new("wf-1", JsonMap::new());
        running.mark_running();
        let pending = Execution::new("wf-1", JsonMap::new());
        let other = Execution::new("wf-2", JsonMap::new());

        repo.create(&running).await.unwrap();
        repo.create(&pending).await.unwrap();
        repo.create(&other).await.unwrap();

        assert_eq!(repo.list_by_workflow("wf-1").await.unwrap().len(), 2);
        assert_eq!(repo.list_by_status("running").await.unwrap().len(), 1);
        assert_eq!(repo.list_by_status("pending").await.unwrap().len(), 2);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_find_missing_is_not_found() {
        let repo = setup().await;
        let err = repo.find_by_id("missing").await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }
}
