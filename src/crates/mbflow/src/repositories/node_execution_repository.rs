//! Node execution repository for database operations

use crate::db::Database;
use async_trait::async_trait;
use mbflow_core::error::Result;
use mbflow_core::{EngineError, JsonMap, NodeExecution, NodeExecutionRepository};
use serde_json::Value;
use sqlx::Row;
use std::sync::Arc;

/// Repository for node execution database operations
#[derive(Clone, Debug)]
pub struct SqliteNodeExecutionRepository {
    db: Arc<Database>,
}

impl SqliteNodeExecutionRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<NodeExecution> {
        let input: JsonMap = serde_json::from_str(row.get::<String, _>("input").as_str())?;
        let output: Option<Value> = row
            .get::<Option<String>, _>("output")
            .map(|text| serde_json::from_str(&text))
            .transpose()?;
        Ok(NodeExecution {
            id: row.get("id"),
            execution_id: row.get("execution_id"),
            node_id: row.get("node_id"),
            wave: row.get("wave"),
            iteration: row.get("iteration"),
            status: row.get("status"),
            input,
            output,
            error: row.get("error"),
            duration_ms: row.get("duration_ms"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
            created_at: row.get("created_at"),
        })
    }

    const COLUMNS: &'static str = "id, execution_id, node_id, wave, iteration, status, input, \
         output, error, duration_ms, started_at, completed_at, created_at";
}

#[async_trait]
impl NodeExecutionRepository for SqliteNodeExecutionRepository {
    async fn create(&self, node_execution: &NodeExecution) -> Result<()> {
        let output = node_execution
            .output
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        sqlx::query(
            "INSERT INTO node_executions (id, execution_id, node_id, wave, iteration, status,
                                          input, output, error, duration_ms, started_at,
                                          completed_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&node_execution.id)
        .bind(&node_execution.execution_id)
        .bind(&node_execution.node_id)
        .bind(node_execution.wave)
        .bind(node_execution.iteration)
        .bind(&node_execution.status)
        .bind(serde_json::to_string(&node_execution.input)?)
        .bind(output)
        .bind(&node_execution.error)
        .bind(node_execution.duration_ms)
        .bind(node_execution.started_at)
        .bind(node_execution.completed_at)
        .bind(node_execution.created_at)
        .execute(self.db.pool())
        .await
        .map_err(|e| EngineError::Repository(format!("Failed to save node execution: {}", e)))?;
        Ok(())
    }

    async fn update(&self, node_execution: &NodeExecution) -> Result<()> {
        let output = node_execution
            .output
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        sqlx::query(
            "UPDATE node_executions
             SET status = ?, input = ?, output = ?, error = ?, duration_ms = ?,
                 started_at = ?, completed_at = ?
             WHERE id = ?",
        )
        .bind(&node_execution.status)
        .bind(serde_json::to_string(&node_execution.input)?)
        .bind(output)
        .bind(&node_execution.error)
        .bind(node_execution.duration_ms)
        .bind(node_execution.started_at)
        .bind(node_execution.completed_at)
        .bind(&node_execution.id)
        .execute(self.db.pool())
        .await
        .map_err(|e| EngineError::Repository(format!("Failed to update node execution: {}", e)))?;
        Ok(())
    }

    async fn list_by_execution(&self, execution_id: &str) -> Result<Vec<NodeExecution>> {
        let query = format!(
            "SELECT {} FROM node_executions WHERE execution_id = ? ORDER BY wave ASC, node_id ASC",
            Self::COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(execution_id)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| {
                EngineError::Repository(format!("Failed to list node executions: {}", e))
            })?;
        rows.iter().map(Self::from_row).collect()
    }

    async fn list_by_wave(&self, execution_id: &str, wave: i64) -> Result<Vec<NodeExecution>> {
        let query = format!(
            "SELECT {} FROM node_executions WHERE execution_id = ? AND wave = ? ORDER BY node_id ASC",
            Self::COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(execution_id)
            .bind(wave)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| {
                EngineError::Repository(format!("Failed to list node executions: {}", e))
            })?;
        rows.iter().map(Self::from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn setup() -> SqliteNodeExecutionRepository {
        let db = Arc::new(Database::test_in_memory().await.unwrap());
        SqliteNodeExecutionRepository::new(db)
    }

    #[tokio::test]
    async fn test_save_update_and_list() {
        let repo = setup().await;
        let mut record = NodeExecution::new("exec-1", "a", 0, 0);
        record.mark_running();
        repo.create(&record).await.unwrap();

        record.mark_completed(json!({"k": "v"}), 42);
        repo.update(&record).await.unwrap();

        let records = repo.list_by_execution("exec-1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, "completed");
        assert_eq!(records[0].output, Some(json!({"k": "v"})));
        assert_eq!(records[0].duration_ms, 42);
    }

    #[tokio::test]
    async fn test_list_by_wave_orders_by_node_id() {
        let repo = setup().await;
        repo.create(&NodeExecution::new("exec-1", "zeta", 1, 0))
            .await
            .unwrap();
        repo.create(&NodeExecution::new("exec-1", "alpha", 1, 0))
            .await
            .unwrap();
        repo.create(&NodeExecution::new("exec-1", "omega", 0, 0))
            .await
            .unwrap();

        let wave_one = repo.list_by_wave("exec-1", 1).await.unwrap();
        assert_eq!(wave_one.len(), 2);
        assert_eq!(wave_one[0].node_id, "alpha");
        assert_eq!(wave_one[1].node_id, "zeta");
    }

    #[tokio::test]
    async fn test_loop_iterations_are_distinct_records() {
        let repo = setup().await;
        for iteration in 0..3 {
            repo.create(&NodeExecution::new("exec-1", "a", iteration * 2, iteration))
                .await
                .unwrap();
        }

        let records = repo.list_by_execution("exec-1").await.unwrap();
        assert_eq!(records.len(), 3);
        let iterations: Vec<i64> = records.iter().map(|r| r.iteration).collect();
        assert_eq!(iterations, vec![0, 1, 2]);
    }
}
