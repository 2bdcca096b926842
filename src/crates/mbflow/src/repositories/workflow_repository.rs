//! Workflow repository for database operations

use crate::db::Database;
use async_trait::async_trait;
use mbflow_core::error::Result;
use mbflow_core::{Edge, EngineError, JsonMap, Node, Workflow, WorkflowRepository};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::sync::Arc;

/// Nodes, edges, and variables are stored together as one JSON document;
/// the remaining columns stay queryable.
#[derive(Serialize, Deserialize, Default)]
struct WorkflowDefinition {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    variables: JsonMap,
}

/// Repository for workflow database operations
#[derive(Clone, Debug)]
pub struct SqliteWorkflowRepository {
    db: Arc<Database>,
}

impl SqliteWorkflowRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn definition_json(workflow: &Workflow) -> Result<String> {
        let definition = WorkflowDefinition {
            nodes: workflow.nodes.clone(),
            edges: workflow.edges.clone(),
            variables: workflow.variables.clone(),
        };
        Ok(serde_json::to_string(&definition)?)
    }

    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Workflow> {
        let definition: WorkflowDefinition =
            serde_json::from_str(row.get::<String, _>("definition").as_str())?;
        Ok(Workflow {
            id: row.get("id"),
            name: row.get("name"),
            version: row.get("version"),
            status: row.get("status"),
            nodes: definition.nodes,
            edges: definition.edges,
            variables: definition.variables,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    /// Check if a workflow exists
    pub async fn exists(&self, id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM workflows WHERE id = ?")
            .bind(id)
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| EngineError::Repository(format!("Failed to check workflow: {}", e)))?;
        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    /// Delete a workflow
    pub async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM workflows WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await
            .map_err(|e| EngineError::Repository(format!("Failed to delete workflow: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl WorkflowRepository for SqliteWorkflowRepository {
    async fn create(&self, workflow: &Workflow) -> Result<()> {
        sqlx::query(
            "INSERT INTO workflows (id, name, version, status, definition, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&workflow.id)
        .bind(&workflow.name)
        .bind(workflow.version)
        .bind(&workflow.status)
        .bind(Self::definition_json(workflow)?)
        .bind(workflow.created_at)
        .bind(workflow.updated_at)
        .execute(self.db.pool())
        .await
        .map_err(|e| EngineError::Repository(format!("Failed to save workflow: {}", e)))?;
        Ok(())
    }

    async fn update(&self, workflow: &Workflow) -> Result<()> {
        sqlx::query(
            "UPDATE workflows
             SET name = ?, version = ?, status = ?, definition = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&workflow.name)
        .bind(workflow.version)
        .bind(&workflow.status)
        .bind(Self::definition_json(workflow)?)
        .bind(workflow.updated_at)
        .bind(&workflow.id)
        .execute(self.db.pool())
        .await
        .map_err(|e| EngineError::Repository(format!("Failed to update workflow: {}", e)))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Workflow> {
        let row = sqlx::query(
            "SELECT id, name, version, status, definition, created_at, updated_at
             FROM workflows WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| EngineError::Repository(format!("Failed to load workflow: {}", e)))?
        .ok_or_else(|| EngineError::NotFound(format!("workflow '{}'", id)))?;

        Self::from_row(&row)
    }

    async fn list(&self) -> Result<Vec<Workflow>> {
        let rows = sqlx::query(
            "SELECT id, name, version, status, definition, created_at, updated_at
             FROM workflows
             ORDER BY created_at DESC",
        )
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| EngineError::Repository(format!("Failed to list workflows: {}", e)))?;

        rows.iter().map(Self::from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn setup() -> SqliteWorkflowRepository {
        let db = Arc::new(Database::test_in_memory().await.unwrap());
        SqliteWorkflowRepository::new(db)
    }

    fn sample() -> Workflow {
        Workflow::new("sample")
            .with_variable("env", json!("test"))
            .add_node(Node::new("a", "passthrough", "A"))
            .add_node(Node::new("b", "passthrough", "B"))
            .add_edge(Edge::new("e1", "a", "b"))
    }

    #[tokio::test]
    async fn test_save_and_find_round_trips_definition() {
        let repo = setup().await;
        let workflow = sample();
        repo.create(&workflow).await.unwrap();

        let loaded = repo.find_by_id(&workflow.id).await.unwrap();
        assert_eq!(loaded.name, "sample");
        assert_eq!(loaded.nodes.len(), 2);
        assert_eq!(loaded.edges.len(), 1);
        assert_eq!(loaded.variables["env"], json!("test"));
        assert_eq!(loaded.status, "draft");
    }

    #[tokio::test]
    async fn test_find_missing_is_not_found() {
        let repo = setup().await;
        let err = repo.find_by_id("missing").await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_changes_status_and_version() {
        let repo = setup().await;
        let mut workflow = sample();
        repo.create(&workflow).await.unwrap();

        workflow.activate();
        workflow.bump_version();
        repo.update(&workflow).await.unwrap();

        let loaded = repo.find_by_id(&workflow.id).await.unwrap();
        assert_eq!(loaded.status, "active");
        assert_eq!(loaded.version, 2);
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let repo = setup().await;
        let first = sample();
        let second = Workflow::new("other").add_node(Node::new("x", "passthrough", "X"));
        repo.create(&first).await.unwrap();
        repo.create(&second).await.unwrap();

        assert_eq!(repo.list().await.unwrap().len(), 2);
        assert!(repo.exists(&first.id).await.unwrap());

        repo.delete(&first.id).await.unwrap();
        assert!(!repo.exists(&first.id).await.unwrap());
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_create_fails() {
        let repo = setup().await;
        let workflow = sample();
        repo.create(&workflow).await.unwrap();
        assert!(repo.create(&workflow).await.is_err());
    }
}
