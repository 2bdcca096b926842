//! Trigger repository for database operations

use crate::db::Database;
use async_trait::async_trait;
use chrono::Utc;
use mbflow_core::error::Result;
use mbflow_core::{EngineError, JsonMap, Trigger, TriggerRepository};
use sqlx::Row;
use std::sync::Arc;

/// Repository for trigger database operations
#[derive(Clone, Debug)]
pub struct SqliteTriggerRepository {
    db: Arc<Database>,
}

impl SqliteTriggerRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Trigger> {
        let config: JsonMap = serde_json::from_str(row.get::<String, _>("config").as_str())?;
        Ok(Trigger {
            id: row.get("id"),
            workflow_id: row.get("workflow_id"),
            trigger_type: row.get("trigger_type"),
            config,
            enabled: row.get::<i64, _>("enabled") != 0,
            last_triggered_at: row.get("last_triggered_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl TriggerRepository for SqliteTriggerRepository {
    async fn create(&self, trigger: &Trigger) -> Result<()> {
        sqlx::query(
            "INSERT INTO triggers (id, workflow_id, trigger_type, config, enabled,
                                   last_triggered_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&trigger.id)
        .bind(&trigger.workflow_id)
        .bind(&trigger.trigger_type)
        .bind(serde_json::to_string(&trigger.config)?)
        .bind(trigger.enabled as i64)
        .bind(trigger.last_triggered_at)
        .bind(trigger.created_at)
        .bind(trigger.updated_at)
        .execute(self.db.pool())
        .await
        .map_err(|e| EngineError::Repository(format!("Failed to save trigger: {}", e)))?;
        Ok(())
    }

    async fn find_enabled(&self) -> Result<Vec<Trigger>> {
        let rows = sqlx::query(
            "SELECT id, workflow_id, trigger_type, config, enabled,
                    last_triggered_at, created_at, updated_at
             FROM triggers
             WHERE enabled = 1
             ORDER BY created_at ASC",
        )
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| EngineError::Repository(format!("Failed to list triggers: {}", e)))?;
        rows.iter().map(Self::from_row).collect()
    }

    async fn mark_triggered(&self, id: &str) -> Result<()> {
        let now = Utc::now().timestamp();
        let result = sqlx::query(
            "UPDATE triggers SET last_triggered_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(self.db.pool())
        .await
        .map_err(|e| EngineError::Repository(format!("Failed to mark trigger: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(EngineError::NotFound(format!("trigger '{}'", id)));
        }
        Ok(())
    }
}
