//! Event repository for database operations
//!
//! Events are keyed by `(execution_id, sequence)` with a uniqueness
//! constraint; sequence allocation for unsequenced events happens inside
//! a single INSERT..SELECT statement, so it is atomic under SQLite's
//! writer lock.

use crate::db::Database;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mbflow_core::error::Result;
use mbflow_core::{EngineError, Event, EventRepository, EventType};
use serde_json::Value;
use sqlx::Row;
use std::sync::Arc;

/// Repository for event database operations
#[derive(Clone, Debug)]
pub struct SqliteEventRepository {
    db: Arc<Database>,
}

impl SqliteEventRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Event> {
        let event_type: EventType = row
            .get::<String, _>("event_type")
            .parse()
            .map_err(EngineError::Repository)?;
        let payload: Value = serde_json::from_str(row.get::<String, _>("payload").as_str())?;
        let timestamp = DateTime::parse_from_rfc3339(row.get::<String, _>("timestamp").as_str())
            .map_err(|e| EngineError::Repository(format!("Invalid event timestamp: {}", e)))?
            .with_timezone(&Utc);
        Ok(Event {
            id: row.get("id"),
            execution_id: row.get("execution_id"),
            sequence: row.get("sequence"),
            event_type,
            node_id: row.get("node_id"),
            payload,
            timestamp,
        })
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    async fn append(&self, event: &Event) -> Result<Event> {
        let payload = serde_json::to_string(&event.payload)?;
        let timestamp = event.timestamp.to_rfc3339();
        let mut stored = event.clone();

        if event.sequence > 0 {
            sqlx::query(
                "INSERT INTO events (id, execution_id, sequence, event_type, node_id, payload, timestamp)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&event.id)
            .bind(&event.execution_id)
            .bind(event.sequence)
            .bind(event.event_type.as_str())
            .bind(&event.node_id)
            .bind(&payload)
            .bind(&timestamp)
            .execute(self.db.pool())
            .await
            .map_err(|e| EngineError::Repository(format!("Failed to save event: {}", e)))?;
        } else {
            let row = sqlx::query(
                "INSERT INTO events (id, execution_id, sequence, event_type, node_id, payload, timestamp)
                 SELECT ?1, ?2, COALESCE(MAX(sequence), 0) + 1, ?3, ?4, ?5, ?6
                 FROM events WHERE execution_id = ?2
                 RETURNING sequence",
            )
            .bind(&event.id)
            .bind(&event.execution_id)
            .bind(event.event_type.as_str())
            .bind(&event.node_id)
            .bind(&payload)
            .bind(&timestamp)
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| EngineError::Repository(format!("Failed to save event: {}", e)))?;
            stored.sequence = row.get("sequence");
        }

        Ok(stored)
    }

    async fn since(&self, execution_id: &str, from_sequence: i64) -> Result<Vec<Event>> {
        let rows = sqlx::query(
            "SELECT id, execution_id, sequence, event_type, node_id, payload, timestamp
             FROM events
             WHERE execution_id = ? AND sequence > ?
             ORDER BY sequence ASC",
        )
        .bind(execution_id)
        .bind(from_sequence)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| EngineError::Repository(format!("Failed to list events: {}", e)))?;

        rows.iter().map(Self::from_row).collect()
    }

    async fn count(&self, execution_id: &str) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM events WHERE execution_id = ?")
            .bind(execution_id)
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| EngineError::Repository(format!("Failed to count events: {}", e)))?;
        Ok(row.get("count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn setup() -> SqliteEventRepository {
        let db = Arc::new(Database::test_in_memory().await.unwrap());
        SqliteEventRepository::new(db)
    }

    fn event(execution_id: &str) -> Event {
        Event::new(execution_id, EventType::NodeLog, Some("a".into()), json!({"m": 1}))
    }

    #[tokio::test]
    async fn test_append_allocates_contiguous_sequences() {
        let repo = setup().await;
        for expected in 1..=5 {
            let stored = repo.append(&event("exec-1")).await.unwrap();
            assert_eq!(stored.sequence, expected);
        }
        assert_eq!(repo.count("exec-1").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_append_preserves_engine_assigned_sequences() {
        let repo = setup().await;
        let mut first = event("exec-1");
        first.sequence = 7;
        let stored = repo.append(&first).await.unwrap();
        assert_eq!(stored.sequence, 7);

        // Duplicate (execution_id, sequence) violates uniqueness.
        let mut duplicate = event("exec-1");
        duplicate.sequence = 7;
        assert!(repo.append(&duplicate).await.is_err());
    }

    #[tokio::test]
    async fn test_sequences_are_scoped_per_execution() {
        let repo = setup().await;
        repo.append(&event("exec-1")).await.unwrap();
        repo.append(&event("exec-1")).await.unwrap();
        let other = repo.append(&event("exec-2")).await.unwrap();
        assert_eq!(other.sequence, 1);
    }

    #[tokio::test]
    async fn test_since_round_trips_wire_fields() {
        let repo = setup().await;
        let original = event("exec-1");
        repo.append(&original).await.unwrap();

        let events = repo.since("exec-1", 0).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, original.id);
        assert_eq!(events[0].event_type, EventType::NodeLog);
        assert_eq!(events[0].node_id.as_deref(), Some("a"));
        assert_eq!(events[0].payload, json!({"m": 1}));
        assert_eq!(
            events[0].timestamp.timestamp(),
            original.timestamp.timestamp()
        );

        assert!(repo.since("exec-1", 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_appends_never_collide() {
        let repo = Arc::new(setup().await);
        let mut handles = Vec::new();
        for _ in 0..20 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.append(&event("exec-1")).await.unwrap().sequence
            }));
        }

        let mut sequences = Vec::new();
        for handle in handles {
            sequences.push(handle.await.unwrap());
        }
        sequences.sort();
        let expected: Vec<i64> = (1..=20).collect();
        assert_eq!(sequences, expected);
    }
}
