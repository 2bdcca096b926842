//! Lifecycle event types
//!
//! Every state transition of an execution is recorded as an `Event` with a
//! per-execution, strictly increasing sequence number. Events are appended
//! to the event log and fanned out to observers; they are never mutated
//! after append.

use crate::model::JsonMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Event type enumeration covering every engine lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "execution.started")]
    ExecutionStarted,
    #[serde(rename = "execution.completed")]
    ExecutionCompleted,
    #[serde(rename = "execution.failed")]
    ExecutionFailed,
    #[serde(rename = "execution.cancelled")]
    ExecutionCancelled,
    #[serde(rename = "wave.started")]
    WaveStarted,
    #[serde(rename = "wave.completed")]
    WaveCompleted,
    #[serde(rename = "node.started")]
    NodeStarted,
    #[serde(rename = "node.completed")]
    NodeCompleted,
    #[serde(rename = "node.failed")]
    NodeFailed,
    #[serde(rename = "node.skipped")]
    NodeSkipped,
    #[serde(rename = "node.log")]
    NodeLog,
    #[serde(rename = "variable.set")]
    VariableSet,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExecutionStarted => "execution.started",
            Self::ExecutionCompleted => "execution.completed",
            Self::ExecutionFailed => "execution.failed",
            Self::ExecutionCancelled => "execution.cancelled",
            Self::WaveStarted => "wave.started",
            Self::WaveCompleted => "wave.completed",
            Self::NodeStarted => "node.started",
            Self::NodeCompleted => "node.completed",
            Self::NodeFailed => "node.failed",
            Self::NodeSkipped => "node.skipped",
            Self::NodeLog => "node.log",
            Self::VariableSet => "variable.set",
        }
    }

    /// Whether this is one of the three terminal execution events.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ExecutionCompleted | Self::ExecutionFailed | Self::ExecutionCancelled
        )
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "execution.started" => Ok(Self::ExecutionStarted),
            "execution.completed" => Ok(Self::ExecutionCompleted),
            "execution.failed" => Ok(Self::ExecutionFailed),
            "execution.cancelled" => Ok(Self::ExecutionCancelled),
            "wave.started" => Ok(Self::WaveStarted),
            "wave.completed" => Ok(Self::WaveCompleted),
            "node.started" => Ok(Self::NodeStarted),
            "node.completed" => Ok(Self::NodeCompleted),
            "node.failed" => Ok(Self::NodeFailed),
            "node.skipped" => Ok(Self::NodeSkipped),
            "node.log" => Ok(Self::NodeLog),
            "variable.set" => Ok(Self::VariableSet),
            other => Err(format!("unknown event type '{}'", other)),
        }
    }
}

/// A single lifecycle event.
///
/// Wire format: `{id, execution_id, sequence, type, node_id?, payload,
/// timestamp}` with an RFC-3339 timestamp. The sequence is assigned by the
/// event log at append time; events constructed but not yet appended carry
/// sequence 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub execution_id: String,
    pub sequence: i64,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(
        execution_id: impl Into<String>,
        event_type: EventType,
        node_id: Option<String>,
        payload: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            execution_id: execution_id.into(),
            sequence: 0,
            event_type,
            node_id,
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Create an `execution.started` event
    pub fn execution_started(execution_id: &str, workflow_id: &str, input: &JsonMap) -> Self {
        Self::new(
            execution_id,
            EventType::ExecutionStarted,
            None,
            json!({ "workflow_id": workflow_id, "input": input }),
        )
    }

    /// Create an `execution.completed` event
    pub fn execution_completed(execution_id: &str, output: &JsonMap, duration_ms: i64) -> Self {
        Self::new(
            execution_id,
            EventType::ExecutionCompleted,
            None,
            json!({ "status": "completed", "output": output, "duration_ms": duration_ms }),
        )
    }

    /// Create an `execution.failed` event
    pub fn execution_failed(execution_id: &str, error: &str, duration_ms: i64) -> Self {
        Self::new(
            execution_id,
            EventType::ExecutionFailed,
            None,
            json!({ "status": "failed", "error": error, "duration_ms": duration_ms }),
        )
    }

    /// Create an `execution.cancelled` event
    pub fn execution_cancelled(execution_id: &str, duration_ms: i64) -> Self {
        Self::new(
            execution_id,
            EventType::ExecutionCancelled,
            None,
            json!({ "status": "cancelled", "duration_ms": duration_ms }),
        )
    }

    /// Create a `wave.started` event
    pub fn wave_started(execution_id: &str, wave: i64, node_ids: &[String]) -> Self {
        Self::new(
            execution_id,
            EventType::WaveStarted,
            None,
            json!({ "wave": wave, "node_ids": node_ids }),
        )
    }

    /// Create a `wave.completed` event
    pub fn wave_completed(execution_id: &str, wave: i64, node_ids: &[String]) -> Self {
        Self::new(
            execution_id,
            EventType::WaveCompleted,
            None,
            json!({ "wave": wave, "node_ids": node_ids }),
        )
    }

    /// Create a `node.started` event
    pub fn node_started(
        execution_id: &str,
        node_id: &str,
        node_type: &str,
        wave: i64,
        iteration: i64,
        input: &JsonMap,
    ) -> Self {
        Self::new(
            execution_id,
            EventType::NodeStarted,
            Some(node_id.to_string()),
            json!({
                "node_id": node_id,
                "node_type": node_type,
                "wave": wave,
                "iteration": iteration,
                "input": input,
            }),
        )
    }

    /// Create a `node.completed` event
    pub fn node_completed(execution_id: &str, node_id: &str, output: &Value, duration_ms: i64) -> Self {
        Self::new(
            execution_id,
            EventType::NodeCompleted,
            Some(node_id.to_string()),
            json!({ "node_id": node_id, "output": output, "duration_ms": duration_ms }),
        )
    }

    /// Create a `node.failed` event
    pub fn node_failed(execution_id: &str, node_id: &str, error: &str, duration_ms: i64) -> Self {
        Self::new(
            execution_id,
            EventType::NodeFailed,
            Some(node_id.to_string()),
            json!({ "node_id": node_id, "error": error, "duration_ms": duration_ms }),
        )
    }

    /// Create a `node.skipped` event
    pub fn node_skipped(execution_id: &str, node_id: &str, wave: i64) -> Self {
        Self::new(
            execution_id,
            EventType::NodeSkipped,
            Some(node_id.to_string()),
            json!({ "node_id": node_id, "wave": wave }),
        )
    }

    /// Create a `node.log` event (debug-level, emitted by executors)
    pub fn node_log(execution_id: &str, node_id: &str, message: &str) -> Self {
        Self::new(
            execution_id,
            EventType::NodeLog,
            Some(node_id.to_string()),
            json!({ "node_id": node_id, "message": message }),
        )
    }

    /// Create a `variable.set` event (debug mode only)
    pub fn variable_set(execution_id: &str, key: &str, value: &Value) -> Self {
        Self::new(
            execution_id,
            EventType::VariableSet,
            None,
            json!({ "key": key, "value": value }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_round_trip() {
        let all = [
            EventType::ExecutionStarted,
            EventType::ExecutionCompleted,
            EventType::ExecutionFailed,
            EventType::ExecutionCancelled,
            EventType::WaveStarted,
            EventType::WaveCompleted,
            EventType::NodeStarted,
            EventType::NodeCompleted,
            EventType::NodeFailed,
            EventType::NodeSkipped,
            EventType::NodeLog,
            EventType::VariableSet,
        ];
        for event_type in all {
            let parsed: EventType = event_type.as_str().parse().unwrap();
            assert_eq!(parsed, event_type);
        }
        assert!("bogus.event".parse::<EventType>().is_err());
    }

    #[test]
    fn test_terminal_classification() {
        assert!(EventType::ExecutionCompleted.is_terminal());
        assert!(EventType::ExecutionFailed.is_terminal());
        assert!(EventType::ExecutionCancelled.is_terminal());
        assert!(!EventType::ExecutionStarted.is_terminal());
        assert!(!EventType::NodeCompleted.is_terminal());
    }

    #[test]
    fn test_node_started_payload() {
        let mut input = JsonMap::new();
        input.insert("url".to_string(), serde_json::json!("http://example.com"));
        let event = Event::node_started("exec-1", "fetch", "http", 2, 0, &input);

        assert_eq!(event.event_type, EventType::NodeStarted);
        assert_eq!(event.node_id.as_deref(), Some("fetch"));
        assert_eq!(event.payload["node_type"], "http");
        assert_eq!(event.payload["wave"], 2);
        assert_eq!(event.payload["input"]["url"], "http://example.com");
        assert_eq!(event.sequence, 0);
    }

    #[test]
    fn test_wire_serialization() {
        let event = Event::node_completed("exec-1", "a", &serde_json::json!({"k": 1}), 25);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "node.completed");
        assert_eq!(json["execution_id"], "exec-1");
        assert_eq!(json["node_id"], "a");
        assert_eq!(json["payload"]["duration_ms"], 25);
        // RFC-3339 timestamp
        assert!(json["timestamp"].as_str().unwrap().contains('T'));

        let parsed: Event = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_execution_events_carry_status() {
        let output = JsonMap::new();
        let completed = Event::execution_completed("exec-1", &output, 100);
        assert_eq!(completed.payload["status"], "completed");

        let failed = Event::execution_failed("exec-1", "boom", 50);
        assert_eq!(failed.payload["status"], "failed");
        assert_eq!(failed.payload["error"], "boom");

        let cancelled = Event::execution_cancelled("exec-1", 10);
        assert_eq!(cancelled.payload["status"], "cancelled");
    }
}
