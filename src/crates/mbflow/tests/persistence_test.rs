//! End-to-end: the engine running over SQLite repositories, with the
//! database observer making the event stream durable.

use mbflow::db::Database;
use mbflow::observers::DatabaseObserver;
use mbflow::repositories::{
    SqliteEventRepository, SqliteExecutionRepository, SqliteNodeExecutionRepository,
    SqliteWorkflowRepository,
};
use mbflow_core::{
    builtin_registry, Edge, EngineConfig, EventRepository, EventType, ExecutionManager, JsonMap,
    ManagerDeps, Node, ObserverBus, Workflow, WorkflowRepository,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

async fn sqlite_manager() -> (Arc<ExecutionManager>, Arc<ObserverBus>, Arc<SqliteEventRepository>) {
    let db = Arc::new(Database::test_in_memory().await.unwrap());
    let events = Arc::new(SqliteEventRepository::new(Arc::clone(&db)));

    let bus = ObserverBus::with_defaults();
    bus.register(Arc::new(DatabaseObserver::new(events.clone())));

    let manager = ExecutionManager::new(
        ManagerDeps {
            workflows: Arc::new(SqliteWorkflowRepository::new(Arc::clone(&db))),
            executions: Arc::new(SqliteExecutionRepository::new(Arc::clone(&db))),
            node_executions: Arc::new(SqliteNodeExecutionRepository::new(Arc::clone(&db))),
            events: events.clone(),
        },
        builtin_registry(),
        Arc::clone(&bus),
        EngineConfig::default(),
    );

    (manager, bus, events)
}

#[tokio::test]
async fn test_execution_is_fully_persisted() {
    let (manager, bus, events) = sqlite_manager().await;

    let workflow = Workflow::new("persisted")
        .add_node(Node::new("a", "passthrough", "A"))
        .add_node(
            Node::new("b", "transform", "B")
                .with_config_entry("fields", json!({"msg": "done"})),
        )
        .add_edge(Edge::new("e1", "a", "b"));
    manager.workflows().create(&workflow).await.unwrap();

    let execution_id = manager.run(&workflow.id, JsonMap::new()).await.unwrap();
    let execution = manager.wait(&execution_id).await.unwrap();
    assert_eq!(execution.status, "completed");
    assert_eq!(execution.output["b"]["msg"], json!("done"));

    // Let the database observer drain, then verify the durable stream.
    assert!(bus.flush(Duration::from_secs(2)).await);
    let stored = events.since(&execution_id, 0).await.unwrap();
    assert!(!stored.is_empty());

    // Contiguous sequences from 1, matching the in-memory log.
    let sequences: Vec<i64> = stored.iter().map(|e| e.sequence).collect();
    let expected: Vec<i64> = (1..=stored.len() as i64).collect();
    assert_eq!(sequences, expected);

    assert_eq!(stored[0].event_type, EventType::ExecutionStarted);
    assert_eq!(
        stored.last().unwrap().event_type,
        EventType::ExecutionCompleted
    );
    let in_memory = manager.logs(&execution_id, 0).await.unwrap();
    assert_eq!(stored.len(), in_memory.len());
}

#[tokio::test]
async fn test_logs_fall_back_to_the_durable_store() {
    let (manager, bus, _events) = sqlite_manager().await;

    let workflow = Workflow::new("durable").add_node(Node::new("a", "passthrough", "A"));
    manager.workflows().create(&workflow).await.unwrap();

    let execution_id = manager.run(&workflow.id, JsonMap::new()).await.unwrap();
    manager.wait(&execution_id).await.unwrap();
    assert!(bus.flush(Duration::from_secs(2)).await);

    // Drop the in-memory log; reads now come from SQLite.
    manager.event_log().remove(&execution_id);
    let events = manager.logs(&execution_id, 0).await.unwrap();
    assert!(!events.is_empty());
    assert_eq!(events[0].event_type, EventType::ExecutionStarted);
}

#[tokio::test]
async fn test_failed_execution_persists_error_and_events() {
    let (manager, bus, events) = sqlite_manager().await;

    // A conditional with a non-boolean expression fails at runtime.
    let workflow = Workflow::new("broken").add_node(
        Node::new("gate", "conditional", "Gate").with_config_entry("condition", json!("1 + 1")),
    );
    manager.workflows().create(&workflow).await.unwrap();

    let execution_id = manager.run(&workflow.id, JsonMap::new()).await.unwrap();
    let execution = manager.wait(&execution_id).await.unwrap();
    assert_eq!(execution.status, "failed");
    assert!(execution.error.is_some());

    assert!(bus.flush(Duration::from_secs(2)).await);
    let stored = events.since(&execution_id, 0).await.unwrap();
    assert!(stored
        .iter()
        .any(|e| e.event_type == EventType::NodeFailed));
    assert!(stored
        .iter()
        .any(|e| e.event_type == EventType::ExecutionFailed));
}
