//! Cross-repository integration: one execution's records across the
//! workflow, execution, node-execution, and event stores.

use mbflow::db::Database;
use mbflow::repositories::{
    SqliteEventRepository, SqliteExecutionRepository, SqliteNodeExecutionRepository,
    SqliteWorkflowRepository,
};
use mbflow_core::{
    Edge, Event, EventRepository, EventType, Execution, ExecutionRepository, JsonMap, Node,
    NodeExecution, NodeExecutionRepository, Workflow, WorkflowRepository,
};
use serde_json::json;
use std::sync::Arc;

struct Stores {
    workflows: SqliteWorkflowRepository,
    executions: SqliteExecutionRepository,
    node_executions: SqliteNodeExecutionRepository,
    events: SqliteEventRepository,
}

async fn stores() -> Stores {
    let db = Arc::new(Database::test_in_memory().await.unwrap());
    Stores {
        workflows: SqliteWorkflowRepository::new(Arc::clone(&db)),
        executions: SqliteExecutionRepository::new(Arc::clone(&db)),
        node_executions: SqliteNodeExecutionRepository::new(Arc::clone(&db)),
        events: SqliteEventRepository::new(db),
    }
}

#[tokio::test]
async fn test_full_execution_record_round_trip() {
    let stores = stores().await;

    // Workflow definition.
    let mut workflow = Workflow::new("pipeline")
        .with_variable("env", json!("test"))
        .add_node(Node::new("a", "passthrough", "A"))
        .add_node(
            Node::new("b", "http", "B")
                .with_config_entry("url", json!("http://example.com"))
                .with_config_entry("method", json!("GET")),
        )
        .add_edge(Edge::new("e1", "a", "b").with_condition("env == 'test'"));
    workflow.activate();
    stores.workflows.create(&workflow).await.unwrap();

    // Execution lifecycle.
    let mut execution = Execution::new(&workflow.id, JsonMap::new());
    stores.executions.create(&execution).await.unwrap();
    execution.mark_running();
    stores.executions.update(&execution).await.unwrap();

    // Node records across two waves.
    let mut first = NodeExecution::new(&execution.id, "a", 0, 0);
    first.mark_running();
    stores.node_executions.create(&first).await.unwrap();
    first.mark_completed(json!({}), 3);
    stores.node_executions.update(&first).await.unwrap();

    let mut second = NodeExecution::new(&execution.id, "b", 1, 0);
    second.mark_running();
    stores.node_executions.create(&second).await.unwrap();
    second.mark_completed(json!({"status": 200}), 12);
    stores.node_executions.update(&second).await.unwrap();

    // Terminal state.
    let mut output = JsonMap::new();
    output.insert("b".to_string(), json!({"status": 200}));
    execution.mark_completed(output, 20);
    stores.executions.update(&execution).await.unwrap();

    // Everything reads back consistently.
    let loaded_workflow = stores.workflows.find_by_id(&workflow.id).await.unwrap();
    assert_eq!(loaded_workflow.edges[0].condition.as_deref(), Some("env == 'test'"));

    let loaded_execution = stores.executions.find_by_id(&execution.id).await.unwrap();
    assert_eq!(loaded_execution.status, "completed");
    assert_eq!(loaded_execution.output["b"]["status"], json!(200));

    let records = stores
        .node_executions
        .list_by_execution(&execution.id)
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].node_id, "a");
    assert_eq!(records[1].node_id, "b");
    assert_eq!(records[1].wave, 1);
}

#[tokio::test]
async fn test_event_ordering_survives_persistence() {
    let stores = stores().await;

    let kinds = [
        EventType::ExecutionStarted,
        EventType::WaveStarted,
        EventType::NodeStarted,
        EventType::NodeCompleted,
        EventType::WaveCompleted,
        EventType::ExecutionCompleted,
    ];
    for (index, event_type) in kinds.iter().enumerate() {
        let mut event = Event::new("exec-1", *event_type, None, json!({"i": index}));
        event.sequence = index as i64 + 1;
        stores.events.append(&event).await.unwrap();
    }

    let events = stores.events.since("exec-1", 0).await.unwrap();
    assert_eq!(events.len(), kinds.len());
    for (index, event) in events.iter().enumerate() {
        assert_eq!(event.sequence, index as i64 + 1);
        assert_eq!(event.event_type, kinds[index]);
    }
    assert_eq!(stores.events.count("exec-1").await.unwrap(), 6);
}

#[tokio::test]
async fn test_executions_by_status_across_workflows() {
    let stores = stores().await;

    for (workflow_id, status) in [
        ("wf-1", "completed"),
        ("wf-1", "failed"),
        ("wf-2", "completed"),
    ] {
        let mut execution = Execution::new(workflow_id, JsonMap::new());
        execution.status = status.to_string();
        stores.executions.create(&execution).await.unwrap();
    }

    assert_eq!(
        stores.executions.list_by_status("completed").await.unwrap().len(),
        2
    );
    assert_eq!(
        stores.executions.list_by_workflow("wf-1").await.unwrap().len(),
        2
    );
    assert_eq!(stores.executions.count().await.unwrap(), 3);
}
