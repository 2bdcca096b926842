//! Workflow, execution, and trigger definitions
//!
//! Defines the core data model with status tracking, lifecycle helpers,
//! and structural validation of workflow graphs.

use crate::error::{EngineError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;

/// JSON object alias used for variables, inputs, outputs, and node config.
pub type JsonMap = serde_json::Map<String, Value>;

/// Workflow status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    /// Workflow is editable and has not been published
    Draft,
    /// Workflow is published and runnable
    Active,
    /// Workflow is retired; new executions are rejected
    Archived,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for WorkflowStatus {
    fn from(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "archived" => Self::Archived,
            _ => Self::Draft,
        }
    }
}

/// Execution status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Execution is created and waiting to start
    Pending,
    /// Execution is currently running
    Running,
    /// Execution completed successfully
    Completed,
    /// Execution failed with an error
    Failed,
    /// Execution was cancelled
    Cancelled,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for ExecutionStatus {
    fn from(s: &str) -> Self {
        match s {
            "running" => Self::Running,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "cancelled" => Self::Cancelled,
            _ => Self::Pending,
        }
    }
}

/// Node execution status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeExecutionStatus {
    /// Node became ready and is waiting for dispatch
    Pending,
    /// Executor invocation is in flight
    Running,
    /// Executor returned successfully
    Completed,
    /// Executor returned an error or timed out
    Failed,
    /// The planner determined the node's branch was not taken
    Skipped,
    /// Cancellation was observed while the node was in flight
    Cancelled,
}

impl NodeExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }
}

impl std::fmt::Display for NodeExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for NodeExecutionStatus {
    fn from(s: &str) -> Self {
        match s {
            "running" => Self::Running,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "skipped" => Self::Skipped,
            "cancelled" => Self::Cancelled,
            _ => Self::Pending,
        }
    }
}

/// Non-semantic canvas position hint for editors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A typed computation node within a workflow.
///
/// The `node_type` tag selects the executor; `config` is opaque to the
/// engine and interpreted by the executor after template rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Stable identifier, unique within the owning workflow
    pub id: String,

    /// Executor type tag ("http", "transform", "conditional", ...)
    #[serde(rename = "type")]
    pub node_type: String,

    /// Display name
    pub name: String,

    /// Executor-specific configuration
    #[serde(default)]
    pub config: JsonMap,

    /// Optional canvas position (non-semantic)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Node {
    pub fn new(
        id: impl Into<String>,
        node_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            name: name.into(),
            config: JsonMap::new(),
            position: None,
        }
    }

    /// Replace the whole configuration mapping
    pub fn with_config(mut self, config: JsonMap) -> Self {
        self.config = config;
        self
    }

    /// Set a single configuration entry
    pub fn with_config_entry(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position { x, y });
        self
    }
}

/// Loop configuration carried by a back-edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Maximum number of traversals of this edge within one execution
    pub max_iterations: u32,
}

/// A directed edge between two nodes of the same workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Stable identifier, unique within the owning workflow
    pub id: String,

    /// Source node ID
    pub from_node: String,

    /// Target node ID
    pub to_node: String,

    /// Optional output selector ("", "true", "false", or free-form)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,

    /// Optional gating expression evaluated against the namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Present on loop edges; exempts the edge from the DAG invariant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_config: Option<LoopConfig>,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        from_node: impl Into<String>,
        to_node: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            from_node: from_node.into(),
            to_node: to_node.into(),
            source_handle: None,
            condition: None,
            loop_config: None,
        }
    }

    pub fn with_source_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_loop(mut self, max_iterations: u32) -> Self {
        self.loop_config = Some(LoopConfig { max_iterations });
        self
    }

    /// Whether this edge carries a loop configuration
    pub fn is_loop(&self) -> bool {
        self.loop_config.is_some()
    }
}

/// A named DAG of typed computation nodes.
///
/// Immutable once an execution references it; updates bump `version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique workflow identifier (UUID string)
    pub id: String,

    /// Workflow name
    pub name: String,

    /// Logical version, bumped on update
    pub version: i64,

    /// Current workflow status
    pub status: String,

    /// Ordered node sequence
    pub nodes: Vec<Node>,

    /// Edge set
    pub edges: Vec<Edge>,

    /// Workflow-level variables seeding the execution namespace
    #[serde(default)]
    pub variables: JsonMap,

    /// Creation timestamp (Unix seconds)
    pub created_at: i64,

    /// Last update timestamp (Unix seconds)
    pub updated_at: i64,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            version: 1,
            status: WorkflowStatus::Draft.as_str().to_string(),
            nodes: Vec::new(),
            edges: Vec::new(),
            variables: JsonMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> WorkflowStatus {
        WorkflowStatus::from(self.status.as_str())
    }

    pub fn add_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn add_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: Value) -> Self {
        self.variables.insert(key.into(), value);
        self
    }

    /// Mark the workflow runnable
    pub fn activate(&mut self) {
        self.status = WorkflowStatus::Active.as_str().to_string();
        self.updated_at = Utc::now().timestamp();
    }

    /// Retire the workflow; new executions are rejected
    pub fn archive(&mut self) {
        self.status = WorkflowStatus::Archived.as_str().to_string();
        self.updated_at = Utc::now().timestamp();
    }

    /// Bump the logical version after a definition change
    pub fn bump_version(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now().timestamp();
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Validate the structural invariants of the definition.
    ///
    /// Checks ID uniqueness, edge endpoint resolution, self-reference
    /// rejection, loop bounds, and acyclicity of the non-loop sub-graph.
    /// Edge conditions are compile-checked so a malformed expression is
    /// rejected before the execution starts.
    pub fn validate(&self) -> Result<()> {
        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if node.id.is_empty() {
                return Err(EngineError::Validation("node with empty id".to_string()));
            }
            if node.node_type.is_empty() {
                return Err(EngineError::Validation(format!(
                    "node '{}' has an empty type",
                    node.id
                )));
            }
            if !node_ids.insert(node.id.as_str()) {
                return Err(EngineError::Validation(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
        }

        let mut edge_ids = HashSet::new();
        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(EngineError::Validation(format!(
                    "duplicate edge id '{}'",
                    edge.id
                )));
            }
            if edge.from_node == edge.to_node {
                return Err(EngineError::Validation(format!(
                    "edge '{}' references node '{}' on both endpoints",
                    edge.id, edge.from_node
                )));
            }
            if !node_ids.contains(edge.from_node.as_str()) {
                return Err(EngineError::Validation(format!(
                    "edge '{}' references unknown source node '{}'",
                    edge.id, edge.from_node
                )));
            }
            if !node_ids.contains(edge.to_node.as_str()) {
                return Err(EngineError::Validation(format!(
                    "edge '{}' references unknown target node '{}'",
                    edge.id, edge.to_node
                )));
            }
            if let Some(loop_config) = &edge.loop_config {
                if loop_config.max_iterations == 0 {
                    return Err(EngineError::Validation(format!(
                        "loop edge '{}' must allow at least one iteration",
                        edge.id
                    )));
                }
            }
            if let Some(condition) = &edge.condition {
                crate::expression::compile_check(condition).map_err(|e| {
                    EngineError::InvalidInput(format!(
                        "edge '{}' has an invalid condition: {}",
                        edge.id, e
                    ))
                })?;
            }
        }

        self.check_acyclic()?;
        Ok(())
    }

    /// Kahn's algorithm over the non-loop edges; loop edges are exempt.
    fn check_acyclic(&self) -> Result<()> {
        let mut indegree: HashMap<&str, usize> =
            self.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();

        for edge in self.edges.iter().filter(|e| !e.is_loop()) {
            *indegree.entry(edge.to_node.as_str()).or_insert(0) += 1;
            adjacency
                .entry(edge.from_node.as_str())
                .or_default()
                .push(edge.to_node.as_str());
        }

        let mut queue: VecDeque<&str> = indegree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut visited = 0usize;

        while let Some(id) = queue.pop_front() {
            visited += 1;
            if let Some(next) = adjacency.get(id) {
                for target in next {
                    let degree = indegree.get_mut(target).expect("known node");
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(target);
                    }
                }
            }
        }

        if visited != self.nodes.len() {
            return Err(EngineError::Validation(
                "workflow contains a cycle of non-loop edges".to_string(),
            ));
        }
        Ok(())
    }
}

/// A single run of a workflow to a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    /// Unique execution identifier (UUID string)
    pub id: String,

    /// Owning workflow ID
    pub workflow_id: String,

    /// Current execution status
    pub status: String,

    /// Initial namespace seed
    #[serde(default)]
    pub input: JsonMap,

    /// Final namespace snapshot, written at terminal state
    #[serde(default)]
    pub output: JsonMap,

    /// Short human-readable error, set on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Start timestamp (Unix seconds), set on first dispatch
    pub started_at: Option<i64>,

    /// Completion timestamp (Unix seconds)
    pub completed_at: Option<i64>,

    /// Total elapsed wall clock in milliseconds
    pub duration_ms: i64,

    /// Record creation timestamp (Unix seconds)
    pub created_at: i64,

    /// Record last update timestamp (Unix seconds)
    pub updated_at: i64,
}

impl Execution {
    pub fn new(workflow_id: impl Into<String>, input: JsonMap) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            workflow_id: workflow_id.into(),
            status: ExecutionStatus::Pending.as_str().to_string(),
            input,
            output: JsonMap::new(),
            error: None,
            started_at: None,
            completed_at: None,
            duration_ms: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> ExecutionStatus {
        ExecutionStatus::from(self.status.as_str())
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    pub fn mark_running(&mut self) {
        let now = Utc::now().timestamp();
        self.status = ExecutionStatus::Running.as_str().to_string();
        self.started_at = Some(now);
        self.updated_at = now;
    }

    pub fn mark_completed(&mut self, output: JsonMap, duration_ms: i64) {
        let now = Utc::now().timestamp();
        self.status = ExecutionStatus::Completed.as_str().to_string();
        self.output = output;
        self.completed_at = Some(now);
        self.duration_ms = duration_ms;
        self.updated_at = now;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>, duration_ms: i64) {
        let now = Utc::now().timestamp();
        self.status = ExecutionStatus::Failed.as_str().to_string();
        self.error = Some(error.into());
        self.completed_at = Some(now);
        self.duration_ms = duration_ms;
        self.updated_at = now;
    }

    pub fn mark_cancelled(&mut self, duration_ms: i64) {
        let now = Utc::now().timestamp();
        self.status = ExecutionStatus::Cancelled.as_str().to_string();
        self.completed_at = Some(now);
        self.duration_ms = duration_ms;
        self.updated_at = now;
    }
}

/// One visit of the scheduler to one node within one execution.
///
/// Loop replays create fresh records distinguished by `iteration`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeExecution {
    /// Unique record identifier (UUID string)
    pub id: String,

    /// Owning execution ID
    pub execution_id: String,

    /// Node ID within the workflow
    pub node_id: String,

    /// Scheduler wave in which the node ran
    pub wave: i64,

    /// Loop iteration index, 0 for the first pass
    pub iteration: i64,

    /// Current node execution status
    pub status: String,

    /// Rendered configuration snapshot handed to the executor
    #[serde(default)]
    pub input: JsonMap,

    /// Executor output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,

    /// Error message if the node failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Executor wall clock in milliseconds
    pub duration_ms: i64,

    /// Dispatch timestamp (Unix seconds)
    pub started_at: Option<i64>,

    /// Completion timestamp (Unix seconds)
    pub completed_at: Option<i64>,

    /// Record creation timestamp (Unix seconds)
    pub created_at: i64,
}

impl NodeExecution {
    pub fn new(
        execution_id: impl Into<String>,
        node_id: impl Into<String>,
        wave: i64,
        iteration: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            execution_id: execution_id.into(),
            node_id: node_id.into(),
            wave,
            iteration,
            status: NodeExecutionStatus::Pending.as_str().to_string(),
            input: JsonMap::new(),
            output: None,
            error: None,
            duration_ms: 0,
            started_at: None,
            completed_at: None,
            created_at: Utc::now().timestamp(),
        }
    }

    pub fn status(&self) -> NodeExecutionStatus {
        NodeExecutionStatus::from(self.status.as_str())
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    pub fn mark_running(&mut self) {
        self.status = NodeExecutionStatus::Running.as_str().to_string();
        self.started_at = Some(Utc::now().timestamp());
    }

    pub fn mark_completed(&mut self, output: Value, duration_ms: i64) {
        self.status = NodeExecutionStatus::Completed.as_str().to_string();
        self.output = Some(output);
        self.completed_at = Some(Utc::now().timestamp());
        self.duration_ms = duration_ms;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>, duration_ms: i64) {
        self.status = NodeExecutionStatus::Failed.as_str().to_string();
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now().timestamp());
        self.duration_ms = duration_ms;
    }

    pub fn mark_skipped(&mut self) {
        self.status = NodeExecutionStatus::Skipped.as_str().to_string();
        self.completed_at = Some(Utc::now().timestamp());
    }

    pub fn mark_cancelled(&mut self, duration_ms: i64) {
        self.status = NodeExecutionStatus::Cancelled.as_str().to_string();
        self.completed_at = Some(Utc::now().timestamp());
        self.duration_ms = duration_ms;
    }
}

/// A registered run-initiation source for a workflow.
///
/// Trigger ingress (cron, webhook, interval drivers) lives outside the
/// engine; the engine only stores trigger records and records firings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    /// Unique trigger identifier (UUID string)
    pub id: String,

    /// Workflow started by this trigger
    pub workflow_id: String,

    /// Trigger kind tag ("cron", "webhook", "interval", ...)
    pub trigger_type: String,

    /// Driver-specific configuration
    #[serde(default)]
    pub config: JsonMap,

    /// Whether the trigger may fire
    pub enabled: bool,

    /// Last firing timestamp (Unix seconds)
    pub last_triggered_at: Option<i64>,

    /// Record creation timestamp (Unix seconds)
    pub created_at: i64,

    /// Record last update timestamp (Unix seconds)
    pub updated_at: i64,
}

impl Trigger {
    pub fn new(workflow_id: impl Into<String>, trigger_type: impl Into<String>) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            workflow_id: workflow_id.into(),
            trigger_type: trigger_type.into(),
            config: JsonMap::new(),
            enabled: true,
            last_triggered_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_config(mut self, config: JsonMap) -> Self {
        self.config = config;
        self
    }

    pub fn mark_triggered(&mut self) {
        let now = Utc::now().timestamp();
        self.last_triggered_at = Some(now);
        self.updated_at = now;
    }
}
