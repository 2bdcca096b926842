//! Wave scheduler
//!
//! Drives one execution of a workflow to a terminal state. Nodes run in
//! waves: every node whose incoming non-loop edges are resolved runs
//! concurrently, the engine awaits the whole wave, merges outputs into
//! the namespace in lexicographic node-ID order, resolves outgoing edges
//! (source handles, conditions), cascades skip decisions, and replays
//! loop-edge targets up to their iteration bound. Cancellation is checked
//! at every wave boundary and raced against every in-flight executor.

use crate::bus::ObserverBus;
use crate::cancel::CancellationToken;
use crate::context::ExecutionContext;
use crate::error::{EngineError, Result};
use crate::event::Event;
use crate::event_log::{EventEmitter, EventLog};
use crate::expression::ExpressionEvaluator;
use crate::model::{Edge, Execution, ExecutionStatus, JsonMap, NodeExecution, Workflow};
use crate::namespace::VariableNamespace;
use crate::registry::{ExecutorRegistry, NodeExecutor};
use crate::repository::NodeExecutionRepository;
use crate::template;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Engine tuning knobs shared by the scheduler and the execution manager.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Default per-node executor budget; a node's `timeout` config key
    /// (seconds) overrides it.
    pub node_timeout: Duration,
    /// Per-execution wall-clock budget enforced by the manager.
    pub execution_timeout: Duration,
    /// Emit `variable.set` events on every namespace merge.
    pub debug_variable_events: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            node_timeout: Duration::from_secs(60),
            execution_timeout: Duration::from_secs(3600),
            debug_variable_events: false,
        }
    }
}

/// Terminal result of one scheduler run.
#[derive(Debug)]
pub struct SchedulerOutcome {
    pub status: ExecutionStatus,
    pub output: JsonMap,
    pub error: Option<String>,
    pub duration_ms: i64,
    pub waves: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeState {
    Unresolved,
    Taken,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Pending,
    Ready,
    Running,
    Completed,
    Failed,
    Skipped,
    Cancelled,
}

#[derive(Debug)]
enum OutcomeKind {
    Completed(Value),
    Failed(String),
    TimedOut(u64),
    Cancelled,
}

#[derive(Debug)]
struct NodeOutcome {
    duration_ms: i64,
    kind: OutcomeKind,
}

/// Executes workflows wave by wave.
pub struct Scheduler {
    registry: Arc<ExecutorRegistry>,
    node_executions: Arc<dyn NodeExecutionRepository>,
    log: Arc<EventLog>,
    bus: Arc<ObserverBus>,
    config: EngineConfig,
}

impl Scheduler {
    pub fn new(
        registry: Arc<ExecutorRegistry>,
        node_executions: Arc<dyn NodeExecutionRepository>,
        log: Arc<EventLog>,
        bus: Arc<ObserverBus>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            node_executions,
            log,
            bus,
            config,
        }
    }

    /// Drive `execution` to a terminal state. The caller owns the
    /// execution record; the scheduler creates node execution records,
    /// emits every lifecycle event, and returns the terminal outcome.
    pub async fn run(
        &self,
        workflow: &Workflow,
        execution: &Execution,
        cancel: &CancellationToken,
    ) -> Result<SchedulerOutcome> {
        let result = self.run_inner(workflow, execution, cancel).await;
        if result.is_err() {
            // Stop any stragglers from a partially dispatched wave.
            cancel.cancel();
        }
        result
    }

    async fn run_inner(
        &self,
        workflow: &Workflow,
        execution: &Execution,
        cancel: &CancellationToken,
    ) -> Result<SchedulerOutcome> {
        let execution_id = execution.id.as_str();
        let emitter = EventEmitter::new(Arc::clone(&self.log), Arc::clone(&self.bus), execution_id);

        // Resolve every executor up front so a missing type rejects the
        // run before any node starts.
        let mut executors: HashMap<&str, Arc<dyn NodeExecutor>> = HashMap::new();
        for node in &workflow.nodes {
            let executor = self.registry.get(&node.node_type).ok_or_else(|| {
                EngineError::InvalidInput(format!(
                    "no executor registered for node type '{}'",
                    node.node_type
                ))
            })?;
            executors.insert(node.id.as_str(), executor);
        }

        let namespace = Arc::new(VariableNamespace::new());
        namespace.merge(workflow.variables.clone());
        namespace.merge(execution.input.clone());
        let evaluator = Arc::new(ExpressionEvaluator::new());

        let nodes: HashMap<&str, &crate::model::Node> =
            workflow.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

        let mut normal_out: HashMap<&str, Vec<&Edge>> = HashMap::new();
        let mut normal_in: HashMap<&str, Vec<&Edge>> = HashMap::new();
        let mut loop_out: HashMap<&str, Vec<&Edge>> = HashMap::new();
        for edge in &workflow.edges {
            if edge.is_loop() {
                loop_out.entry(edge.from_node.as_str()).or_default().push(edge);
            } else {
                normal_out.entry(edge.from_node.as_str()).or_default().push(edge);
                normal_in.entry(edge.to_node.as_str()).or_default().push(edge);
            }
        }

        let mut edge_states: HashMap<String, EdgeState> = workflow
            .edges
            .iter()
            .filter(|e| !e.is_loop())
            .map(|e| (e.id.clone(), EdgeState::Unresolved))
            .collect();
        let mut node_states: HashMap<String, NodeState> = workflow
            .nodes
            .iter()
            .map(|n| (n.id.clone(), NodeState::Pending))
            .collect();
        let mut node_waves: HashMap<String, i64> = HashMap::new();
        let mut iterations: HashMap<String, i64> = HashMap::new();
        let mut loop_counts: HashMap<String, u32> = HashMap::new();

        // Loop bounds make total work finite: every node can run at most
        // once per loop traversal, plus the initial pass.
        let loop_budget: u64 = workflow
            .edges
            .iter()
            .filter_map(|e| e.loop_config.as_ref())
            .map(|l| l.max_iterations as u64)
            .sum();
        let wave_budget = (workflow.nodes.len() as u64 + 1) * (loop_budget + 1) + 1;

        let run_started = Instant::now();
        emitter.emit(Event::execution_started(
            execution_id,
            &workflow.id,
            &execution.input,
        ))?;

        let mut ready: BTreeSet<String> = BTreeSet::new();
        self.settle_readiness(
            workflow,
            &normal_in,
            &normal_out,
            &mut edge_states,
            &mut node_states,
            &iterations,
            &mut ready,
            &emitter,
            execution_id,
            0,
        )
        .await?;

        let mut wave: i64 = 0;
        let mut failure: Option<String> = None;
        let mut cancelled = false;

        while !ready.is_empty() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if wave as u64 > wave_budget {
                return Err(EngineError::Internal(format!(
                    "wave budget {} exceeded",
                    wave_budget
                )));
            }

            let wave_nodes: Vec<String> = ready.iter().cloned().collect();
            ready.clear();

            debug!(execution_id, wave, nodes = ?wave_nodes, "wave starting");
            emitter.emit(Event::wave_started(execution_id, wave, &wave_nodes))?;

            let snapshot = namespace.snapshot();
            let mut handles = Vec::with_capacity(wave_nodes.len());

            for node_id in &wave_nodes {
                let node = nodes[node_id.as_str()];
                let rendered = template::render_config(&node.config, &snapshot, &evaluator);
                let iteration = iterations.get(node_id).copied().unwrap_or(0);

                let mut record =
                    NodeExecution::new(execution_id, node_id.clone(), wave, iteration);
                record.input = rendered.clone();
                record.mark_running();
                self.node_executions.create(&record).await?;
                node_states.insert(node_id.clone(), NodeState::Running);

                emitter.emit(Event::node_started(
                    execution_id,
                    node_id,
                    &node.node_type,
                    wave,
                    iteration,
                    &rendered,
                ))?;

                let predecessors =
                    taken_predecessors(node_id, &normal_in, &edge_states, &node_waves);
                let ctx = ExecutionContext::new(
                    execution_id,
                    Arc::clone(&namespace),
                    Arc::clone(&evaluator),
                    emitter.clone(),
                    cancel.clone(),
                    predecessors,
                    snapshot.clone(),
                );
                let executor = Arc::clone(&executors[node_id.as_str()]);
                let timeout = node_timeout(&rendered, self.config.node_timeout);
                let cancel_token = cancel.clone();
                let task_node_id = node_id.clone();

                let handle = tokio::spawn(async move {
                    dispatch_node(executor, ctx, task_node_id, rendered, timeout, cancel_token)
                        .await
                });
                handles.push((node_id.clone(), record, handle));
            }

            let mut results = Vec::with_capacity(handles.len());
            for (node_id, record, handle) in handles {
                let outcome = handle.await.unwrap_or_else(|e| NodeOutcome {
                    duration_ms: 0,
                    kind: OutcomeKind::Failed(format!("executor task panicked: {}", e)),
                });
                results.push((node_id, record, outcome));
            }
            // Deterministic merge order for reproducible replays.
            results.sort_by(|a, b| a.0.cmp(&b.0));

            for (node_id, mut record, outcome) in results {
                match outcome.kind {
                    OutcomeKind::Completed(output) => {
                        namespace.set(node_id.clone(), output.clone());
                        if self.config.debug_variable_events {
                            emitter.emit(Event::variable_set(execution_id, &node_id, &output))?;
                        }
                        record.mark_completed(output.clone(), outcome.duration_ms);
                        node_states.insert(node_id.clone(), NodeState::Completed);
                        node_waves.insert(node_id.clone(), wave);
                        emitter.emit(Event::node_completed(
                            execution_id,
                            &node_id,
                            &output,
                            outcome.duration_ms,
                        ))?;
                    }
                    OutcomeKind::Failed(message) => {
                        record.mark_failed(message.clone(), outcome.duration_ms);
                        node_states.insert(node_id.clone(), NodeState::Failed);
                        emitter.emit(Event::node_failed(
                            execution_id,
                            &node_id,
                            &message,
                            outcome.duration_ms,
                        ))?;
                        if failure.is_none() {
                            failure = Some(format!("node '{}' failed: {}", node_id, message));
                        }
                    }
                    OutcomeKind::TimedOut(timeout_ms) => {
                        let message = format!("timed out after {}ms", timeout_ms);
                        record.mark_failed(message.clone(), outcome.duration_ms);
                        node_states.insert(node_id.clone(), NodeState::Failed);
                        emitter.emit(Event::node_failed(
                            execution_id,
                            &node_id,
                            &message,
                            outcome.duration_ms,
                        ))?;
                        if failure.is_none() {
                            failure = Some(format!("node '{}' {}", node_id, message));
                        }
                    }
                    OutcomeKind::Cancelled => {
                        record.mark_cancelled(outcome.duration_ms);
                        node_states.insert(node_id.clone(), NodeState::Cancelled);
                        cancelled = true;
                    }
                }
                self.node_executions.update(&record).await?;
            }

            emitter.emit(Event::wave_completed(execution_id, wave, &wave_nodes))?;

            if cancelled || cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if failure.is_some() {
                break;
            }

            // Resolve outgoing edges of this wave's completed nodes, in
            // lexicographic order against the post-merge snapshot.
            let snapshot = namespace.snapshot();
            for node_id in &wave_nodes {
                if node_states[node_id.as_str()] != NodeState::Completed {
                    continue;
                }
                let output = namespace.get(node_id);
                if let Some(edges) = normal_out.get(node_id.as_str()) {
                    for edge in edges {
                        let taken = resolve_edge(edge, output.as_ref(), &snapshot, &evaluator)?;
                        if !taken {
                            debug!(execution_id, edge = edge.id.as_str(), "edge skipped");
                        }
                        edge_states.insert(
                            edge.id.clone(),
                            if taken { EdgeState::Taken } else { EdgeState::Skipped },
                        );
                    }
                }
            }

            // Loop edges: each traversal re-enqueues the sub-graph
            // reachable from the target, until the bound is spent.
            let mut loop_targets: Vec<String> = Vec::new();
            for node_id in &wave_nodes {
                if node_states[node_id.as_str()] != NodeState::Completed {
                    continue;
                }
                if let Some(edges) = loop_out.get(node_id.as_str()) {
                    for edge in edges {
                        let max_iterations = edge
                            .loop_config
                            .as_ref()
                            .map(|l| l.max_iterations)
                            .unwrap_or(0);
                        let count = loop_counts.entry(edge.id.clone()).or_insert(0);
                        if *count >= max_iterations {
                            continue;
                        }
                        if let Some(condition) = &edge.condition {
                            if !evaluator.eval_bool(condition, &snapshot)? {
                                continue;
                            }
                        }
                        *count += 1;
                        debug!(
                            execution_id,
                            edge = edge.id.as_str(),
                            iteration = *count,
                            "loop edge taken"
                        );
                        loop_targets.push(edge.to_node.clone());
                    }
                }
            }
            for target in loop_targets {
                let reachable = reachable_from(&target, &normal_out);
                for node_id in &reachable {
                    node_states.insert(node_id.clone(), NodeState::Pending);
                    *iterations.entry(node_id.clone()).or_insert(0) += 1;
                    if let Some(edges) = normal_out.get(node_id.as_str()) {
                        for edge in edges {
                            edge_states.insert(edge.id.clone(), EdgeState::Unresolved);
                        }
                    }
                }
            }

            self.settle_readiness(
                workflow,
                &normal_in,
                &normal_out,
                &mut edge_states,
                &mut node_states,
                &iterations,
                &mut ready,
                &emitter,
                execution_id,
                wave + 1,
            )
            .await?;

            wave += 1;
        }

        let duration_ms = run_started.elapsed().as_millis() as i64;
        let output = namespace.snapshot();
        evaluator.clear_results();

        if cancelled || cancel.is_cancelled() {
            emitter.emit(Event::execution_cancelled(execution_id, duration_ms))?;
            return Ok(SchedulerOutcome {
                status: ExecutionStatus::Cancelled,
                output,
                error: None,
                duration_ms,
                waves: wave,
            });
        }
        if let Some(error) = failure {
            emitter.emit(Event::execution_failed(execution_id, &error, duration_ms))?;
            return Ok(SchedulerOutcome {
                status: ExecutionStatus::Failed,
                output,
                error: Some(error),
                duration_ms,
                waves: wave,
            });
        }

        emitter.emit(Event::execution_completed(execution_id, &output, duration_ms))?;
        Ok(SchedulerOutcome {
            status: ExecutionStatus::Completed,
            output,
            error: None,
            duration_ms,
            waves: wave,
        })
    }

    /// Move every pending node whose incoming edges are resolved into the
    /// ready set, and cascade skip decisions to fixpoint: a node whose
    /// incoming edges all resolved without a single taken edge is skipped,
    /// which resolves its own outgoing edges as skipped in turn.
    #[allow(clippy::too_many_arguments)]
    async fn settle_readiness(
        &self,
        workflow: &Workflow,
        normal_in: &HashMap<&str, Vec<&Edge>>,
        normal_out: &HashMap<&str, Vec<&Edge>>,
        edge_states: &mut HashMap<String, EdgeState>,
        node_states: &mut HashMap<String, NodeState>,
        iterations: &HashMap<String, i64>,
        ready: &mut BTreeSet<String>,
        emitter: &EventEmitter,
        execution_id: &str,
        wave: i64,
    ) -> Result<()> {
        loop {
            let mut changed = false;
            for node in &workflow.nodes {
                if node_states[&node.id] != NodeState::Pending {
                    continue;
                }
                let incoming = normal_in.get(node.id.as_str());
                let all_resolved = incoming
                    .map(|edges| {
                        edges
                            .iter()
                            .all(|e| edge_states[&e.id] != EdgeState::Unresolved)
                    })
                    .unwrap_or(true);
                if !all_resolved {
                    continue;
                }
                let any_taken = incoming
                    .map(|edges| edges.iter().any(|e| edge_states[&e.id] == EdgeState::Taken))
                    .unwrap_or(false);

                if incoming.map(|e| e.is_empty()).unwrap_or(true) || any_taken {
                    node_states.insert(node.id.clone(), NodeState::Ready);
                    ready.insert(node.id.clone());
                } else {
                    // Every path into this node was not taken.
                    node_states.insert(node.id.clone(), NodeState::Skipped);
                    let iteration = iterations.get(&node.id).copied().unwrap_or(0);
                    let mut record =
                        NodeExecution::new(execution_id, node.id.clone(), wave, iteration);
                    record.mark_skipped();
                    self.node_executions.create(&record).await?;
                    emitter.emit(Event::node_skipped(execution_id, &node.id, wave))?;
                    if let Some(edges) = normal_out.get(node.id.as_str()) {
                        for edge in edges {
                            edge_states.insert(edge.id.clone(), EdgeState::Skipped);
                        }
                    }
                }
                changed = true;
            }
            if !changed {
                return Ok(());
            }
        }
    }
}

/// Per-node timeout: the rendered config's `timeout` key (seconds)
/// overrides the engine default.
fn node_timeout(config: &JsonMap, default: Duration) -> Duration {
    config
        .get("timeout")
        .and_then(Value::as_u64)
        .map(Duration::from_secs)
        .unwrap_or(default)
}

/// Race the executor against cancellation and its timeout budget.
async fn dispatch_node(
    executor: Arc<dyn NodeExecutor>,
    ctx: ExecutionContext,
    node_id: String,
    config: JsonMap,
    timeout: Duration,
    cancel: CancellationToken,
) -> NodeOutcome {
    let started = Instant::now();
    let kind = tokio::select! {
        _ = cancel.cancelled() => OutcomeKind::Cancelled,
        result = tokio::time::timeout(timeout, executor.execute(&ctx, &node_id, &config)) => {
            match result {
                Err(_) => OutcomeKind::TimedOut(timeout.as_millis() as u64),
                Ok(Ok(output)) => OutcomeKind::Completed(output),
                Ok(Err(EngineError::Cancelled)) => OutcomeKind::Cancelled,
                Ok(Err(e)) => OutcomeKind::Failed(e.to_string()),
            }
        }
    };
    if matches!(kind, OutcomeKind::TimedOut(_)) {
        warn!(
            node_id = node_id.as_str(),
            timeout_ms = timeout.as_millis() as u64,
            "node timed out"
        );
    }
    NodeOutcome {
        duration_ms: started.elapsed().as_millis() as i64,
        kind,
    }
}

/// Whether an edge is traversed given its source's output and the
/// current namespace snapshot.
fn resolve_edge(
    edge: &Edge,
    output: Option<&Value>,
    snapshot: &JsonMap,
    evaluator: &ExpressionEvaluator,
) -> Result<bool> {
    if let Some(handle) = edge.source_handle.as_deref() {
        if !handle.is_empty() {
            let selector = output.and_then(output_selector);
            if selector.as_deref() != Some(handle) {
                return Ok(false);
            }
        }
    }
    if let Some(condition) = &edge.condition {
        if !evaluator.eval_bool(condition, snapshot)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Extract the routing selector from a node output: a boolean `result`
/// field maps to `"true"`/`"false"`, a string `handle` field is used
/// verbatim.
fn output_selector(output: &Value) -> Option<String> {
    let object = output.as_object()?;
    if let Some(result) = object.get("result").and_then(Value::as_bool) {
        return Some(result.to_string());
    }
    object
        .get("handle")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Sources of taken incoming edges, ordered by completion (wave, then
/// node ID). Fan-in executors see them in this order.
fn taken_predecessors(
    node_id: &str,
    normal_in: &HashMap<&str, Vec<&Edge>>,
    edge_states: &HashMap<String, EdgeState>,
    node_waves: &HashMap<String, i64>,
) -> Vec<String> {
    let mut predecessors: Vec<(i64, String)> = normal_in
        .get(node_id)
        .map(|edges| {
            edges
                .iter()
                .filter(|e| edge_states.get(&e.id) == Some(&EdgeState::Taken))
                .map(|e| {
                    (
                        node_waves.get(&e.from_node).copied().unwrap_or(0),
                        e.from_node.clone(),
                    )
                })
                .collect()
        })
        .unwrap_or_default();
    predecessors.sort();
    predecessors.dedup();
    predecessors.into_iter().map(|(_, id)| id).collect()
}

/// Nodes reachable from `start` (inclusive) over normal edges.
fn reachable_from(start: &str, normal_out: &HashMap<&str, Vec<&Edge>>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    seen.insert(start.to_string());
    queue.push_back(start.to_string());

    while let Some(current) = queue.pop_front() {
        if let Some(edges) = normal_out.get(current.as_str()) {
            for edge in edges {
                if seen.insert(edge.to_node.clone()) {
                    queue.push_back(edge.to_node.clone());
                }
            }
        }
    }
    seen.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_selector_from_boolean_result() {
        assert_eq!(
            output_selector(&json!({"result": true})),
            Some("true".to_string())
        );
        assert_eq!(
            output_selector(&json!({"result": false})),
            Some("false".to_string())
        );
    }

    #[test]
    fn test_output_selector_from_handle_field() {
        assert_eq!(
            output_selector(&json!({"handle": "retry"})),
            Some("retry".to_string())
        );
        assert_eq!(output_selector(&json!({"other": 1})), None);
        assert_eq!(output_selector(&json!("scalar")), None);
    }

    #[test]
    fn test_resolve_edge_unconditional() {
        let evaluator = ExpressionEvaluator::new();
        let edge = Edge::new("e", "a", "b");
        let taken = resolve_edge(&edge, Some(&json!({})), &JsonMap::new(), &evaluator).unwrap();
        assert!(taken);
    }

    #[test]
    fn test_resolve_edge_source_handle() {
        let evaluator = ExpressionEvaluator::new();
        let edge = Edge::new("e", "cond", "t").with_source_handle("true");

        let output = json!({"result": true});
        assert!(resolve_edge(&edge, Some(&output), &JsonMap::new(), &evaluator).unwrap());

        let output = json!({"result": false});
        assert!(!resolve_edge(&edge, Some(&output), &JsonMap::new(), &evaluator).unwrap());

        // Empty handle routes unconditionally.
        let edge = Edge::new("e2", "cond", "t").with_source_handle("");
        assert!(resolve_edge(&edge, Some(&output), &JsonMap::new(), &evaluator).unwrap());
    }

    #[test]
    fn test_resolve_edge_condition() {
        let evaluator = ExpressionEvaluator::new();
        let snapshot = json!({"count": 3}).as_object().cloned().unwrap();

        let edge = Edge::new("e", "a", "b").with_condition("count > 2");
        assert!(resolve_edge(&edge, None, &snapshot, &evaluator).unwrap());

        let edge = Edge::new("e2", "a", "b").with_condition("count > 5");
        assert!(!resolve_edge(&edge, None, &snapshot, &evaluator).unwrap());

        // Missing variables skip the edge rather than raising.
        let edge = Edge::new("e3", "a", "b").with_condition("missing == 1");
        assert!(!resolve_edge(&edge, None, &snapshot, &evaluator).unwrap());
    }

    #[test]
    fn test_reachable_from() {
        let e1 = Edge::new("e1", "a", "b");
        let e2 = Edge::new("e2", "b", "c");
        let e3 = Edge::new("e3", "x", "y");
        let mut normal_out: HashMap<&str, Vec<&Edge>> = HashMap::new();
        normal_out.insert("a", vec![&e1]);
        normal_out.insert("b", vec![&e2]);
        normal_out.insert("x", vec![&e3]);

        let mut reachable = reachable_from("a", &normal_out);
        reachable.sort();
        assert_eq!(reachable, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_node_timeout_override() {
        let config = json!({"timeout": 5}).as_object().cloned().unwrap();
        assert_eq!(
            node_timeout(&config, Duration::from_secs(60)),
            Duration::from_secs(5)
        );
        assert_eq!(
            node_timeout(&JsonMap::new(), Duration::from_secs(60)),
            Duration::from_secs(60)
        );
    }
}
