//! Workflow management commands

use crate::cli::AppContext;
use crate::error::{MbflowError, Result};
use colored::Colorize;
use mbflow_core::{Edge, JsonMap, Node, Workflow};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// On-disk workflow definition accepted by `workflow create`.
#[derive(Debug, Deserialize)]
struct WorkflowFile {
    name: String,
    #[serde(default)]
    variables: JsonMap,
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
}

/// Create a workflow from a JSON definition file.
pub async fn create(ctx: &AppContext, file: &Path, activate: bool) -> Result<String> {
    let contents = std::fs::read_to_string(file)?;
    let definition: WorkflowFile = serde_json::from_str(&contents)?;

    let mut workflow = Workflow::new(definition.name);
    workflow.variables = definition.variables;
    workflow.nodes = definition.nodes;
    workflow.edges = definition.edges;
    if activate {
        workflow.activate();
    }
    workflow.validate()?;

    ctx.manager.workflows().create(&workflow).await?;

    println!("{}", "✓ Workflow created successfully".green().bold());
    println!("  ID: {}", workflow.id);
    println!("  Name: {}", workflow.name);
    println!("  Status: {}", workflow.status);
    println!("  Nodes: {}", workflow.nodes.len());
    Ok(workflow.id)
}

/// List stored workflows.
pub async fn list(ctx: &AppContext) -> Result<()> {
    let workflows = ctx.manager.workflows().list().await?;
    if workflows.is_empty() {
        println!("{}", "No workflows found".yellow());
        return Ok(());
    }

    println!("{:<38} {:<10} {:>4} {:>6}  {}", "ID", "Status", "Ver", "Nodes", "Name");
    for workflow in workflows {
        println!(
            "{:<38} {:<10} {:>4} {:>6}  {}",
            workflow.id,
            workflow.status,
            workflow.version,
            workflow.nodes.len(),
            workflow.name
        );
    }
    Ok(())
}

/// Show one workflow.
pub async fn show(ctx: &AppContext, id: &str) -> Result<()> {
    let workflow = ctx.manager.workflows().find_by_id(id).await?;

    println!("\n{}", "Workflow Details".bold().underline());
    println!("\n{}: {}", "ID".bold(), workflow.id);
    println!("{}: {}", "Name".bold(), workflow.name);
    println!("{}: {}", "Status".bold(), workflow.status);
    println!("{}: {}", "Version".bold(), workflow.version);
    if !workflow.variables.is_empty() {
        println!(
            "{}: {}",
            "Variables".bold(),
            serde_json::to_string(&workflow.variables)?
        );
    }

    println!("\n{}:", format!("Nodes ({})", workflow.nodes.len()).bold());
    for node in &workflow.nodes {
        println!("  {:<20} {:<14} {}", node.id, node.node_type, node.name);
    }

    println!("\n{}:", format!("Edges ({})", workflow.edges.len()).bold());
    for edge in &workflow.edges {
        let mut annotations = Vec::new();
        if let Some(handle) = &edge.source_handle {
            annotations.push(format!("handle={}", handle));
        }
        if let Some(condition) = &edge.condition {
            annotations.push(format!("if {}", condition));
        }
        if let Some(loop_config) = &edge.loop_config {
            annotations.push(format!("loop x{}", loop_config.max_iterations));
        }
        println!(
            "  {:<12} {} -> {}  {}",
            edge.id,
            edge.from_node,
            edge.to_node,
            annotations.join("  ")
        );
    }
    Ok(())
}

/// Publish a workflow so it can run.
pub async fn activate(ctx: &AppContext, id: &str) -> Result<()> {
    let mut workflow = ctx.manager.workflows().find_by_id(id).await?;
    workflow.validate()?;
    workflow.activate();
    ctx.manager.workflows().update(&workflow).await?;
    println!("{}", "✓ Workflow activated".green().bold());
    println!("  ID: {}", workflow.id);
    Ok(())
}

/// Retire a workflow; running executions are unaffected.
pub async fn archive(ctx: &AppContext, id: &str) -> Result<()> {
    let mut workflow = ctx.manager.workflows().find_by_id(id).await?;
    workflow.archive();
    ctx.manager.workflows().update(&workflow).await?;
    println!("{}", "✓ Workflow archived".green().bold());
    println!("  ID: {}", workflow.id);
    Ok(())
}

/// Parse an inline `--input` JSON object.
pub fn parse_input(input: Option<&str>) -> Result<JsonMap> {
    match input {
        None => Ok(JsonMap::new()),
        Some(raw) => {
            let value: Value = serde_json::from_str(raw)?;
            value
                .as_object()
                .cloned()
                .ok_or_else(|| MbflowError::Other("--input must be a JSON object".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_accepts_objects_only() {
        assert!(parse_input(None).unwrap().is_empty());
        let parsed = parse_input(Some(r#"{"x": 1}"#)).unwrap();
        assert_eq!(parsed["x"], serde_json::json!(1));

        assert!(parse_input(Some("[1, 2]")).is_err());
        assert!(parse_input(Some("not json")).is_err());
    }

    #[test]
    fn test_workflow_file_parsing() {
        let definition: WorkflowFile = serde_json::from_str(
            r#"{
                "name": "demo",
                "variables": {"env": "test"},
                "nodes": [
                    {"id": "a", "type": "passthrough", "name": "A"},
                    {"id": "b", "type": "http", "name": "B",
                     "config": {"url": "http://example.com", "method": "GET"}}
                ],
                "edges": [
                    {"id": "e1", "from_node": "a", "to_node": "b"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(definition.name, "demo");
        assert_eq!(definition.nodes.len(), 2);
        assert_eq!(definition.nodes[1].node_type, "http");
        assert_eq!(definition.edges[0].from_node, "a");
    }
}
