//! Execution commands: run, get, cancel, retry, logs, watch, list.

use crate::cli::AppContext;
use crate::error::Result;
use colored::Colorize;
use mbflow_core::{ExecutionStatus, JsonMap};
use tokio_stream::StreamExt;

/// Start an execution. Waits for the terminal state unless `detach` is
/// set; SIGINT/SIGTERM while waiting cancels it through the shutdown
/// coordinator.
pub async fn run(
    ctx: &AppContext,
    workflow_id: &str,
    input: JsonMap,
    detach: bool,
) -> Result<String> {
    let execution_id = ctx.manager.run(workflow_id, input).await?;
    println!("{}", "✓ Execution started".green());
    println!("  ID: {}", execution_id);

    if detach {
        return Ok(execution_id);
    }

    let execution = ctx.manager.wait(&execution_id).await?;
    match execution.status() {
        ExecutionStatus::Completed => {
            println!("{}", "✓ Execution completed".green().bold());
        }
        ExecutionStatus::Failed => {
            println!(
                "{}",
                format!(
                    "✗ Execution failed: {}",
                    execution.error.as_deref().unwrap_or("unknown error")
                )
                .red()
            );
        }
        ExecutionStatus::Cancelled => {
            println!("{}", "Execution cancelled".yellow());
        }
        _ => {}
    }
    println!(
        "{}: {}",
        "Output".bold(),
        serde_json::to_string_pretty(&execution.output)?
    );
    Ok(execution_id)
}

/// Show an execution with its node records.
pub async fn get(ctx: &AppContext, execution_id: &str) -> Result<()> {
    let (execution, node_executions) = ctx.manager.get(execution_id).await?;

    println!("\n{}", "Execution Details".bold().underline());
    println!("\n{}: {}", "ID".bold(), execution.id);
    println!("{}: {}", "Workflow".bold(), execution.workflow_id);
    println!("{}: {}", "Status".bold(), execution.status);
    println!("{}: {}ms", "Duration".bold(), execution.duration_ms);
    if let Some(error) = &execution.error {
        println!("{}: {}", "Error".bold(), error.red());
    }

    println!(
        "\n{}:",
        format!("Node executions ({})", node_executions.len()).bold()
    );
    for record in node_executions {
        println!(
            "  wave {:>2}  iter {:>2}  {:<10} {}  ({}ms)",
            record.wave, record.iteration, record.status, record.node_id, record.duration_ms
        );
    }
    Ok(())
}

/// Request cancellation of a running execution.
pub async fn cancel(ctx: &AppContext, execution_id: &str) -> Result<()> {
    ctx.manager.cancel(execution_id).await?;
    println!("{}", "✓ Cancellation requested".green());
    println!("  ID: {}", execution_id);
    Ok(())
}

/// Re-run the source workflow with the same input.
pub async fn retry(ctx: &AppContext, execution_id: &str) -> Result<()> {
    let new_id = ctx.manager.retry(execution_id).await?;
    println!("{}", "✓ Retry started".green().bold());
    println!("  ID: {}", new_id);
    Ok(())
}

/// One-shot event dump.
pub async fn logs(ctx: &AppContext, execution_id: &str, from_sequence: i64) -> Result<()> {
    let events = ctx.manager.logs(execution_id, from_sequence).await?;
    if events.is_empty() {
        println!("{}", "No events found".yellow());
        return Ok(());
    }
    for event in events {
        println!(
            "{:>4}  {}  {}  {}",
            event.sequence,
            event.timestamp.to_rfc3339(),
            event.event_type,
            serde_json::to_string(&event.payload)?
        );
    }
    Ok(())
}

/// Follow an execution's events until it reaches a terminal state or
/// shutdown is signalled.
pub async fn watch(ctx: &AppContext, execution_id: &str, from_sequence: i64) -> Result<()> {
    let mut stream = ctx.manager.watch(execution_id, from_sequence);
    loop {
        tokio::select! {
            event = stream.next() => {
                let Some(event) = event else {
                    break;
                };
                println!(
                    "{:>4}  {}  {}",
                    event.sequence,
                    event.event_type,
                    serde_json::to_string(&event.payload)?
                );
            }
            _ = ctx.shutdown.wait_for_shutdown() => {
                println!("{}", "Watch interrupted".yellow());
                break;
            }
        }
    }
    Ok(())
}

/// List executions, optionally filtered by workflow or status.
pub async fn list(
    ctx: &AppContext,
    workflow_id: Option<&str>,
    status: Option<&str>,
) -> Result<()> {
    let executions = match (workflow_id, status) {
        (Some(workflow_id), _) => ctx.manager.list_by_workflow(workflow_id).await?,
        (None, Some(status)) => ctx.manager.list_by_status(status).await?,
        (None, None) => {
            let mut all = Vec::new();
            for status in ["pending", "running", "completed", "failed", "cancelled"] {
                all.extend(ctx.manager.list_by_status(status).await?);
            }
            all.sort_by_key(|e| std::cmp::Reverse(e.created_at));
            all
        }
    };

    let executions = match status {
        Some(status) => executions
            .into_iter()
            .filter(|e| e.status == status)
            .collect(),
        None => executions,
    };

    if executions.is_empty() {
        println!("{}", "No executions found".yellow());
        return Ok(());
    }
    println!("{:<38} {:<10} {:<38} {:>8}", "ID", "Status", "Workflow", "ms");
    for execution in executions {
        println!(
            "{:<38} {:<10} {:<38} {:>8}",
            execution.id, execution.status, execution.workflow_id, execution.duration_ms
        );
    }
    Ok(())
}
