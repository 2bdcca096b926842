//! MBFlow CLI - workflow orchestration engine
//!
//! Main entry point for the mbflow command-line tool.

use clap::{Parser, Subcommand};
use mbflow::cli::{execution, workflow, AppContext};
use mbflow::error::Result;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "mbflow")]
#[command(about = "MBFlow - workflow orchestration engine", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and database
    Init,

    /// Workflow management commands
    #[command(subcommand)]
    Workflow(WorkflowCommands),

    /// Start an execution of a workflow
    Run {
        /// Workflow ID
        workflow_id: String,
        /// Input mapping as inline JSON object
        #[arg(short, long)]
        input: Option<String>,
        /// Return immediately instead of waiting for the terminal state
        #[arg(short, long)]
        detach: bool,
    },

    /// Show an execution and its node records
    Get {
        /// Execution ID
        execution_id: String,
    },

    /// Cancel a running execution
    Cancel {
        /// Execution ID
        execution_id: String,
    },

    /// Re-run a workflow with the same input as a past execution
    Retry {
        /// Execution ID to retry
        execution_id: String,
    },

    /// Print an execution's event log
    Logs {
        /// Execution ID
        execution_id: String,
        /// Only events after this sequence number
        #[arg(short, long, default_value_t = 0)]
        from: i64,
    },

    /// Follow an execution's events until it completes
    Watch {
        /// Execution ID
        execution_id: String,
        /// Only events after this sequence number
        #[arg(short, long, default_value_t = 0)]
        from: i64,
    },

    /// List executions
    Executions {
        /// Filter by workflow ID
        #[arg(short, long)]
        workflow: Option<String>,
        /// Filter by status: pending, running, completed, failed, cancelled
        #[arg(short, long)]
        status: Option<String>,
    },
}

#[derive(Subcommand)]
enum WorkflowCommands {
    /// Create a workflow from a JSON definition file
    Create {
        /// Path to the definition file
        file: PathBuf,
        /// Activate the workflow immediately
        #[arg(short, long)]
        activate: bool,
    },
    /// List workflows
    List,
    /// Show a workflow definition
    Show {
        /// Workflow ID
        id: String,
    },
    /// Activate a workflow
    Activate {
        /// Workflow ID
        id: String,
    },
    /// Archive a workflow
    Archive {
        /// Workflow ID
        id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    if let Commands::Init = cli.command {
        mbflow::init::initialize().await?;
        println!("✓ mbflow initialized");
        println!(
            "  Configuration: {}",
            mbflow::init::get_user_config_path()?.display()
        );
        println!(
            "  Database: {}",
            mbflow::init::get_database_path()?.display()
        );
        return Ok(());
    }

    let ctx = AppContext::build().await?;
    // SIGINT/SIGTERM cancel every running execution through the manager,
    // so long-lived commands (run, watch) wind down gracefully.
    let _signal_handler = ctx.shutdown.install_signal_handlers();
    let result = handle(&ctx, cli.command).await;
    ctx.close().await;
    result
}

async fn handle(ctx: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Init => unreachable!("handled before context construction"),
        Commands::Workflow(command) => match command {
            WorkflowCommands::Create { file, activate } => {
                workflow::create(ctx, &file, activate).await?;
                Ok(())
            }
            WorkflowCommands::List => workflow::list(ctx).await,
            WorkflowCommands::Show { id } => workflow::show(ctx, &id).await,
            WorkflowCommands::Activate { id } => workflow::activate(ctx, &id).await,
            WorkflowCommands::Archive { id } => workflow::archive(ctx, &id).await,
        },
        Commands::Run {
            workflow_id,
            input,
            detach,
        } => {
            let input = workflow::parse_input(input.as_deref())?;
            execution::run(ctx, &workflow_id, input, detach).await?;
            Ok(())
        }
        Commands::Get { execution_id } => execution::get(ctx, &execution_id).await,
        Commands::Cancel { execution_id } => execution::cancel(ctx, &execution_id).await,
        Commands::Retry { execution_id } => execution::retry(ctx, &execution_id).await,
        Commands::Logs {
            execution_id,
            from,
        } => execution::logs(ctx, &execution_id, from).await,
        Commands::Watch {
            execution_id,
            from,
        } => execution::watch(ctx, &execution_id, from).await,
        Commands::Executions { workflow, status } => {
            execution::list(ctx, workflow.as_deref(), status.as_deref()).await
        }
    }
}
