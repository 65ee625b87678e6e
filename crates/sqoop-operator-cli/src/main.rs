//! sqoop-operator CLI - run Sqoop import/export jobs from YAML job files.

use clap::{Parser, Subcommand};
use sqoop_operator::{Config, DryRunHook, OperatorError, TransferOperator};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "sqoop-operator")]
#[command(about = "Run Sqoop import/export jobs with validated configuration")]
#[command(version)]
struct Cli {
    /// Path to YAML job file
    #[arg(short, long, default_value = "job.yaml")]
    config: PathBuf,

    /// Task id used in logs and results
    #[arg(long, default_value = "sqoop_job")]
    task_id: String,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the transfer job
    Run {
        /// Dry run: validate and log the command without executing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Check the task configuration without contacting anything
    Validate,

    /// Print the command line that would be executed (secrets masked)
    Render,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), OperatorError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let config = Config::load(&cli.config)?;
    info!("Loaded job file {:?}", cli.config);

    match cli.command {
        Commands::Validate => {
            config.task.validate()?;
            if cli.output_json {
                let report = serde_json::json!({
                    "valid": true,
                    "cmd_type": config.task.cmd_type,
                });
                println!("{}", report);
            } else {
                println!("Configuration is valid ({})", config.task.cmd_type);
            }
        }

        Commands::Render => {
            let operator = TransferOperator::from_config(cli.task_id, config);
            let invocation = operator.render()?;
            if cli.output_json {
                println!("{}", serde_json::json!({ "command": invocation.masked() }));
            } else {
                println!("{}", invocation.masked());
            }
        }

        Commands::Run { dry_run } => {
            let mut operator = TransferOperator::from_config(cli.task_id, config);
            if dry_run {
                operator = operator.with_hook(Arc::new(DryRunHook::new()));
            }

            let cancel_token = setup_signal_handler();
            let result = operator.execute(cancel_token).await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                let status_msg = if dry_run {
                    "Dry run completed!"
                } else {
                    "Transfer completed!"
                };
                println!("\n{}", status_msg);
                println!("  Run ID: {}", result.run_id);
                println!("  Task: {} ({})", result.task_id, result.mode);
                println!("  Duration: {:.2}s", result.duration_seconds);
                println!("  Command: {}", result.command);
            }
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Setup signal handlers for task cancellation.
/// Handles both SIGINT (Ctrl-C) and SIGTERM (orchestrator shutdown).
/// Returns a CancellationToken that will be cancelled when a signal is received.
#[cfg(unix)]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    for (kind, name) in [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
    ] {
        let token = cancel_token.clone();
        match signal(kind) {
            Ok(mut stream) => {
                tokio::spawn(async move {
                    if stream.recv().await.is_some() {
                        eprintln!("\nReceived {}. Stopping transfer...", name);
                        token.cancel();
                    }
                });
            }
            Err(e) => warn!("Failed to install {} handler: {}", name, e),
        }
    }

    cancel_token
}

/// Setup signal handler for Windows (only Ctrl-C)
#[cfg(not(unix))]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                eprintln!("\nReceived Ctrl-C. Stopping transfer...");
                token.cancel();
            }
            Err(e) => warn!("Failed to install Ctrl-C handler: {}", e),
        }
    });

    cancel_token
}
