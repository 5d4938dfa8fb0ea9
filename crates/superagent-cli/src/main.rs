//! Thin headless binary entrypoint (spec §1 explicit non-goal: "CLI
//! framing, terminal rendering, prompt parsing, wizard flows" are
//! external collaborators, not part of the execution core). This binary
//! exists only to make the core runnable end to end: load a
//! [`superagent::RuntimeConfig`], assemble the [`superagent::Runtime`],
//! run one goal through the orchestrator, and stream the stable headless
//! NDJSON protocol (spec §6) to stdout while human-readable logs go to
//! stderr -- matching the teacher's `cli` crate's split of "protocol
//! output on stdout, diagnostics on stderr".

mod cli_args;

use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use superagent::agents::GoalStatus;
use superagent::types::SessionId;
use superagent::{Runtime, RuntimeConfig};

use cli_args::CliArgs;

/// Mirrors the teacher's `tracing`-based `setup_logging`, minus the
/// OpenTelemetry export pipeline this thin binary has no use for:
/// `RUST_LOG`-controlled filtering to stderr so stdout stays pure NDJSON.
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

async fn read_goal_from_stdin() -> anyhow::Result<String> {
    let mut buf = String::new();
    tokio::io::stdin().read_to_string(&mut buf).await?;
    let goal = buf.trim().to_string();
    if goal.is_empty() {
        anyhow::bail!("no goal provided on the command line or stdin");
    }
    Ok(goal)
}

fn load_config(args: &CliArgs) -> anyhow::Result<RuntimeConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("reading config {}: {e}", path.display()))?;
            RuntimeConfig::from_toml(&content).map_err(|e| anyhow::anyhow!("parsing config {}: {e}", path.display()))?
        }
        // `RuntimeConfig`'s derived `Default` leaves `model` empty since
        // field-level `#[serde(default = "...")]` only fires through
        // deserialization; route the no-config case through the same
        // empty-document parse the config-file path would take so both
        // get the same `default_model()` fallback.
        None => RuntimeConfig::from_toml("")?,
    };
    if let Some(worktree) = &args.worktree {
        config.executor.worktree = worktree.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();
    let args = CliArgs::parse();

    let goal = match args.goal.clone() {
        Some(goal) => goal,
        None => match read_goal_from_stdin().await {
            Ok(goal) => goal,
            Err(err) => {
                eprintln!("error.user: {err}");
                return ExitCode::from(2);
            }
        },
    };

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error.system: {err}");
            return ExitCode::from(2);
        }
    };

    let runtime = match Runtime::new(config) {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error.system: failed to assemble runtime: {err}");
            return ExitCode::from(2);
        }
    };

    let session_id = args.session.clone().map(SessionId::new).unwrap_or_else(SessionId::generate);
    let context_files = if args.context_files.is_empty() { None } else { Some(args.context_files.clone()) };

    let writer = runtime.spawn_ndjson_writer(tokio::io::stdout());
    let outcome = runtime.orchestrator.execute_goal(&goal, session_id, None, context_files).await;

    // `spawn_ndjson_writer` only returns once every clone of the bus's
    // broadcast sender is dropped; the agents subscribed to it are held
    // alive by the bus's own subscriber table for the runtime's whole
    // lifetime, so that never happens naturally in a one-shot binary.
    // Give the writer a brief grace period to drain events already
    // published for this goal, then stop it explicitly.
    tokio::time::sleep(Duration::from_millis(50)).await;
    writer.abort();
    let _ = writer.await;
    let _ = std::io::stdout().flush();

    match outcome.status {
        GoalStatus::Completed => ExitCode::SUCCESS,
        GoalStatus::Failed => {
            if let Some(error) = &outcome.error {
                tracing::error!(%error, "goal failed");
            }
            ExitCode::FAILURE
        }
        GoalStatus::Timeout => {
            tracing::error!("goal timed out");
            ExitCode::from(124)
        }
        GoalStatus::Cancelled => {
            tracing::error!("goal cancelled");
            ExitCode::from(130)
        }
    }
}
