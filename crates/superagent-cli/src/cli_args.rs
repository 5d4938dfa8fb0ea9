//! Argument surface for the headless binary (spec §1 non-goal: interactive
//! CLI framing lives outside the execution core; this is just enough to
//! drive one goal through a [`superagent::Runtime`] from a script or CI
//! job). Grounded on the teacher's `cli/src/cli_args.rs` derive-based
//! `clap::Parser`, trimmed to the handful of flags the headless protocol
//! actually needs.

use clap::Parser;

/// Run a single goal through the SuperAgent execution core, emitting the
/// headless NDJSON event stream (spec §6) to stdout.
#[derive(Parser, Debug)]
#[command(name = "superagent", about = "Headless SuperAgent execution core")]
pub struct CliArgs {
    /// The goal text to execute. Read from stdin if omitted.
    pub goal: Option<String>,

    /// Path to a TOML runtime configuration document (spec §6
    /// "Configuration surface"). Defaults to an empty configuration with
    /// no providers registered.
    #[arg(short, long)]
    pub config: Option<std::path::PathBuf>,

    /// Resume (or label) a specific session id rather than generating a
    /// fresh one.
    #[arg(long)]
    pub session: Option<String>,

    /// A file to fuse into the goal's context (spec §4.6 `process_input`
    /// "context_files"). Repeatable.
    #[arg(long = "context-file")]
    pub context_files: Vec<String>,

    /// Working directory the transactional executor snapshots and
    /// restores (overrides the config's `[executor] worktree`).
    #[arg(long)]
    pub worktree: Option<std::path::PathBuf>,
}
