//! scriptsync: mirror per-app script folders into a shared git repository.
//!
//! # Usage
//!
//! ```text
//! scriptsync init [--force]
//! scriptsync sync [--dry-run] [--identity <name>] [--scripts-dir <dir>]
//! scriptsync status [--json]
//! scriptsync diff [app]
//! ```
//!
//! Every command reads `git_config.yaml` from the current directory unless
//! `--config` points elsewhere.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Error;
use clap::{ArgAction, Parser, Subcommand};

use commands::{diff::DiffArgs, init::InitArgs, status::StatusArgs, sync::SyncArgs};
use scriptsync_core::{config::DEFAULT_CONFIG_FILE, ConfigError};
use scriptsync_sync::{SyncError, VcsError};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "scriptsync",
    version,
    about = "Publish local app script folders to a shared git repository",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML config file.
    #[arg(long, short = 'c', global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// More log output (repeat for trace).
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a sample config file.
    Init(InitArgs),

    /// Mirror the scripts root into the repository and publish the result.
    Sync(SyncArgs),

    /// Show per-app-folder changes a sync would publish.
    Status(StatusArgs),

    /// Show unified diffs of what a sync would write.
    Diff(DiffArgs),
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

const EXIT_FAILURE: u8 = 1;
const EXIT_CONFIG: u8 = 2;
const EXIT_WORKSPACE_UNAVAILABLE: u8 = 3;
const EXIT_SCRIPTS_MISSING: u8 = 4;
const EXIT_STATUS_FAILED: u8 = 5;
const EXIT_STAGE_FAILED: u8 = 6;
const EXIT_COMMIT_FAILED: u8 = 7;
const EXIT_PUSH_FAILED: u8 = 8;
const EXIT_GIT_MISSING: u8 = 9;

/// Pick the process exit code for a failed command.
///
/// Pipeline and config errors are matched first; a bare `VcsError::Spawn`
/// only surfaces from the git presence check.
fn exit_code(err: &Error) -> u8 {
    for cause in err.chain() {
        if let Some(sync) = cause.downcast_ref::<SyncError>() {
            return match sync {
                SyncError::WorkspaceUnavailable { .. } => EXIT_WORKSPACE_UNAVAILABLE,
                SyncError::ScriptsDirectoryMissing { .. } => EXIT_SCRIPTS_MISSING,
                SyncError::InvalidIdentity { .. } => EXIT_CONFIG,
                SyncError::StatusCheckFailed(_) => EXIT_STATUS_FAILED,
                SyncError::StageFailed(_) => EXIT_STAGE_FAILED,
                SyncError::CommitFailed(_) => EXIT_COMMIT_FAILED,
                SyncError::PushFailed { .. } => EXIT_PUSH_FAILED,
                SyncError::Io { .. } => EXIT_FAILURE,
            };
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return EXIT_CONFIG;
        }
        if let Some(VcsError::Spawn { .. }) = cause.downcast_ref::<VcsError>() {
            return EXIT_GIT_MISSING;
        }
    }
    EXIT_FAILURE
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Init(args) => args.run(&cli.config),
        Commands::Sync(args) => args.run(&cli.config),
        Commands::Status(args) => args.run(&cli.config),
        Commands::Diff(args) => args.run(&cli.config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}
