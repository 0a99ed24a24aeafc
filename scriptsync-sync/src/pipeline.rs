//! Sync orchestrator shared by `scriptsync sync` and any scheduler wrapper.
//!
//! ```text
//! Start → WorkspaceReady → Mirrored → Published | NoChanges
//!                                   ↘ NothingToSync (zero files copied)
//! ```
//!
//! Each stage either succeeds (possibly with warnings) or ends the run with a
//! [`SyncError`]. There are no retries at this layer.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Local, TimeZone};

use scriptsync_core::{AppFolderName, Identity, SyncConfig};

use crate::error::SyncError;
use crate::mirror::{mirror_scripts, namespace_path, MirrorReport};
use crate::publish::{publish_changes, PublishOutcome};
use crate::vcs::VersionControlClient;
use crate::workspace::{ensure_workspace, WorkspaceState};

/// Inputs of one sync run.
#[derive(Debug, Clone, Copy)]
pub struct SyncRequest<'a> {
    pub config: &'a SyncConfig,
    pub scripts_root: &'a Path,
    pub identity: &'a Identity,
}

/// Checkpoints of a run, used in log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    WorkspaceReady,
    Mirrored,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Start => write!(f, "start"),
            Stage::WorkspaceReady => write!(f, "workspace-ready"),
            Stage::Mirrored => write!(f, "mirrored"),
        }
    }
}

/// Successful end state of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Changes were committed (or earlier commits pushed) to the remote.
    Published { commit_message: Option<String> },
    /// The workspace already matched the remote.
    NoChanges,
    /// The mirror produced no files; publishing was skipped.
    NothingToSync,
}

/// Non-fatal problem recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncWarning {
    RefreshFailed { reason: String },
    AppFolderSkipped { name: AppFolderName, reason: String },
}

impl fmt::Display for SyncWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncWarning::RefreshFailed { reason } => {
                write!(f, "could not pull latest changes: {reason}")
            }
            SyncWarning::AppFolderSkipped { name, reason } => {
                write!(f, "skipped app folder '{name}': {reason}")
            }
        }
    }
}

/// Everything a caller needs to report on a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub workspace: WorkspaceState,
    pub mirror: MirrorReport,
    pub outcome: SyncOutcome,
    pub warnings: Vec<SyncWarning>,
}

/// Run the pipeline, stamping any commit with the local time.
pub fn run(
    request: SyncRequest<'_>,
    vcs: &dyn VersionControlClient,
) -> Result<SyncReport, SyncError> {
    run_at(request, vcs, &Local::now())
}

/// Run the pipeline with an explicit commit timestamp.
pub fn run_at<Tz>(
    request: SyncRequest<'_>,
    vcs: &dyn VersionControlClient,
    now: &DateTime<Tz>,
) -> Result<SyncReport, SyncError>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let SyncRequest {
        config,
        scripts_root,
        identity,
    } = request;
    tracing::debug!("stage: {}", Stage::Start);

    if !scripts_root.is_dir() {
        return Err(SyncError::ScriptsDirectoryMissing {
            path: scripts_root.to_path_buf(),
        });
    }
    namespace_path(&config.local_repo_path, identity)?;

    let mut warnings = Vec::new();

    let workspace = ensure_workspace(config, vcs)?;
    if let WorkspaceState::Stale { reason } = &workspace {
        warnings.push(SyncWarning::RefreshFailed {
            reason: reason.clone(),
        });
    }
    tracing::debug!("stage: {}", Stage::WorkspaceReady);

    let mirror = mirror_scripts(
        scripts_root,
        &config.local_repo_path,
        identity,
        &config.excluded_suffixes,
    )?;
    warnings.extend(mirror.skipped.iter().map(|s| SyncWarning::AppFolderSkipped {
        name: s.name.clone(),
        reason: s.reason.clone(),
    }));
    tracing::debug!("stage: {}", Stage::Mirrored);

    if mirror.is_empty() {
        tracing::info!("no scripts to sync");
        return Ok(SyncReport {
            workspace,
            mirror,
            outcome: SyncOutcome::NothingToSync,
            warnings,
        });
    }

    let outcome = match publish_changes(
        vcs,
        &config.local_repo_path,
        identity,
        &config.branch,
        now,
    )? {
        PublishOutcome::Published { commit_message, .. } => {
            SyncOutcome::Published { commit_message }
        }
        PublishOutcome::NoChanges => SyncOutcome::NoChanges,
    };

    Ok(SyncReport {
        workspace,
        mirror,
        outcome,
        warnings,
    })
}
