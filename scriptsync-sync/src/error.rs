//! Error types for scriptsync-sync.

use std::path::PathBuf;

use thiserror::Error;

use crate::vcs::VcsError;

/// Fatal outcomes of a sync run. Each pipeline stage has its own variants so
/// callers can tell which step broke.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No working copy exists and cloning it failed.
    #[error("workspace unavailable at {path}: {source}")]
    WorkspaceUnavailable {
        path: PathBuf,
        #[source]
        source: VcsError,
    },

    /// The scripts root is missing on disk.
    #[error("scripts directory not found: {path}")]
    ScriptsDirectoryMissing { path: PathBuf },

    /// The identity cannot be used as a single directory name.
    #[error("identity '{identity}' is not a usable namespace directory name")]
    InvalidIdentity { identity: String },

    /// `status` could not be queried.
    #[error("failed to check workspace status: {0}")]
    StatusCheckFailed(#[source] VcsError),

    /// Staging the working tree failed.
    #[error("failed to stage changes: {0}")]
    StageFailed(#[source] VcsError),

    /// The commit step failed for a reason other than "nothing to commit".
    #[error("failed to commit changes: {0}")]
    CommitFailed(#[source] VcsError),

    /// Pushing to the remote failed; the local commit is kept.
    #[error("failed to push to branch '{branch}': {source}")]
    PushFailed {
        branch: String,
        #[source]
        source: VcsError,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
