//! Working-copy materialization: clone when absent, refresh when present.

use scriptsync_core::SyncConfig;

use crate::error::{io_err, SyncError};
use crate::vcs::VersionControlClient;

/// How the working copy was made ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceState {
    /// The remote was cloned into a previously absent path.
    Cloned,
    /// An existing working copy was refreshed from the remote.
    Refreshed,
    /// Refreshing failed; the run continues on the existing local state.
    Stale { reason: String },
}

/// Make sure `config.local_repo_path` holds a working copy.
///
/// A failed refresh is downgraded to [`WorkspaceState::Stale`]; a failed clone
/// is fatal.
pub fn ensure_workspace(
    config: &SyncConfig,
    vcs: &dyn VersionControlClient,
) -> Result<WorkspaceState, SyncError> {
    let path = &config.local_repo_path;

    if path.exists() {
        tracing::info!("using existing workspace: {}", path.display());
        return match vcs.refresh(path, &config.branch) {
            Ok(()) => Ok(WorkspaceState::Refreshed),
            Err(e) => {
                tracing::warn!("could not pull latest changes: {e}");
                Ok(WorkspaceState::Stale {
                    reason: e.to_string(),
                })
            }
        };
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    tracing::info!("cloning repository to: {}", path.display());
    vcs.clone_repo(&config.repository_url, path)
        .map_err(|source| SyncError::WorkspaceUnavailable {
            path: path.clone(),
            source,
        })?;
    tracing::info!("repository cloned successfully");
    Ok(WorkspaceState::Cloned)
}
