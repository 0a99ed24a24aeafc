//! # scriptsync-sync
//!
//! The synchronization pipeline: workspace materialization, mirrored copy
//! with suffix exclusion, and commit/publish through a
//! [`VersionControlClient`].
//!
//! Call [`pipeline::run`] for a full sync, or [`preview::preview`] and
//! [`diff::diff_app_folders`] to inspect pending changes without writing.

pub mod diff;
pub mod error;
pub mod filter;
#[cfg(test)]
pub(crate) mod memory_vcs;
pub mod mirror;
pub mod pipeline;
pub mod preview;
pub mod publish;
pub mod vcs;
pub mod workspace;

pub use diff::{diff_app_folders, FileDiff};
pub use error::SyncError;
pub use filter::should_exclude;
pub use mirror::{mirror_scripts, MirrorReport};
pub use pipeline::{SyncOutcome, SyncReport, SyncRequest, SyncWarning};
pub use preview::{preview, PreviewReport};
pub use publish::{publish_changes, PublishOutcome};
pub use vcs::{CommitOutcome, GitCli, VcsError, VersionControlClient};
pub use workspace::{ensure_workspace, WorkspaceState};
