//! Change publisher: status → stage → commit → push.

use std::path::Path;

use chrono::{DateTime, TimeZone};

use scriptsync_core::Identity;

use crate::error::SyncError;
use crate::vcs::{CommitOutcome, VersionControlClient};

/// Result of [`publish_changes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Changes reached the remote.
    Published {
        /// Message of the new commit; `None` when only earlier unpushed
        /// commits were sent.
        commit_message: Option<String>,
        /// Entries reported by the status query.
        changed_paths: usize,
    },
    /// The working copy already matched the published state.
    NoChanges,
}

/// `Auto-sync scripts from <identity> at <YYYY-MM-DD HH:MM:SS>`.
pub fn commit_message<Tz>(identity: &Identity, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "Auto-sync scripts from {identity} at {}",
        at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Commit and push whatever the working copy at `workspace` holds.
///
/// A push failure leaves the new commit in place; the next run finds a clean
/// status with unpublished commits and pushes them.
pub fn publish_changes<Tz>(
    vcs: &dyn VersionControlClient,
    workspace: &Path,
    identity: &Identity,
    branch: &str,
    now: &DateTime<Tz>,
) -> Result<PublishOutcome, SyncError>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let changes = vcs.status(workspace).map_err(SyncError::StatusCheckFailed)?;

    if changes.is_empty() {
        let backlog = match vcs.unpublished_commits(workspace, branch) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!("could not count unpublished commits: {e}");
                0
            }
        };
        if backlog == 0 {
            tracing::info!("no changes to commit");
            return Ok(PublishOutcome::NoChanges);
        }
        tracing::info!("pushing {backlog} unpublished commit(s)");
        push(vcs, workspace, branch)?;
        return Ok(PublishOutcome::Published {
            commit_message: None,
            changed_paths: 0,
        });
    }

    tracing::info!("{} change(s) detected, committing", changes.len());
    vcs.stage_all(workspace).map_err(SyncError::StageFailed)?;

    let message = commit_message(identity, now);
    match vcs
        .commit(workspace, &message)
        .map_err(SyncError::CommitFailed)?
    {
        CommitOutcome::Committed => tracing::info!("changes committed"),
        CommitOutcome::NothingToCommit => {
            tracing::info!("nothing staged after add; treating as no changes");
            return Ok(PublishOutcome::NoChanges);
        }
    }

    push(vcs, workspace, branch)?;
    Ok(PublishOutcome::Published {
        commit_message: Some(message),
        changed_paths: changes.len(),
    })
}

fn push(vcs: &dyn VersionControlClient, workspace: &Path, branch: &str) -> Result<(), SyncError> {
    vcs.push(workspace, branch)
        .map_err(|source| SyncError::PushFailed {
            branch: branch.to_owned(),
            source,
        })?;
    tracing::info!("changes pushed to remote branch '{branch}'");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone, Utc};
    use tempfile::TempDir;

    use crate::memory_vcs::{MemoryVcs, Op};

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    fn cloned(vcs: &MemoryVcs) -> TempDir {
        let dir = TempDir::new().unwrap();
        let repo = dir.path().join("repo");
        vcs.clone_repo("mem://scripts", &repo).unwrap();
        dir
    }

    #[test]
    fn message_embeds_identity_and_second_precision_time() {
        assert_eq!(
            commit_message(&Identity::from("alice"), &at()),
            "Auto-sync scripts from alice at 2024-03-09 14:05:07"
        );
        let east = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(
            commit_message(&Identity::from("bob"), &at().with_timezone(&east)),
            "Auto-sync scripts from bob at 2024-03-09 16:05:07"
        );
    }

    #[test]
    fn clean_workspace_is_a_no_op() {
        let vcs = MemoryVcs::new();
        let dir = cloned(&vcs);
        let repo = dir.path().join("repo");

        let outcome =
            publish_changes(&vcs, &repo, &Identity::from("alice"), "main", &at()).unwrap();

        assert_eq!(outcome, PublishOutcome::NoChanges);
        assert!(!vcs.was_called(Op::Stage));
        assert!(!vcs.was_called(Op::Commit));
        assert!(!vcs.was_called(Op::Push));
    }

    #[test]
    fn changes_are_staged_committed_and_pushed() {
        let vcs = MemoryVcs::new();
        let dir = cloned(&vcs);
        let repo = dir.path().join("repo");
        std::fs::create_dir_all(repo.join("alice/backup")).unwrap();
        std::fs::write(repo.join("alice/backup/run.sh"), "run\n").unwrap();

        let outcome =
            publish_changes(&vcs, &repo, &Identity::from("alice"), "main", &at()).unwrap();

        assert_eq!(
            outcome,
            PublishOutcome::Published {
                commit_message: Some("Auto-sync scripts from alice at 2024-03-09 14:05:07".into()),
                changed_paths: 1,
            }
        );
        assert_eq!(vcs.pushed_branches(), vec!["main".to_string()]);
        assert!(vcs.remote_files().contains_key(std::path::Path::new("alice/backup/run.sh")));
    }

    #[test]
    fn status_failure_is_fatal() {
        let vcs = MemoryVcs::new();
        let dir = cloned(&vcs);
        vcs.fail_on(Op::Status);

        let err = publish_changes(&vcs, &dir.path().join("repo"), &Identity::unknown(), "main", &at())
            .unwrap_err();
        assert!(matches!(err, SyncError::StatusCheckFailed(_)), "got: {err}");
    }

    #[test]
    fn stage_and_commit_failures_map_to_distinct_errors() {
        let vcs = MemoryVcs::new();
        let dir = cloned(&vcs);
        let repo = dir.path().join("repo");
        std::fs::write(repo.join("new.sh"), "x\n").unwrap();

        vcs.fail_on(Op::Stage);
        let err = publish_changes(&vcs, &repo, &Identity::unknown(), "main", &at()).unwrap_err();
        assert!(matches!(err, SyncError::StageFailed(_)), "got: {err}");

        vcs.clear_failures();
        vcs.fail_on(Op::Commit);
        let err = publish_changes(&vcs, &repo, &Identity::unknown(), "main", &at()).unwrap_err();
        assert!(matches!(err, SyncError::CommitFailed(_)), "got: {err}");
    }

    #[test]
    fn push_failure_keeps_commit_and_next_run_pushes_it() {
        let vcs = MemoryVcs::new();
        let dir = cloned(&vcs);
        let repo = dir.path().join("repo");
        std::fs::write(repo.join("new.sh"), "x\n").unwrap();

        vcs.fail_on(Op::Push);
        let err = publish_changes(&vcs, &repo, &Identity::unknown(), "main", &at()).unwrap_err();
        assert!(matches!(err, SyncError::PushFailed { .. }), "got: {err}");
        assert_eq!(vcs.commit_messages().len(), 1);
        assert!(vcs.remote_files().is_empty());

        vcs.clear_failures();
        let outcome = publish_changes(&vcs, &repo, &Identity::unknown(), "main", &at()).unwrap();
        assert_eq!(
            outcome,
            PublishOutcome::Published {
                commit_message: None,
                changed_paths: 0,
            }
        );
        assert_eq!(vcs.commit_messages().len(), 1, "no second commit");
        assert!(vcs.remote_files().contains_key(std::path::Path::new("new.sh")));
    }

    #[test]
    fn nothing_to_commit_after_stage_is_no_changes() {
        let vcs = MemoryVcs::new();
        let dir = cloned(&vcs);
        let repo = dir.path().join("repo");
        std::fs::write(repo.join("new.sh"), "x\n").unwrap();
        vcs.report_nothing_to_commit(true);

        let outcome = publish_changes(&vcs, &repo, &Identity::unknown(), "main", &at()).unwrap();
        assert_eq!(outcome, PublishOutcome::NoChanges);
        assert!(!vcs.was_called(Op::Push));
    }

    #[test]
    fn unpublished_count_failure_is_only_a_warning() {
        let vcs = MemoryVcs::new();
        let dir = cloned(&vcs);
        vcs.fail_on(Op::Unpublished);

        let outcome =
            publish_changes(&vcs, &dir.path().join("repo"), &Identity::unknown(), "main", &at())
                .unwrap();
        assert_eq!(outcome, PublishOutcome::NoChanges);
    }
}
