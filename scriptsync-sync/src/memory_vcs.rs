//! In-memory [`VersionControlClient`] that simulates one remote and one
//! working copy without running any external process.
//!
//! The remote and the last local commit are kept as file trees in memory;
//! the working copy itself is a real directory so the mirror copier can
//! write into it. Every call is recorded and any operation can be made to
//! fail on demand.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::vcs::{CommitOutcome, VcsError, VersionControlClient};

/// File tree keyed by path relative to the repository root.
pub type Tree = BTreeMap<PathBuf, Vec<u8>>;

/// Operations of [`VersionControlClient`], for call recording and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Version,
    Refresh,
    Clone,
    Status,
    Stage,
    Commit,
    Push,
    Unpublished,
}

#[derive(Debug, Default)]
struct State {
    remote: Tree,
    head: Tree,
    staged: Option<Tree>,
    unpublished: usize,
    calls: Vec<Op>,
    failures: HashSet<Op>,
    nothing_to_commit: bool,
    messages: Vec<String>,
    pushed: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MemoryVcs {
    state: RefCell<State>,
}

impl MemoryVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the remote with `files` before the first clone.
    pub fn with_remote_files<I, P, C>(self, files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<PathBuf>,
        C: Into<Vec<u8>>,
    {
        {
            let mut state = self.state.borrow_mut();
            for (path, content) in files {
                state.remote.insert(path.into(), content.into());
            }
        }
        self
    }

    /// Make every later call of `op` fail.
    pub fn fail_on(&self, op: Op) {
        self.state.borrow_mut().failures.insert(op);
    }

    pub fn clear_failures(&self) {
        self.state.borrow_mut().failures.clear();
    }

    /// Make `commit` answer "nothing to commit" regardless of the index.
    pub fn report_nothing_to_commit(&self, enabled: bool) {
        self.state.borrow_mut().nothing_to_commit = enabled;
    }

    pub fn calls(&self) -> Vec<Op> {
        self.state.borrow().calls.clone()
    }

    pub fn was_called(&self, op: Op) -> bool {
        self.state.borrow().calls.contains(&op)
    }

    pub fn commit_messages(&self) -> Vec<String> {
        self.state.borrow().messages.clone()
    }

    /// Branches named by successful pushes, in call order.
    pub fn pushed_branches(&self) -> Vec<String> {
        self.state.borrow().pushed.clone()
    }

    pub fn remote_files(&self) -> Tree {
        self.state.borrow().remote.clone()
    }

    fn enter(&self, op: Op) -> Result<(), VcsError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(op);
        if state.failures.contains(&op) {
            return Err(VcsError::Failed {
                command: format!("memory {op:?}"),
                status: "exit status: 1".into(),
                stderr: "injected failure".into(),
            });
        }
        Ok(())
    }
}

fn failed(op: &str, e: impl std::fmt::Display) -> VcsError {
    VcsError::Failed {
        command: format!("memory {op}"),
        status: "exit status: 128".into(),
        stderr: e.to_string(),
    }
}

/// Current files of the working copy, excluding `.git`.
fn snapshot(repo: &Path) -> Result<Tree, VcsError> {
    let mut tree = Tree::new();
    let walker = WalkDir::new(repo)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");
    for entry in walker {
        let entry = entry.map_err(|e| failed("snapshot", e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(repo)
            .map_err(|e| failed("snapshot", e))?
            .to_path_buf();
        let content = std::fs::read(entry.path()).map_err(|e| failed("snapshot", e))?;
        tree.insert(relative, content);
    }
    Ok(tree)
}

fn write_tree(repo: &Path, tree: &Tree) -> Result<(), VcsError> {
    for (relative, content) in tree {
        let path = repo.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| failed("checkout", e))?;
        }
        std::fs::write(&path, content).map_err(|e| failed("checkout", e))?;
    }
    Ok(())
}

impl VersionControlClient for MemoryVcs {
    fn version(&self) -> Result<String, VcsError> {
        self.enter(Op::Version)?;
        Ok("memory".into())
    }

    fn refresh(&self, repo: &Path, _branch: &str) -> Result<(), VcsError> {
        self.enter(Op::Refresh)?;
        if !repo.join(".git").is_dir() {
            return Err(failed("pull", "not a git repository"));
        }
        let mut state = self.state.borrow_mut();
        if state.unpublished > 0 || state.remote == state.head {
            return Ok(());
        }
        for stale in state.head.keys().filter(|p| !state.remote.contains_key(*p)) {
            let _ = std::fs::remove_file(repo.join(stale));
        }
        write_tree(repo, &state.remote)?;
        state.head = state.remote.clone();
        Ok(())
    }

    fn clone_repo(&self, _url: &str, dest: &Path) -> Result<(), VcsError> {
        self.enter(Op::Clone)?;
        if dest.exists() {
            return Err(failed("clone", "destination path already exists"));
        }
        std::fs::create_dir_all(dest.join(".git")).map_err(|e| failed("clone", e))?;
        let mut state = self.state.borrow_mut();
        write_tree(dest, &state.remote)?;
        state.head = state.remote.clone();
        state.unpublished = 0;
        Ok(())
    }

    fn status(&self, repo: &Path) -> Result<Vec<String>, VcsError> {
        self.enter(Op::Status)?;
        let current = snapshot(repo)?;
        let state = self.state.borrow();
        let paths: BTreeSet<&PathBuf> = current.keys().chain(state.head.keys()).collect();
        let mut lines = Vec::new();
        for path in paths {
            let code = match (state.head.get(path), current.get(path)) {
                (None, Some(_)) => "??",
                (Some(_), None) => " D",
                (Some(old), Some(new)) if old != new => " M",
                _ => continue,
            };
            lines.push(format!("{code} {}", path.display()));
        }
        Ok(lines)
    }

    fn stage_all(&self, repo: &Path) -> Result<(), VcsError> {
        self.enter(Op::Stage)?;
        let current = snapshot(repo)?;
        self.state.borrow_mut().staged = Some(current);
        Ok(())
    }

    fn commit(&self, _repo: &Path, message: &str) -> Result<CommitOutcome, VcsError> {
        self.enter(Op::Commit)?;
        let mut state = self.state.borrow_mut();
        let staged = state.staged.take();
        match staged {
            Some(tree) if !state.nothing_to_commit && tree != state.head => {
                state.head = tree;
                state.unpublished += 1;
                state.messages.push(message.to_owned());
                Ok(CommitOutcome::Committed)
            }
            _ => Ok(CommitOutcome::NothingToCommit),
        }
    }

    fn push(&self, _repo: &Path, branch: &str) -> Result<(), VcsError> {
        self.enter(Op::Push)?;
        let mut state = self.state.borrow_mut();
        state.remote = state.head.clone();
        state.unpublished = 0;
        state.pushed.push(branch.to_owned());
        Ok(())
    }

    fn unpublished_commits(&self, _repo: &Path, _branch: &str) -> Result<usize, VcsError> {
        self.enter(Op::Unpublished)?;
        Ok(self.state.borrow().unpublished)
    }
}
