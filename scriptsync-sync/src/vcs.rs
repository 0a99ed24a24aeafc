//! Version-control boundary.
//!
//! The pipeline only talks to [`VersionControlClient`]. [`GitCli`] implements
//! it by running the `git` executable; tests substitute an in-memory double.

use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::Command;

use thiserror::Error;

/// Failure of a single version-control operation.
#[derive(Debug, Error)]
pub enum VcsError {
    /// The executable could not be started at all (usually: not installed).
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited unsuccessfully.
    #[error("`{command}` failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    /// The command succeeded but its output could not be interpreted.
    #[error("unexpected output from `{command}`: {output}")]
    UnexpectedOutput { command: String, output: String },
}

/// Result of a commit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// The tool reported that the index held nothing to record.
    NothingToCommit,
}

/// The version-control operations the sync pipeline needs.
pub trait VersionControlClient {
    /// Report the tool version; doubles as a presence check.
    fn version(&self) -> Result<String, VcsError>;

    /// Pull `branch` from the default remote into an existing working copy.
    fn refresh(&self, repo: &Path, branch: &str) -> Result<(), VcsError>;

    /// Clone the remote at `url` into `dest`, which must not exist yet.
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), VcsError>;

    /// Working-tree changes, one entry per changed path. Empty means clean.
    fn status(&self, repo: &Path) -> Result<Vec<String>, VcsError>;

    /// Stage every addition, modification and deletion.
    fn stage_all(&self, repo: &Path) -> Result<(), VcsError>;

    fn commit(&self, repo: &Path, message: &str) -> Result<CommitOutcome, VcsError>;

    fn push(&self, repo: &Path, branch: &str) -> Result<(), VcsError>;

    /// Number of local commits on HEAD not yet present on the remote `branch`.
    fn unpublished_commits(&self, repo: &Path, branch: &str) -> Result<usize, VcsError>;
}

// ---------------------------------------------------------------------------
// GitCli
// ---------------------------------------------------------------------------

const REMOTE: &str = "origin";

/// [`VersionControlClient`] backed by the `git` command-line tool.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: OsString,
    envs: Vec<(OsString, OsString)>,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self {
            program: OsString::from("git"),
            envs: Vec::new(),
        }
    }

    /// Use a different executable (for example an absolute path to git).
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Add an environment variable to every git invocation.
    pub fn with_env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    fn command_line(&self, args: &[&OsStr]) -> String {
        let mut line = self.program.to_string_lossy().into_owned();
        for arg in args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    /// Run git with `args` in `dir`, returning trimmed stdout on success.
    fn run(&self, dir: &Path, args: &[&OsStr]) -> Result<String, VcsError> {
        let output = self.output(dir, args)?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string());
        }
        Err(self.failure(args, &output))
    }

    fn output(&self, dir: &Path, args: &[&OsStr]) -> Result<std::process::Output, VcsError> {
        tracing::debug!("running `{}` in {}", self.command_line(args), dir.display());
        Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            // Stable English messages for the "nothing to commit" check.
            .env("LC_ALL", "C")
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .output()
            .map_err(|e| VcsError::Spawn {
                program: self.program.to_string_lossy().into_owned(),
                source: e,
            })
    }

    fn failure(&self, args: &[&OsStr], output: &std::process::Output) -> VcsError {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stderr = if stderr.is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr
        };
        VcsError::Failed {
            command: self.command_line(args),
            status: output.status.to_string(),
            stderr,
        }
    }
}

fn os(s: &str) -> &OsStr {
    OsStr::new(s)
}

fn is_nothing_to_commit(text: &str) -> bool {
    text.contains("nothing to commit") || text.contains("nothing added to commit")
}

impl VersionControlClient for GitCli {
    fn version(&self) -> Result<String, VcsError> {
        let cwd = std::env::temp_dir();
        self.run(&cwd, &[os("--version")])
    }

    fn refresh(&self, repo: &Path, branch: &str) -> Result<(), VcsError> {
        self.run(repo, &[os("pull"), os(REMOTE), os(branch)])
            .map(|_| ())
    }

    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), VcsError> {
        // git runs from the parent directory, so a relative `dest` would be
        // resolved twice.
        let dest = if dest.is_absolute() {
            dest.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| VcsError::Spawn {
                    program: self.program.to_string_lossy().into_owned(),
                    source: e,
                })?
                .join(dest)
        };
        let parent = dest.parent().unwrap_or(&dest);
        self.run(
            parent,
            &[os("clone"), os("--"), os(url), dest.as_os_str()],
        )
        .map(|_| ())
    }

    fn status(&self, repo: &Path) -> Result<Vec<String>, VcsError> {
        let out = self.run(repo, &[os("status"), os("--porcelain")])?;
        Ok(out
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_owned)
            .collect())
    }

    fn stage_all(&self, repo: &Path) -> Result<(), VcsError> {
        self.run(repo, &[os("add"), os("-A")]).map(|_| ())
    }

    fn commit(&self, repo: &Path, message: &str) -> Result<CommitOutcome, VcsError> {
        let args = [os("commit"), os("-m"), os(message)];
        let output = self.output(repo, &args)?;
        if output.status.success() {
            return Ok(CommitOutcome::Committed);
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_nothing_to_commit(&stdout) || is_nothing_to_commit(&stderr) {
            return Ok(CommitOutcome::NothingToCommit);
        }
        Err(self.failure(&args, &output))
    }

    fn push(&self, repo: &Path, branch: &str) -> Result<(), VcsError> {
        self.run(repo, &[os("push"), os(REMOTE), os(branch)])
            .map(|_| ())
    }

    fn unpublished_commits(&self, repo: &Path, branch: &str) -> Result<usize, VcsError> {
        let range = format!("{REMOTE}/{branch}..HEAD");
        let args = [os("rev-list"), os("--count"), os(&range)];
        let out = self.run(repo, &args)?;
        out.trim()
            .parse::<usize>()
            .map_err(|_| VcsError::UnexpectedOutput {
                command: self.command_line(&args),
                output: out,
            })
    }
}
