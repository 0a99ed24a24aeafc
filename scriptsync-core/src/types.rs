//! Domain types for scriptsync.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! The on-disk config document ([`ConfigFile`]) is kept separate from the
//! validated, path-expanded [`SyncConfig`] the pipeline consumes.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Namespace segment under which one operator's app folders live in the
/// workspace (`<workspace>/<identity>/<app>/...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(pub String);

impl Identity {
    /// Placeholder used when no operator name can be resolved.
    pub const UNKNOWN: &'static str = "unknown";

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Name of a top-level directory under the scripts root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppFolderName(pub String);

impl AppFolderName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppFolderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for AppFolderName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AppFolderName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Branch used when the config omits `git.branch`.
pub const DEFAULT_BRANCH: &str = "main";

/// Suffixes excluded when the config omits `sync.exclude_extensions`.
pub const DEFAULT_EXCLUDED_SUFFIXES: &[&str] = &[".tmp", ".log", ".bak"];

/// Suffixes written into the sample config by `scriptsync init`.
pub const SAMPLE_EXCLUDED_SUFFIXES: &[&str] = &[".tmp", ".log", ".bak", ".swp", ".DS_Store"];

fn default_branch() -> String {
    DEFAULT_BRANCH.to_owned()
}

fn default_exclude_extensions() -> Vec<String> {
    DEFAULT_EXCLUDED_SUFFIXES
        .iter()
        .map(|s| (*s).to_owned())
        .collect()
}

// ---------------------------------------------------------------------------
// On-disk document
// ---------------------------------------------------------------------------

/// `git:` section of the config document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSection {
    pub repository_url: String,
    /// May start with `~`; expanded against the home directory on load.
    pub local_repo_path: PathBuf,
    #[serde(default = "default_branch")]
    pub branch: String,
}

/// `sync:` section of the config document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSection {
    #[serde(default = "default_exclude_extensions")]
    pub exclude_extensions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts_path: Option<PathBuf>,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            exclude_extensions: default_exclude_extensions(),
            scripts_path: None,
        }
    }
}

/// Root of the YAML config document (`git_config.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub git: GitSection,
    #[serde(default)]
    pub sync: SyncSection,
}

// ---------------------------------------------------------------------------
// Runtime config
// ---------------------------------------------------------------------------

/// Validated configuration for a single sync run. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub repository_url: String,
    /// Location of the local working copy. Relative paths resolve against
    /// the current directory.
    pub local_repo_path: PathBuf,
    pub branch: String,
    pub excluded_suffixes: BTreeSet<String>,
    /// Explicit scripts root from the config, if any.
    pub scripts_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
