//! YAML config loading, validation, and sample generation.
//!
//! # Document layout
//!
//! ```text
//! git:
//!   repository_url: <remote url>
//!   local_repo_path: ~/scripts-git-repo
//!   branch: main                      (optional, default "main")
//! sync:
//!   exclude_extensions: [.tmp, ...]   (optional, default .tmp .log .bak)
//!   scripts_path: ~/scripts           (optional)
//! ```
//!
//! # API pattern
//!
//! Every function that needs the home directory has two forms:
//! - `fn_at(…, home: &Path)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Component, Path, PathBuf};

use crate::error::{io_err, ConfigError};
use crate::types::{ConfigFile, GitSection, SyncConfig, SyncSection, SAMPLE_EXCLUDED_SUFFIXES};

/// Config file looked up in the current directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "git_config.yaml";

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// Expand a leading `~` component against `home`. Other paths are returned unchanged.
pub fn expand_tilde_at(path: &Path, home: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => home.join(components.as_path()),
        _ => path.to_path_buf(),
    }
}

/// Platform default scripts root: `<home>/Scripts` on Windows, `<home>/scripts` elsewhere.
pub fn default_scripts_path_at(home: &Path) -> PathBuf {
    if cfg!(windows) {
        home.join("Scripts")
    } else {
        home.join("scripts")
    }
}

/// Resolve the scripts root: explicit override, then `sync.scripts_path`,
/// then the platform default.
pub fn scripts_root_at(config: &SyncConfig, override_path: Option<&Path>, home: &Path) -> PathBuf {
    if let Some(path) = override_path {
        return expand_tilde_at(path, home);
    }
    match &config.scripts_path {
        Some(path) => path.clone(),
        None => default_scripts_path_at(home),
    }
}

/// `scripts_root_at` convenience wrapper.
pub fn scripts_root(
    config: &SyncConfig,
    override_path: Option<&Path>,
) -> Result<PathBuf, ConfigError> {
    Ok(scripts_root_at(config, override_path, &home()?))
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load and validate the config at `path`.
///
/// Returns `ConfigError::ConfigNotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(path: &Path, home: &Path) -> Result<SyncConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let doc: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    resolve_at(doc, home)
}

/// `load_at` convenience wrapper.
pub fn load(path: &Path) -> Result<SyncConfig, ConfigError> {
    load_at(path, &home()?)
}

/// Validate a parsed document and expand its paths.
pub fn resolve_at(doc: ConfigFile, home: &Path) -> Result<SyncConfig, ConfigError> {
    let repository_url = doc.git.repository_url.trim().to_owned();
    if repository_url.is_empty() {
        return Err(ConfigError::Invalid {
            field: "git.repository_url",
            reason: "must not be empty".into(),
        });
    }
    if doc.git.local_repo_path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid {
            field: "git.local_repo_path",
            reason: "must not be empty".into(),
        });
    }
    let branch = doc.git.branch.trim().to_owned();
    if branch.is_empty() || branch.starts_with('-') {
        return Err(ConfigError::Invalid {
            field: "git.branch",
            reason: format!("'{}' is not a usable branch name", doc.git.branch),
        });
    }

    Ok(SyncConfig {
        repository_url,
        local_repo_path: expand_tilde_at(&doc.git.local_repo_path, home),
        branch,
        // An empty suffix would match every file.
        excluded_suffixes: doc
            .sync
            .exclude_extensions
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect(),
        scripts_path: doc.sync.scripts_path.map(|p| expand_tilde_at(&p, home)),
    })
}

// ---------------------------------------------------------------------------
// 3. Sample config (atomic write)
// ---------------------------------------------------------------------------

/// The document written by `scriptsync init`.
pub fn sample() -> ConfigFile {
    ConfigFile {
        git: GitSection {
            repository_url: "https://github.com/yourcompany/scripts-repo.git".into(),
            local_repo_path: PathBuf::from("~/scripts-git-repo"),
            branch: "main".into(),
        },
        sync: SyncSection {
            exclude_extensions: SAMPLE_EXCLUDED_SUFFIXES
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            scripts_path: None,
        },
    }
}

/// Write the sample config to `path`.
///
/// Write flow: serialize → `.tmp` sibling → `chmod 0600` → `rename`.
/// Fails with `ConfigError::AlreadyExists` unless `force` is set.
pub fn write_sample(path: &Path, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let yaml = serde_yaml::to_string(&sample())?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_owned());
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

    std::fs::write(&tmp_path, yaml).map_err(|e| io_err(&tmp_path, e))?;
    set_file_permissions(&tmp_path)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}
