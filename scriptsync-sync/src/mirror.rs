//! Mirror copier: replace each app folder under `<workspace>/<identity>/`
//! with a fresh copy of its source, then strip excluded files.
//!
//! ## Per app folder
//!
//! 1. Copy the source subtree into a hidden staging sibling of the destination.
//! 2. Walk the staged copy and delete files matched by [`should_exclude`].
//! 3. Count surviving regular files.
//! 4. Remove the old destination (full replace, no merge) and rename the
//!    staged copy into place.
//!
//! A failure inside one app folder leaves its previous destination as it was.
//! The folder is recorded in [`MirrorReport::skipped`] and the remaining
//! folders are still processed.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use scriptsync_core::{AppFolderName, Identity};

use crate::error::{io_err, SyncError};
use crate::filter::should_exclude;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Result of mirroring a single app folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppFolderReport {
    pub name: AppFolderName,
    /// Regular files present in the destination after filtering.
    pub files_copied: usize,
    /// Removed files, relative to the identity namespace (`<app>/<...>`).
    pub excluded: Vec<PathBuf>,
}

/// An app folder that could not be mirrored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAppFolder {
    pub name: AppFolderName,
    pub reason: String,
}

/// Outcome of [`mirror_scripts`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MirrorReport {
    /// `<workspace>/<identity>`.
    pub namespace: PathBuf,
    /// Total surviving files across all mirrored app folders.
    pub files_copied: usize,
    pub app_folders: Vec<AppFolderReport>,
    pub skipped: Vec<SkippedAppFolder>,
}

impl MirrorReport {
    /// `true` when nothing was copied; the orchestrator stops before publishing.
    pub fn is_empty(&self) -> bool {
        self.files_copied == 0
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<workspace>/<identity>` after checking that `identity` is a single plain
/// path segment.
pub fn namespace_path(workspace: &Path, identity: &Identity) -> Result<PathBuf, SyncError> {
    let mut components = Path::new(identity.as_str()).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(segment)), None) if segment == identity.as_str() => {
            Ok(workspace.join(segment))
        }
        _ => Err(SyncError::InvalidIdentity {
            identity: identity.to_string(),
        }),
    }
}

/// Top-level, non-hidden directories of `scripts_root`, sorted by name.
///
/// Directories whose names are not valid UTF-8 are skipped with a warning.
pub fn list_app_folders(scripts_root: &Path) -> Result<Vec<(AppFolderName, PathBuf)>, SyncError> {
    if !scripts_root.is_dir() {
        return Err(SyncError::ScriptsDirectoryMissing {
            path: scripts_root.to_path_buf(),
        });
    }
    let mut folders = Vec::new();
    for entry in std::fs::read_dir(scripts_root).map_err(|e| io_err(scripts_root, e))? {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                tracing::warn!("skipping app folder with non UTF-8 name: {raw:?}");
                continue;
            }
        };
        if !name.starts_with('.') {
            folders.push((AppFolderName::from(name), path));
        }
    }
    folders.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(folders)
}

// ---------------------------------------------------------------------------
// mirror_scripts
// ---------------------------------------------------------------------------

/// Mirror every app folder of `scripts_root` into `<workspace>/<identity>/`.
///
/// Fails with [`SyncError::ScriptsDirectoryMissing`] before touching the
/// workspace when the source is absent. Destination app folders whose source
/// no longer exists are left in place.
pub fn mirror_scripts(
    scripts_root: &Path,
    workspace: &Path,
    identity: &Identity,
    excluded_suffixes: &BTreeSet<String>,
) -> Result<MirrorReport, SyncError> {
    let namespace = namespace_path(workspace, identity)?;
    let folders = list_app_folders(scripts_root)?;

    std::fs::create_dir_all(&namespace).map_err(|e| io_err(&namespace, e))?;
    tracing::info!("copying scripts to repo under: {identity}/");

    let mut report = MirrorReport {
        namespace: namespace.clone(),
        ..MirrorReport::default()
    };

    for (name, source) in folders {
        tracing::info!("processing app folder: {name}");
        let dest = namespace.join(name.as_str());
        match mirror_app_folder(&name, &source, &dest, excluded_suffixes) {
            Ok(folder) => {
                for path in &folder.excluded {
                    tracing::info!("excluded: {}", path.display());
                }
                tracing::info!("copied app folder: {name} ({} files)", folder.files_copied);
                report.files_copied += folder.files_copied;
                report.app_folders.push(folder);
            }
            Err(e) => {
                tracing::warn!("error copying {name}: {e}");
                report.skipped.push(SkippedAppFolder {
                    name,
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::info!("total files copied: {}", report.files_copied);
    Ok(report)
}

fn mirror_app_folder(
    name: &AppFolderName,
    source: &Path,
    dest: &Path,
    excluded_suffixes: &BTreeSet<String>,
) -> Result<AppFolderReport, SyncError> {
    // Built next to the destination and renamed into place, so a failure
    // leaves the previous copy untouched.
    let staging = dest.with_file_name(format!(".{name}.staging"));
    remove_existing(&staging)?;

    let outcome = stage_app_folder(name, source, &staging, excluded_suffixes).and_then(|report| {
        remove_existing(dest)?;
        std::fs::rename(&staging, dest).map_err(|e| io_err(dest, e))?;
        Ok(report)
    });
    if outcome.is_err() {
        if let Err(e) = remove_existing(&staging) {
            tracing::warn!("could not remove {}: {e}", staging.display());
        }
    }
    outcome
}

/// Copy `source` into `staging` and strip excluded files there.
fn stage_app_folder(
    name: &AppFolderName,
    source: &Path,
    staging: &Path,
    excluded_suffixes: &BTreeSet<String>,
) -> Result<AppFolderReport, SyncError> {
    copy_tree(source, staging)?;

    let mut files_copied = 0;
    let mut excluded = Vec::new();
    for entry in WalkDir::new(staging).min_depth(1) {
        let entry = entry.map_err(|e| walk_err(staging, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if should_exclude(&file_name, excluded_suffixes) {
            std::fs::remove_file(entry.path()).map_err(|e| io_err(entry.path(), e))?;
            let relative = entry.path().strip_prefix(staging).unwrap_or(entry.path());
            excluded.push(Path::new(name.as_str()).join(relative));
        } else {
            files_copied += 1;
        }
    }

    Ok(AppFolderReport {
        name: name.clone(),
        files_copied,
        excluded,
    })
}

fn remove_existing(dest: &Path) -> Result<(), SyncError> {
    let Ok(meta) = std::fs::symlink_metadata(dest) else {
        return Ok(());
    };
    if meta.is_dir() {
        std::fs::remove_dir_all(dest).map_err(|e| io_err(dest, e))
    } else {
        std::fs::remove_file(dest).map_err(|e| io_err(dest, e))
    }
}

/// Recursively copy `source` into `dest`, following symbolic links.
///
/// Dangling links and entries that are neither directories nor regular
/// files are skipped.
pub(crate) fn copy_tree(source: &Path, dest: &Path) -> Result<(), SyncError> {
    std::fs::create_dir_all(dest).map_err(|e| io_err(dest, e))?;
    for entry in WalkDir::new(source).min_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if is_dangling_link(&e) => {
                tracing::debug!("skipping dangling symlink: {e}");
                continue;
            }
            Err(e) => return Err(walk_err(source, e)),
        };
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| io_err(&target, e))?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target).map_err(|e| io_err(entry.path(), e))?;
        } else {
            tracing::debug!("skipping special file: {}", entry.path().display());
        }
    }
    Ok(())
}

/// A followed symlink whose target does not exist. Loops are not dangling.
pub(crate) fn is_dangling_link(err: &walkdir::Error) -> bool {
    err.loop_ancestor().is_none()
        && err.path().is_some_and(|path| {
            std::fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
                && std::fs::metadata(path).is_err()
        })
}

pub(crate) fn walk_err(root: &Path, e: walkdir::Error) -> SyncError {
    let path = e.path().unwrap_or(root).to_path_buf();
    let source = e
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
    io_err(path, source)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
