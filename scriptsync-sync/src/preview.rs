//! Read-only preview of what the mirror copier would change.
//!
//! Source and destination files are compared by SHA-256 digest. Nothing in
//! the workspace or the scripts root is modified.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use scriptsync_core::{AppFolderName, Identity};

use crate::error::{io_err, SyncError};
use crate::filter::should_exclude;
use crate::mirror::{is_dangling_link, list_app_folders, namespace_path, walk_err};

/// Planned changes for one app folder. Paths are relative to the app folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppFolderPreview {
    pub name: AppFolderName,
    /// Present at the source, absent in the workspace.
    pub added: Vec<PathBuf>,
    /// Present on both sides with different content.
    pub modified: Vec<PathBuf>,
    /// Present in the workspace only; the full replace deletes them.
    pub removed: Vec<PathBuf>,
    /// Source files dropped by the exclusion filter.
    pub excluded: Vec<PathBuf>,
    pub unchanged: usize,
}

impl AppFolderPreview {
    pub fn has_changes(&self) -> bool {
        !(self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty())
    }

    /// Files that would exist in the workspace after a sync.
    pub fn files_after_sync(&self) -> usize {
        self.added.len() + self.modified.len() + self.unchanged
    }
}

/// Preview across all app folders of the scripts root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewReport {
    pub namespace: PathBuf,
    pub app_folders: Vec<AppFolderPreview>,
    /// Workspace app folders with no source counterpart. Sync leaves them alone.
    pub orphaned: Vec<AppFolderName>,
}

impl PreviewReport {
    pub fn has_changes(&self) -> bool {
        self.app_folders.iter().any(AppFolderPreview::has_changes)
    }

    pub fn files_after_sync(&self) -> usize {
        self.app_folders
            .iter()
            .map(AppFolderPreview::files_after_sync)
            .sum()
    }
}

/// Compare `scripts_root` against `<workspace>/<identity>/` without writing.
pub fn preview(
    scripts_root: &Path,
    workspace: &Path,
    identity: &Identity,
    excluded_suffixes: &BTreeSet<String>,
) -> Result<PreviewReport, SyncError> {
    let namespace = namespace_path(workspace, identity)?;
    let folders = list_app_folders(scripts_root)?;

    let mut app_folders = Vec::with_capacity(folders.len());
    for (name, source) in &folders {
        let dest = namespace.join(name.as_str());
        app_folders.push(preview_app_folder(name, source, &dest, excluded_suffixes)?);
    }

    let sources: BTreeSet<&AppFolderName> = folders.iter().map(|(name, _)| name).collect();
    let orphaned = existing_app_folders(&namespace)?
        .into_iter()
        .filter(|name| !sources.contains(name))
        .collect();

    Ok(PreviewReport {
        namespace,
        app_folders,
        orphaned,
    })
}

pub(crate) fn preview_app_folder(
    name: &AppFolderName,
    source: &Path,
    dest: &Path,
    excluded_suffixes: &BTreeSet<String>,
) -> Result<AppFolderPreview, SyncError> {
    let (expected, excluded) = digest_tree(source, true, Some(excluded_suffixes))?;
    let (existing, _) = if dest.is_dir() {
        digest_tree(dest, false, None)?
    } else {
        (BTreeMap::new(), Vec::new())
    };

    let mut preview = AppFolderPreview {
        name: name.clone(),
        added: Vec::new(),
        modified: Vec::new(),
        removed: Vec::new(),
        excluded,
        unchanged: 0,
    };
    for (path, digest) in &expected {
        match existing.get(path) {
            None => preview.added.push(path.clone()),
            Some(old) if old != digest => preview.modified.push(path.clone()),
            Some(_) => preview.unchanged += 1,
        }
    }
    preview.removed = existing
        .keys()
        .filter(|path| !expected.contains_key(*path))
        .cloned()
        .collect();
    Ok(preview)
}

/// Map of relative path → hex SHA-256 for every regular file under `root`,
/// plus the files dropped by `excluded_suffixes`.
fn digest_tree(
    root: &Path,
    follow_links: bool,
    excluded_suffixes: Option<&BTreeSet<String>>,
) -> Result<(BTreeMap<PathBuf, String>, Vec<PathBuf>), SyncError> {
    let mut digests = BTreeMap::new();
    let mut excluded = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(follow_links)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if is_dangling_link(&e) => continue,
            Err(e) => return Err(walk_err(root, e)),
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();
        let file_name = entry.file_name().to_string_lossy();
        if excluded_suffixes.is_some_and(|s| should_exclude(&file_name, s)) {
            excluded.push(relative);
            continue;
        }
        digests.insert(relative, file_digest(entry.path())?);
    }
    Ok((digests, excluded))
}

pub(crate) fn file_digest(path: &Path) -> Result<String, SyncError> {
    let mut file = std::fs::File::open(path).map_err(|e| io_err(path, e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| io_err(path, e))?;
    Ok(hex::encode(hasher.finalize()))
}

fn existing_app_folders(namespace: &Path) -> Result<Vec<AppFolderName>, SyncError> {
    if !namespace.is_dir() {
        return Ok(vec![]);
    }
    let mut names: Vec<AppFolderName> = std::fs::read_dir(namespace)
        .map_err(|e| io_err(namespace, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        // Hidden entries are staging leftovers, not app folders.
        .filter(|name| !name.starts_with('.'))
        .map(AppFolderName::from)
        .collect();
    names.sort();
    Ok(names)
}
