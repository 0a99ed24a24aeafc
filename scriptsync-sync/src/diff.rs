//! Unified diff support for `scriptsync diff`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use scriptsync_core::{AppFolderName, Identity};

use crate::error::{io_err, SyncError};
use crate::mirror::{list_app_folders, namespace_path};
use crate::preview::preview_app_folder;

/// A single file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// Path relative to the workspace root (`<identity>/<app>/...`).
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Compare the workspace copy of each app folder with its source.
///
/// `a/` is the current workspace content, `b/` what a sync would write.
/// Restrict to one app folder with `only`. No files are written.
pub fn diff_app_folders(
    scripts_root: &Path,
    workspace: &Path,
    identity: &Identity,
    excluded_suffixes: &std::collections::BTreeSet<String>,
    only: Option<&AppFolderName>,
) -> Result<Vec<FileDiff>, SyncError> {
    let namespace = namespace_path(workspace, identity)?;
    let mut diffs = Vec::new();

    for (name, source) in list_app_folders(scripts_root)? {
        if only.is_some_and(|wanted| *wanted != name) {
            continue;
        }
        let dest = namespace.join(name.as_str());
        let preview = preview_app_folder(&name, &source, &dest, excluded_suffixes)?;

        let changed = preview
            .added
            .iter()
            .chain(&preview.modified)
            .chain(&preview.removed);
        let mut changed: Vec<&PathBuf> = changed.collect();
        changed.sort();

        for relative in changed {
            let old = read_or_empty(&dest.join(relative))?;
            let new = read_or_empty(&source.join(relative))?;
            let display = Path::new(identity.as_str()).join(name.as_str()).join(relative);
            diffs.push(FileDiff {
                unified_diff: render(&display, &old, &new),
                path: display,
            });
        }
    }

    Ok(diffs)
}

fn render(path: &Path, old: &[u8], new: &[u8]) -> String {
    let old_header = format!("a/{}", path.display());
    let new_header = format!("b/{}", path.display());
    match (std::str::from_utf8(old), std::str::from_utf8(new)) {
        (Ok(old), Ok(new)) => {
            let old = normalize_line_endings(old);
            let new = normalize_line_endings(new);
            TextDiff::from_lines(&old, &new)
                .unified_diff()
                .header(&old_header, &new_header)
                .context_radius(3)
                .to_string()
        }
        _ => format!("Binary files {old_header} and {new_header} differ\n"),
    }
}

fn read_or_empty(path: &Path) -> Result<Vec<u8>, SyncError> {
    match std::fs::read(path) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(err) => Err(io_err(path, err)),
    }
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;

    use tempfile::TempDir;

    use crate::mirror::mirror_scripts;

    use super::*;

    fn write(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn no_diffs_after_mirror() {
        let scripts = TempDir::new().unwrap();
        let repo = TempDir::new().unwrap();
        write(&scripts.path().join("backup/run.sh"), b"run\n");
        let identity = Identity::from("alice");
        mirror_scripts(scripts.path(), repo.path(), &identity, &BTreeSet::new()).unwrap();

        let diffs =
            diff_app_folders(scripts.path(), repo.path(), &identity, &BTreeSet::new(), None)
                .unwrap();
        assert!(diffs.is_empty());
    }

    #[test]
    fn source_edit_produces_unified_diff() {
        let scripts = TempDir::new().unwrap();
        let repo = TempDir::new().unwrap();
        write(&scripts.path().join("backup/run.sh"), b"echo one\n");
        let identity = Identity::from("alice");
        mirror_scripts(scripts.path(), repo.path(), &identity, &BTreeSet::new()).unwrap();
        write(&scripts.path().join("backup/run.sh"), b"echo one\necho two\n");

        let diffs =
            diff_app_folders(scripts.path(), repo.path(), &identity, &BTreeSet::new(), None)
                .unwrap();

        assert_eq!(diffs.len(), 1);
        let diff = &diffs[0].unified_diff;
        assert!(diff.contains("--- a/alice/backup/run.sh"), "{diff}");
        assert!(diff.contains("+++ b/alice/backup/run.sh"), "{diff}");
        assert!(diff.contains("+echo two"), "{diff}");
    }

    #[test]
    fn crlf_only_changes_render_an_empty_hunk_list() {
        let path = Path::new("alice/app/x.sh");
        let rendered = render(path, b"a\r\nb\r\n", b"a\nb\n");
        assert!(!rendered.contains("@@"), "{rendered}");
    }

    #[test]
    fn binary_files_are_summarised() {
        let scripts = TempDir::new().unwrap();
        let repo = TempDir::new().unwrap();
        write(&scripts.path().join("tools/blob.bin"), &[0xff, 0xfe, 0x00]);

        let diffs = diff_app_folders(
            scripts.path(),
            repo.path(),
            &Identity::from("alice"),
            &BTreeSet::new(),
            None,
        )
        .unwrap();
        assert!(diffs[0].unified_diff.starts_with("Binary files"));
    }

    #[test]
    fn only_filter_limits_to_one_app_folder() {
        let scripts = TempDir::new().unwrap();
        let repo = TempDir::new().unwrap();
        write(&scripts.path().join("backup/a.sh"), b"a\n");
        write(&scripts.path().join("deploy/d.sh"), b"d\n");

        let only = AppFolderName::from("deploy");
        let diffs = diff_app_folders(
            scripts.path(),
            repo.path(),
            &Identity::from("alice"),
            &BTreeSet::new(),
            Some(&only),
        )
        .unwrap();
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].path.ends_with("deploy/d.sh"));
    }
}
