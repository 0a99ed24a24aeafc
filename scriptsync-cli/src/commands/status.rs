//! `scriptsync status`: per-app-folder view of pending changes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use scriptsync_core::{AppFolderName, Identity};
use scriptsync_sync::{preview, preview::AppFolderPreview, PreviewReport};

use super::TargetArgs;

/// Arguments for `scriptsync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, config_path: &Path) -> Result<()> {
        let target = self.target.resolve(config_path)?;
        let report = preview(
            &target.scripts_root,
            &target.config.local_repo_path,
            &target.identity,
            &target.config.excluded_suffixes,
        )?;

        if self.json {
            print_json(&target.identity, &target.scripts_root, report)?;
            return Ok(());
        }
        print_table(&target.identity, &target.scripts_root, &report);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FolderState {
    New,
    Current,
    Changed,
    Orphan,
}

impl FolderState {
    fn of(folder: &AppFolderPreview) -> Self {
        if !folder.has_changes() {
            FolderState::Current
        } else if folder.modified.is_empty() && folder.removed.is_empty() && folder.unchanged == 0 {
            FolderState::New
        } else {
            FolderState::Changed
        }
    }

    fn key(self) -> &'static str {
        match self {
            FolderState::New => "new",
            FolderState::Current => "current",
            FolderState::Changed => "changed",
            FolderState::Orphan => "orphan",
        }
    }

    fn label(self) -> String {
        match self {
            FolderState::New => "NEW".cyan().bold().to_string(),
            FolderState::Current => "CURRENT".green().bold().to_string(),
            FolderState::Changed => "CHANGED".yellow().bold().to_string(),
            FolderState::Orphan => "ORPHAN".magenta().bold().to_string(),
        }
    }
}

#[derive(Serialize)]
struct StatusJson {
    identity: Identity,
    scripts_root: PathBuf,
    namespace: PathBuf,
    pending: bool,
    app_folders: Vec<AppFolderJson>,
    orphaned: Vec<AppFolderName>,
}

#[derive(Serialize)]
struct AppFolderJson {
    status: &'static str,
    #[serde(flatten)]
    preview: AppFolderPreview,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "app folder")]
    name: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "files")]
    files: usize,
    #[tabled(rename = "added")]
    added: usize,
    #[tabled(rename = "modified")]
    modified: usize,
    #[tabled(rename = "removed")]
    removed: usize,
    #[tabled(rename = "excluded")]
    excluded: usize,
}

fn print_json(identity: &Identity, scripts_root: &Path, report: PreviewReport) -> Result<()> {
    let payload = StatusJson {
        identity: identity.clone(),
        scripts_root: scripts_root.to_path_buf(),
        pending: report.has_changes(),
        namespace: report.namespace,
        app_folders: report
            .app_folders
            .into_iter()
            .map(|preview| AppFolderJson {
                status: FolderState::of(&preview).key(),
                preview,
            })
            .collect(),
        orphaned: report.orphaned,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(identity: &Identity, scripts_root: &Path, report: &PreviewReport) {
    let pending = report
        .app_folders
        .iter()
        .filter(|folder| folder.has_changes())
        .count();
    println!(
        "scriptsync v{} | {} | {} app folders | {} pending",
        env!("CARGO_PKG_VERSION"),
        identity,
        report.app_folders.len(),
        pending,
    );
    println!("{} → {}", scripts_root.display(), report.namespace.display());

    if report.app_folders.is_empty() && report.orphaned.is_empty() {
        println!("No app folders found.");
        return;
    }

    let mut rows: Vec<StatusTableRow> = report
        .app_folders
        .iter()
        .map(|folder| StatusTableRow {
            name: folder.name.to_string(),
            status: FolderState::of(folder).label(),
            files: folder.files_after_sync(),
            added: folder.added.len(),
            modified: folder.modified.len(),
            removed: folder.removed.len(),
            excluded: folder.excluded.len(),
        })
        .collect();
    rows.extend(report.orphaned.iter().map(|name| StatusTableRow {
        name: name.to_string(),
        status: FolderState::Orphan.label(),
        files: 0,
        added: 0,
        modified: 0,
        removed: 0,
        excluded: 0,
    }));

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if pending > 0 {
        println!("Run 'scriptsync sync' to publish pending changes.");
    }
}
