//! `scriptsync sync`: mirror the scripts root and publish it.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use scriptsync_sync::{
    pipeline::{self, SyncOutcome, SyncReport, SyncRequest},
    preview, GitCli, PreviewReport, VersionControlClient,
};

use super::TargetArgs;

/// Arguments for `scriptsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Show what would be copied without touching the repository.
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    pub fn run(self, config_path: &Path) -> Result<()> {
        let target = self.target.resolve(config_path)?;

        if self.dry_run {
            let report = preview(
                &target.scripts_root,
                &target.config.local_repo_path,
                &target.identity,
                &target.config.excluded_suffixes,
            )?;
            print_plan(&report);
            return Ok(());
        }

        let git = GitCli::new();
        let version = git
            .version()
            .context("git is not installed or not on PATH")?;
        tracing::debug!("using {version}");

        tracing::info!(
            "syncing {} as '{}'",
            target.scripts_root.display(),
            target.identity
        );
        let report = pipeline::run(
            SyncRequest {
                config: &target.config,
                scripts_root: &target.scripts_root,
                identity: &target.identity,
            },
            &git,
        )?;
        print_report(&report, &target.config.branch);
        Ok(())
    }
}

fn print_report(report: &SyncReport, branch: &str) {
    for warning in &report.warnings {
        eprintln!("{} {warning}", "!".yellow().bold());
    }

    for folder in &report.mirror.app_folders {
        let excluded = if folder.excluded.is_empty() {
            String::new()
        } else {
            format!(" ({} excluded)", folder.excluded.len())
        };
        println!("  ·  {}: {} files{excluded}", folder.name, folder.files_copied);
    }

    match &report.outcome {
        SyncOutcome::Published {
            commit_message: Some(message),
        } => {
            println!(
                "{} Published {} files to '{branch}'",
                "✓".green().bold(),
                report.mirror.files_copied
            );
            println!("  {message}");
        }
        SyncOutcome::Published {
            commit_message: None,
        } => println!(
            "{} Pushed earlier unpublished commits to '{branch}'",
            "✓".green().bold()
        ),
        SyncOutcome::NoChanges => println!("{} No changes to publish", "✓".green()),
        SyncOutcome::NothingToSync => {
            println!("{} Nothing to sync: no files were copied", "·".bright_black())
        }
    }
}

fn print_plan(report: &PreviewReport) {
    let prefix = "[dry-run] ";
    if report.app_folders.is_empty() {
        println!("{prefix}no app folders found");
        return;
    }

    for folder in &report.app_folders {
        if !folder.has_changes() {
            println!("{prefix}✓ '{}' up to date", folder.name);
            continue;
        }
        println!(
            "{prefix}~ '{}' ({} added, {} modified, {} removed)",
            folder.name,
            folder.added.len(),
            folder.modified.len(),
            folder.removed.len()
        );
        for path in &folder.added {
            println!("  +  {}", path.display());
        }
        for path in &folder.modified {
            println!("  ~  {}", path.display());
        }
        for path in &folder.removed {
            println!("  -  {}", path.display());
        }
    }

    for name in &report.orphaned {
        println!("{prefix}! '{name}' exists in the repository but not locally; left untouched");
    }
    println!(
        "{prefix}{} files would be published under {}",
        report.files_after_sync(),
        report.namespace.display()
    );
}
