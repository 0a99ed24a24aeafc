//! `scriptsync diff [app]`: unified diffs of what sync would write.

use std::path::Path;

use anyhow::Result;
use clap::Args;

use scriptsync_core::AppFolderName;
use scriptsync_sync::diff_app_folders;

use super::TargetArgs;

/// Arguments for `scriptsync diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Limit the diff to one app folder.
    pub app: Option<String>,

    #[command(flatten)]
    pub target: TargetArgs,
}

impl DiffArgs {
    pub fn run(self, config_path: &Path) -> Result<()> {
        let target = self.target.resolve(config_path)?;
        let only = self.app.map(AppFolderName::from);

        let diffs = diff_app_folders(
            &target.scripts_root,
            &target.config.local_repo_path,
            &target.identity,
            &target.config.excluded_suffixes,
            only.as_ref(),
        )?;

        if diffs.is_empty() {
            match &only {
                Some(name) => println!("No differences for '{name}'."),
                None => println!("No differences."),
            }
            return Ok(());
        }

        for diff in diffs {
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }
        Ok(())
    }
}
