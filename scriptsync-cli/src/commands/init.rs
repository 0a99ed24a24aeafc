//! `scriptsync init [--force]`: write a sample config.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use scriptsync_core::config;

/// Arguments for `scriptsync init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self, config_path: &Path) -> Result<()> {
        config::write_sample(config_path, self.force)
            .with_context(|| format!("failed to write '{}'", config_path.display()))?;

        println!("✓ Wrote sample config to {}", config_path.display());
        println!("  Edit git.repository_url and git.local_repo_path, then run `scriptsync sync`.");
        println!();
        println!("Git authentication:");
        println!("  SSH:   add your public key to the hosting service and use a git@ URL");
        println!("  HTTPS: git config --global credential.helper store");
        Ok(())
    }
}
