pub mod diff;
pub mod init;
pub mod status;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use scriptsync_core::{config, Identity, SyncConfig};

/// Options shared by the commands that look at the scripts root.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Namespace directory name in the repository [default: $USER, then $USERNAME].
    #[arg(long, value_name = "NAME")]
    pub identity: Option<String>,

    /// Directory whose app folders are mirrored [default: sync.scripts_path, then ~/scripts].
    #[arg(long, value_name = "DIR")]
    pub scripts_dir: Option<PathBuf>,
}

/// Everything a command needs after config and environment are resolved.
#[derive(Debug)]
pub struct Target {
    pub config: SyncConfig,
    pub scripts_root: PathBuf,
    pub identity: Identity,
}

impl TargetArgs {
    pub fn resolve(&self, config_path: &Path) -> Result<Target> {
        let config = config::load(config_path)
            .with_context(|| format!("failed to load config '{}'", config_path.display()))?;
        let scripts_root = config::scripts_root(&config, self.scripts_dir.as_deref())?;
        let identity = resolve_identity(self.identity.as_deref(), |key| std::env::var(key).ok());
        tracing::debug!(
            "identity '{identity}', scripts root {}, workspace {}",
            scripts_root.display(),
            config.local_repo_path.display()
        );
        Ok(Target {
            config,
            scripts_root,
            identity,
        })
    }
}

/// `--identity`, then `USER`, then `USERNAME`, then `unknown`. Blank values are skipped.
pub fn resolve_identity(
    explicit: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Identity {
    explicit
        .map(str::to_owned)
        .into_iter()
        .chain(["USER", "USERNAME"].into_iter().filter_map(|key| lookup(key)))
        .map(|value| value.trim().to_owned())
        .find(|value| !value.is_empty())
        .map(Identity::from)
        .unwrap_or_else(Identity::unknown)
}
