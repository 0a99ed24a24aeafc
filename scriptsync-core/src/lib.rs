//! scriptsync core library: domain types, config loading, errors.
//!
//! - [`types`]: newtypes, the YAML document, and the runtime [`SyncConfig`]
//! - [`error`]: [`ConfigError`]
//! - [`config`]: load / resolve / sample

pub mod config;
pub mod error;
pub mod types;

pub use error::ConfigError;
pub use types::{AppFolderName, ConfigFile, GitSection, Identity, SyncConfig, SyncSection};
