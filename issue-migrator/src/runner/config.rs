//! Runner configuration.

use std::path::{Path, PathBuf};

/// Command-line level options for a migration run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Path to the migration TOML file.
    config_path: PathBuf,
    /// GitHub token given on the command line.
    token: Option<String>,
    /// Whether to preview payloads without changing the target.
    dry_run: bool,
}

impl RunnerConfig {
    /// Creates a new configuration for a run.
    pub fn new(config_path: PathBuf, token: Option<String>, dry_run: bool) -> Self {
        Self {
            config_path,
            token,
            dry_run,
        }
    }

    /// Returns the migration file path.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Returns the token given on the command line.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns whether dry-run mode is enabled.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }
}
