//! Migration configuration.
//!
//! A run is described by a single TOML file:
//!
//! ```toml
//! [source]
//! snapshot = "export.json"
//! browse-url = "https://jira.example.com/browse"
//!
//! [target]
//! owner = "example"
//! repository = "project"
//!
//! [users]
//! rwinch = "rwinch"
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

mod error;
mod sections;

pub use error::ConfigError;
pub use sections::{
    ImportSection, LedgerSection, MilestoneOverride, SourceSection, TargetSection, ThrottleSection,
};

use crate::labels::LabelConfig;
use crate::templates::TemplateConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};
use url::Url;

/// Environment variable that overrides the configured token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Parsed and validated migration configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MigrationConfig {
    pub source: SourceSection,
    pub target: TargetSection,

    #[serde(default)]
    pub ledger: LedgerSection,

    #[serde(default)]
    pub throttle: ThrottleSection,

    #[serde(default)]
    pub import: ImportSection,

    /// Source user name to target login.
    #[serde(default)]
    pub users: BTreeMap<String, String>,

    /// Release metadata overrides by release name.
    #[serde(default)]
    pub milestones: BTreeMap<String, MilestoneOverride>,

    #[serde(default)]
    pub labels: LabelConfig,

    #[serde(default)]
    pub templates: TemplateConfig,
}

impl MigrationConfig {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing, unreadable, malformed,
    /// or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!(path = %path.display(), "Loading configuration");

        if !path.exists() {
            return Err(ConfigError::MissingFile {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.display().to_string(),
            source,
        })?;

        let mut config: Self = toml::from_str(&contents).map_err(|source| ConfigError::TomlError {
            path: path.display().to_string(),
            source,
        })?;

        config.validate(path)?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }

        debug!(
            target_repository = %config.target.repository,
            users = config.users.len(),
            label_rules = config.labels.rules.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Checks required fields and value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first problem found.
    pub fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::ValidationError {
            path: path.display().to_string(),
            message,
        };

        if self.target.owner.trim().is_empty() {
            return Err(invalid("target.owner is empty".to_string()));
        }
        if self.target.repository.trim().is_empty() {
            return Err(invalid("target.repository is empty".to_string()));
        }
        if self.source.snapshot.as_os_str().is_empty() {
            return Err(invalid("source.snapshot is empty".to_string()));
        }

        validate_url(&self.source.browse_url)
            .map_err(|e| invalid(format!("source.browse-url: {e}")))?;
        if let Some(api_url) = &self.target.api_url {
            validate_url(api_url).map_err(|e| invalid(format!("target.api-url: {e}")))?;
        }

        if self.source.page_size == 0 {
            return Err(invalid("source.page-size must be positive".to_string()));
        }
        if self.import.checkpoint_size == 0 {
            return Err(invalid("import.checkpoint-size must be positive".to_string()));
        }

        for definition in &self.labels.define {
            if !is_label_color(&definition.color) {
                return Err(invalid(format!(
                    "label '{}' has invalid color '{}'",
                    definition.name, definition.color
                )));
            }
        }
        if let Some(color) = &self.labels.default_color {
            if !is_label_color(color) {
                return Err(invalid(format!("labels.default-color '{color}' is invalid")));
            }
        }

        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        if self.source.snapshot.is_relative() {
            self.source.snapshot = base.join(&self.source.snapshot);
        }
        if self.ledger.directory.is_relative() {
            self.ledger.directory = base.join(&self.ledger.directory);
        }
    }

    /// Returns the target login mapped to a source user name.
    #[must_use]
    pub fn target_login(&self, source_user: &str) -> Option<&str> {
        self.users.get(source_user).map(String::as_str)
    }
}

/// Picks the token: explicit value first, then [`TOKEN_ENV`], then the file.
///
/// # Errors
///
/// Returns [`ConfigError::MissingToken`] when none is set.
pub fn resolve_token(explicit: Option<&str>, config: &MigrationConfig) -> Result<String, ConfigError> {
    let non_empty = |token: &str| !token.trim().is_empty();

    if let Some(token) = explicit.filter(|t| non_empty(t)) {
        return Ok(token.to_string());
    }
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if non_empty(&token) {
            return Ok(token);
        }
    }
    config
        .target
        .token
        .clone()
        .filter(|t| non_empty(t))
        .ok_or(ConfigError::MissingToken { env: TOKEN_ENV })
}

fn validate_url(value: &str) -> Result<(), String> {
    let url = Url::parse(value).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(format!("unsupported scheme '{scheme}'")),
    }
}

fn is_label_color(color: &str) -> bool {
    color.len() == 6 && color.chars().all(|c| c.is_ascii_hexdigit())
}
