//! Configuration sections.

use crate::rate_limit::ThrottleSettings;
use crate::releases::ReleasePolicy;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// `[source]`: where issues come from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceSection {
    /// JSON export of the source project.
    pub snapshot: PathBuf,

    /// Base URL of issue pages, e.g. `https://jira.example.com/browse`.
    pub browse_url: String,

    /// Query passed to the source tracker.
    #[serde(default)]
    pub query: String,

    /// Issues per search page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

/// `[target]`: the GitHub repository receiving issues.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TargetSection {
    pub owner: String,
    pub repository: String,

    /// GitHub Enterprise API base URL.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Token, overridden by the environment.
    #[serde(default)]
    pub token: Option<String>,

    /// Create the repository before the first import.
    #[serde(default)]
    pub create_repository: bool,

    /// Delete and recreate the repository before the first import.
    #[serde(default)]
    pub recreate_repository: bool,

    /// Create the repository as private.
    #[serde(default)]
    pub private: bool,
}

/// `[ledger]`: where progress is stored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LedgerSection {
    #[serde(default = "default_ledger_directory")]
    pub directory: PathBuf,
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            directory: default_ledger_directory(),
        }
    }
}

/// `[throttle]`: request spacing and polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ThrottleSection {
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    #[serde(default = "default_abuse_backoff_secs")]
    pub abuse_backoff_secs: u64,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for ThrottleSection {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
            abuse_backoff_secs: default_abuse_backoff_secs(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl ThrottleSection {
    #[must_use]
    pub fn settings(&self) -> ThrottleSettings {
        ThrottleSettings {
            min_interval: Duration::from_millis(self.min_interval_ms),
            abuse_backoff: Duration::from_secs(self.abuse_backoff_secs),
        }
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// `[import]`: how issues are turned into import jobs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImportSection {
    /// Jobs submitted before awaiting the batch.
    #[serde(default = "default_checkpoint_size")]
    pub checkpoint_size: usize,

    #[serde(default)]
    pub release_policy: ReleasePolicy,

    /// Source statuses imported as closed issues.
    #[serde(default = "default_closed_statuses")]
    pub closed_statuses: Vec<String>,

    /// Label added to backport holder issues.
    #[serde(default)]
    pub backport_label: Option<String>,
}

impl Default for ImportSection {
    fn default() -> Self {
        Self {
            checkpoint_size: default_checkpoint_size(),
            release_policy: ReleasePolicy::default(),
            closed_statuses: default_closed_statuses(),
            backport_label: None,
        }
    }
}

/// `[milestones."<release>"]`: release metadata the source does not provide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MilestoneOverride {
    /// RFC 3339 due date, e.g. `"2017-08-01T00:00:00Z"`.
    #[serde(default)]
    pub due_on: Option<DateTime<Utc>>,

    #[serde(default)]
    pub released: Option<bool>,

    #[serde(default)]
    pub description: Option<String>,
}

fn default_page_size() -> usize {
    100
}

pub(crate) fn default_ledger_directory() -> PathBuf {
    PathBuf::from("migration-state")
}

fn default_min_interval_ms() -> u64 {
    1000
}

fn default_abuse_backoff_secs() -> u64 {
    60
}

fn default_poll_interval_secs() -> u64 {
    1
}

fn default_checkpoint_size() -> usize {
    50
}

fn default_closed_statuses() -> Vec<String> {
    vec!["Closed".to_string(), "Resolved".to_string()]
}
