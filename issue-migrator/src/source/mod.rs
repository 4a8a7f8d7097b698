//! Source tracker interface and issue snapshots.
//!
//! The migration reads the source tracker once per run: every issue
//! matching the query is paged into memory as an immutable [`SourceIssue`],
//! with its releases sorted and split into primary and backports.

mod error;
mod issue;
mod snapshot;

pub use error::SourceError;
pub use issue::{
    compare_keys, Attachment, IssueLink, LinkDirection, SourceComment, SourceIssue, SourceUser,
};
pub use snapshot::SnapshotSource;

use crate::releases::ReleasePolicy;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct SourcePage {
    /// Issues on this page.
    pub issues: Vec<SourceIssue>,

    /// Whether further pages exist.
    pub has_more: bool,
}

/// A release as known to the source tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseVersion {
    /// Release name, matching issue fix versions.
    pub name: String,

    /// Scheduled or actual release date.
    #[serde(default)]
    pub release_date: Option<DateTime<Utc>>,

    /// Whether the release has shipped.
    #[serde(default)]
    pub released: bool,

    /// Free text description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Read access to the source tracker.
#[async_trait]
pub trait SourceTracker: Send + Sync {
    /// Returns one page of issues matching `query`, starting at `start_at`.
    async fn search(
        &self,
        query: &str,
        start_at: usize,
        max_results: usize,
    ) -> Result<SourcePage, SourceError>;

    /// Returns every release of the project.
    async fn versions(&self) -> Result<Vec<ReleaseVersion>, SourceError>;
}

/// Link to `key` on the source tracker's web UI.
#[must_use]
pub fn browse_url(base: &str, key: &str) -> String {
    format!("{}/{key}", base.trim_end_matches('/'))
}

/// Pages through `query` and returns all issues in stable key order.
///
/// # Errors
///
/// Returns [`SourceError`] if a page cannot be fetched or pagination stalls.
pub async fn collect_issues(
    tracker: &dyn SourceTracker,
    query: &str,
    page_size: usize,
    policy: ReleasePolicy,
) -> Result<Vec<SourceIssue>, SourceError> {
    let page_size = page_size.max(1);
    let mut issues = Vec::new();
    let mut start_at = 0;

    loop {
        let page = tracker.search(query, start_at, page_size).await?;
        debug!(start_at, count = page.issues.len(), has_more = page.has_more, "Fetched page");

        if page.issues.is_empty() {
            if page.has_more {
                return Err(SourceError::StalledPagination { start_at });
            }
            break;
        }

        start_at += page.issues.len();
        issues.extend(
            page.issues
                .into_iter()
                .map(|issue| issue.with_release_policy(policy)),
        );
        if !page.has_more {
            break;
        }
    }

    issues.sort_by(|a, b| compare_keys(&a.key, &b.key));
    issues.dedup_by(|a, b| a.key == b.key);
    info!(count = issues.len(), "Collected source issues");
    Ok(issues)
}
