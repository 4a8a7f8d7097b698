//! Source issue snapshot.

use crate::releases::{ReleaseLines, ReleasePolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A user of the source tracker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceUser {
    /// Login name (stable identifier).
    pub name: String,

    /// Full name shown in attribution.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl SourceUser {
    /// Name to show in attribution text.
    #[must_use]
    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Direction of an issue link relative to the issue holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkDirection {
    Outward,
    Inward,
}

/// A typed link to another source issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLink {
    /// Relationship phrase, e.g. `depends on` or `is superseded by`.
    pub kind: String,

    /// Whether this issue is the link's origin.
    pub direction: LinkDirection,

    /// Key of the linked issue.
    pub key: String,
}

/// A comment on a source issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceComment {
    #[serde(default)]
    pub author: Option<SourceUser>,
    pub body: String,
    pub created: DateTime<Utc>,
}

/// A file attached to a source issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Immutable snapshot of one source issue, fetched once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceIssue {
    pub key: String,
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub resolved: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reporter: Option<SourceUser>,
    #[serde(default)]
    pub assignee: Option<SourceUser>,
    pub status: String,
    #[serde(default)]
    pub resolution: Option<String>,
    pub issue_type: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub components: Vec<String>,
    /// Fix versions as reported by the source, unsorted.
    #[serde(default)]
    pub fix_versions: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub links: Vec<IssueLink>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<String>,
    #[serde(default)]
    pub votes: u32,
    #[serde(default)]
    pub watchers: u32,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// External reference URLs (pull requests, commits, forum threads).
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub comments: Vec<SourceComment>,

    /// Sorted releases with primary and backports, derived at load time.
    #[serde(skip)]
    pub releases: ReleaseLines,
}

impl SourceIssue {
    /// Derives [`SourceIssue::releases`] from the fix versions.
    #[must_use]
    pub fn with_release_policy(mut self, policy: ReleasePolicy) -> Self {
        self.releases = ReleaseLines::derive(&self.fix_versions, policy);
        self
    }

    /// Outward links, i.e. relationships this issue asserts about others.
    pub fn outward_links(&self) -> impl Iterator<Item = &IssueLink> {
        self.links
            .iter()
            .filter(|link| link.direction == LinkDirection::Outward)
    }

    /// Every user who reported, is assigned to, or commented on the issue.
    pub fn participants(&self) -> impl Iterator<Item = &SourceUser> {
        self.reporter
            .iter()
            .chain(self.assignee.iter())
            .chain(self.comments.iter().filter_map(|c| c.author.as_ref()))
    }
}

/// Orders keys by project prefix, then numerically by their suffix.
#[must_use]
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    let split = |key: &str| -> (String, Option<u64>) {
        match key.rsplit_once('-') {
            Some((project, number)) => (project.to_string(), number.parse().ok()),
            None => (key.to_string(), None),
        }
    };
    let (a_project, a_number) = split(a);
    let (b_project, b_number) = split(b);

    a_project
        .cmp(&b_project)
        .then_with(|| a_number.cmp(&b_number))
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_order_numerically_within_project() {
        let mut keys = vec!["SEC-10", "SEC-9", "DATA-100", "SEC-1"];
        keys.sort_by(|a, b| compare_keys(a, b));
        assert_eq!(keys, vec!["DATA-100", "SEC-1", "SEC-9", "SEC-10"]);
    }

    #[test]
    fn derives_releases_from_fix_versions() {
        let json = r#"{
            "key": "SEC-1",
            "summary": "Crash",
            "created": "2015-01-01T00:00:00Z",
            "updated": "2015-01-02T00:00:00Z",
            "status": "Closed",
            "issue_type": "Bug",
            "fix_versions": ["4.3.19", "5.1-RC2", "5.0.9"]
        }"#;

        let issue: SourceIssue = serde_json::from_str(json).unwrap();
        let issue = issue.with_release_policy(ReleasePolicy::ExcludePreRelease);

        assert_eq!(issue.releases.primary.as_deref(), Some("5.0.9"));
        assert_eq!(issue.releases.backports, vec!["4.3.19".to_string()]);
    }
}
