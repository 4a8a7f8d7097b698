//! Label rule kinds.

use crate::source::SourceIssue;
use serde::Deserialize;

/// Source issue field a [`LabelRule::FieldMatch`] inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueField {
    IssueType,
    Status,
    Resolution,
    Priority,
    /// Matches if any component matches.
    Component,
    /// Matches if any source label matches.
    Label,
}

impl IssueField {
    /// Returns true when the field holds `value`, ignoring case.
    #[must_use]
    pub fn matches(self, issue: &SourceIssue, value: &str) -> bool {
        let eq = |candidate: &str| candidate.eq_ignore_ascii_case(value);
        match self {
            Self::IssueType => eq(&issue.issue_type),
            Self::Status => eq(&issue.status),
            Self::Resolution => issue.resolution.as_deref().is_some_and(eq),
            Self::Priority => issue.priority.as_deref().is_some_and(eq),
            Self::Component => issue.components.iter().any(|c| eq(c)),
            Self::Label => issue.labels.iter().any(|l| eq(l)),
        }
    }
}

/// Condition over a whole issue for [`LabelRule::Predicate`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssuePredicate {
    VotesAtLeast(u32),
    WatchersAtLeast(u32),
    /// The issue has at least one backport release.
    HasBackports,
    /// The issue is a sub-task of another issue.
    IsSubTask,
    /// The issue has no resolution.
    Unresolved,
    /// The resolution is one of the listed values.
    ResolutionIn(Vec<String>),
    /// The status is one of the listed values.
    StatusIn(Vec<String>),
}

impl IssuePredicate {
    /// Evaluates the predicate.
    #[must_use]
    pub fn holds(&self, issue: &SourceIssue) -> bool {
        let contains = |values: &[String], candidate: &str| {
            values.iter().any(|v| v.eq_ignore_ascii_case(candidate))
        };
        match self {
            Self::VotesAtLeast(min) => issue.votes >= *min,
            Self::WatchersAtLeast(min) => issue.watchers >= *min,
            Self::HasBackports => !issue.releases.backports.is_empty(),
            Self::IsSubTask => issue.parent.is_some(),
            Self::Unresolved => issue.resolution.is_none(),
            Self::ResolutionIn(values) => issue
                .resolution
                .as_deref()
                .is_some_and(|r| contains(values, r)),
            Self::StatusIn(values) => contains(values, &issue.status),
        }
    }
}

/// Condition over a label name for [`LabelRule::Removal`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelPredicate {
    Prefix(String),
    Exact(String),
    AnyOf(Vec<String>),
}

impl LabelPredicate {
    /// Returns true when `label` matches.
    #[must_use]
    pub fn matches(&self, label: &str) -> bool {
        match self {
            Self::Prefix(prefix) => label.starts_with(prefix.as_str()),
            Self::Exact(name) => label == name,
            Self::AnyOf(names) => names.iter().any(|n| n == label),
        }
    }
}

/// One entry of the label rule table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LabelRule {
    /// Adds `labels` when `field` equals `value` (case-insensitive).
    FieldMatch {
        field: IssueField,
        value: String,
        labels: Vec<String>,
    },

    /// Adds `labels` when `when` holds.
    Predicate {
        when: IssuePredicate,
        labels: Vec<String>,
    },

    /// Drops `general` when `specific` is also present.
    Supersede { general: String, specific: String },

    /// Drops every label matching `remove` when `trigger` is present.
    Removal {
        trigger: String,
        remove: LabelPredicate,
    },
}
