//! Wire types for the GitHub issue import and repository APIs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The issue part of an import request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuePayload {
    /// Issue title.
    pub title: String,

    /// Converted body text.
    pub body: String,

    /// Original creation time.
    pub created_at: DateTime<Utc>,

    /// Original last update time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Close time, for closed issues.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,

    /// Target login of the assignee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// Target milestone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,

    /// Whether the issue is imported closed.
    pub closed: bool,

    /// Label names.
    #[serde(default)]
    pub labels: Vec<String>,
}

/// A comment imported together with its issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportComment {
    /// Original creation time.
    pub created_at: DateTime<Utc>,

    /// Converted comment text.
    pub body: String,
}

/// One issue plus its comments, submitted as a single asynchronous import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportJob {
    /// Issue payload.
    pub issue: IssuePayload,

    /// Comments, oldest first.
    #[serde(default)]
    pub comments: Vec<ImportComment>,
}

/// Status document returned when submitting or polling an import.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportStatus {
    /// Import identifier.
    #[serde(default)]
    pub id: Option<u64>,

    /// `pending`, `imported` or `failed`.
    pub status: String,

    /// URL to poll for this import.
    #[serde(default)]
    pub url: Option<String>,

    /// URL of the created issue once imported.
    #[serde(default)]
    pub issue_url: Option<String>,

    /// Validation errors for failed imports.
    #[serde(default)]
    pub errors: Vec<ImportErrorDetail>,
}

impl ImportStatus {
    /// Returns true when the server reports the import as failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status.eq_ignore_ascii_case("failed")
    }

    /// Joins the reported errors into a single line.
    #[must_use]
    pub fn failure_reason(&self) -> String {
        if self.errors.is_empty() {
            return format!("import {}", self.status);
        }
        self.errors
            .iter()
            .map(ImportErrorDetail::describe)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// One validation error reported for a failed import.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportErrorDetail {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub code: Option<String>,
}

impl ImportErrorDetail {
    fn describe(&self) -> String {
        let location = self
            .location
            .as_deref()
            .or(self.field.as_deref())
            .unwrap_or("issue");
        let code = self.code.as_deref().unwrap_or("invalid");
        match &self.value {
            Some(value) if !value.is_null() => format!("{location}: {code} ({value})"),
            _ => format!("{location}: {code}"),
        }
    }
}

/// A milestone as returned by the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    /// Milestone number used in issue payloads.
    pub number: u64,

    /// Milestone title (the release name).
    pub title: String,

    /// `open` or `closed`.
    #[serde(default)]
    pub state: String,

    /// Due date.
    #[serde(default)]
    pub due_on: Option<DateTime<Utc>>,
}

impl Milestone {
    /// Returns true when the milestone's release has shipped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.eq_ignore_ascii_case("closed")
    }
}

/// A milestone to create.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMilestone {
    pub title: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<DateTime<Utc>>,
}

/// A label to create.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLabel {
    pub name: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
