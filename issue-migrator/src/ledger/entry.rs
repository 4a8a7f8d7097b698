//! Ledger subjects, outcomes and failure log entries.

use std::fmt;

/// What a ledger record is about.
///
/// Regular issues and backport holders live in separate namespaces so that
/// their failures can be told apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LedgerSubject {
    /// A source issue, by key.
    Issue(String),

    /// A backport holder issue, by milestone title.
    Holder(String),

    /// The cross-link comment of a source issue, by key.
    Link(String),
}

impl LedgerSubject {
    /// Namespace tag written to the failure log.
    #[must_use]
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Issue(_) => "issue",
            Self::Holder(_) => "backport",
            Self::Link(_) => "link",
        }
    }

    /// Key or milestone title.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Issue(id) | Self::Holder(id) | Self::Link(id) => id,
        }
    }
}

impl fmt::Display for LedgerSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.namespace(), self.id())
    }
}

/// Result of one completed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The job created this target issue.
    Imported(u64),

    /// The job failed.
    Failed(String),
}

/// Kind of a failure log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// An import or comment job failed.
    Job,

    /// Data did not line up with configuration (unknown milestone, unresolved backport).
    Integrity,
}

impl FailureKind {
    pub(crate) fn tag(self) -> &'static str {
        match self {
            Self::Job => "failed",
            Self::Integrity => "integrity",
        }
    }

    pub(crate) fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "failed" => Some(Self::Job),
            "integrity" => Some(Self::Integrity),
            _ => None,
        }
    }
}

/// One line of the failure log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureEntry {
    /// RFC 3339 time the failure was recorded.
    pub recorded_at: String,

    /// Job failure or data-integrity problem.
    pub kind: FailureKind,

    /// Namespace tag (`issue`, `backport`, `link`).
    pub namespace: String,

    /// Key or milestone title.
    pub subject: String,

    /// Human readable reason.
    pub reason: String,
}

impl FailureEntry {
    /// Formats the entry as a single log line.
    pub(crate) fn to_line(&self) -> String {
        format!(
            "{} {} {} {}: {}",
            self.recorded_at,
            self.kind.tag(),
            self.namespace,
            self.subject,
            self.reason.replace(['\r', '\n'], " ")
        )
    }

    /// Parses a line written by [`FailureEntry::to_line`].
    pub(crate) fn parse(line: &str) -> Option<Self> {
        let mut parts = line.splitn(4, ' ');
        let recorded_at = parts.next()?.to_string();
        let kind = FailureKind::from_tag(parts.next()?)?;
        let namespace = parts.next()?.to_string();
        let (subject, reason) = parts.next()?.split_once(": ")?;

        Some(Self {
            recorded_at,
            kind,
            namespace,
            subject: subject.to_string(),
            reason: reason.to_string(),
        })
    }
}
