//! Orchestrator stages.

use std::fmt;

/// Stage of a migration run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Load source issues and map their participants to target logins.
    CollectUsers,
    /// Prepare the repository and make sure every release has a milestone.
    ResolveMilestones,
    /// Build import payloads and create their labels.
    BuildPayloads,
    /// Import issues the ledger does not know yet.
    ImportPrimary,
    /// Import one holder issue per backport milestone.
    ConsolidateBackports,
    /// Comment on imported issues with their related issues.
    CrossLinkIssues,
    Done,
}

impl Stage {
    /// The stage that follows a successful stage.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::CollectUsers => Self::ResolveMilestones,
            Self::ResolveMilestones => Self::BuildPayloads,
            Self::BuildPayloads => Self::ImportPrimary,
            Self::ImportPrimary => Self::ConsolidateBackports,
            Self::ConsolidateBackports => Self::CrossLinkIssues,
            Self::CrossLinkIssues | Self::Done => Self::Done,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CollectUsers => "collect-users",
            Self::ResolveMilestones => "resolve-milestones",
            Self::BuildPayloads => "build-payloads",
            Self::ImportPrimary => "import-primary",
            Self::ConsolidateBackports => "consolidate-backports",
            Self::CrossLinkIssues => "cross-link-issues",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}
