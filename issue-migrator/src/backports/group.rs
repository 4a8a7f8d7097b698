//! Grouping of issues by backport milestone.

use crate::ledger::LedgerSubject;
use crate::releases::compare_releases;
use crate::source::SourceIssue;
use crate::target::{Milestone, MilestoneIndex};
use std::collections::HashMap;
use tracing::warn;

/// Issues backported to one milestone.
#[derive(Debug, Clone)]
pub struct BackportGroup<'a> {
    pub milestone: &'a Milestone,

    /// Grouped issues, in source key order.
    pub issues: Vec<&'a SourceIssue>,
}

/// Data that does not line up with the target's configuration.
///
/// Integrity problems are logged but never stop a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityProblem {
    pub subject: LedgerSubject,
    pub reason: String,
}

/// Groups issues by each backport release that has a target milestone.
///
/// Returns the groups newest release first. Milestones are planned for every
/// backport release, so a release missing from `milestones` is only logged.
#[must_use]
pub fn group_backports<'a>(
    issues: &'a [SourceIssue],
    milestones: &'a MilestoneIndex,
) -> Vec<BackportGroup<'a>> {
    let mut groups: HashMap<&str, BackportGroup<'a>> = HashMap::new();

    for issue in issues {
        for release in &issue.releases.backports {
            let Some(milestone) = milestones.get(release) else {
                warn!(key = %issue.key, release = %release, "Backport release has no milestone");
                continue;
            };

            groups
                .entry(milestone.title.as_str())
                .or_insert_with(|| BackportGroup {
                    milestone,
                    issues: Vec::new(),
                })
                .issues
                .push(issue);
        }
    }

    let mut groups: Vec<_> = groups.into_values().collect();
    groups.sort_by(|a, b| compare_releases(&b.milestone.title, &a.milestone.title));
    groups
}
