//! Milestone planning and resolution.

use crate::config::MilestoneOverride;
use crate::releases::compare_releases;
use crate::source::{ReleaseVersion, SourceIssue};
use crate::target::{ApiError, Milestone, MilestoneIndex, NewMilestone, TargetApi};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, info_span, Instrument};

/// Builds the milestones needed by `issues`, oldest release first.
///
/// Every primary and backport release gets a milestone. Dates, state and
/// description come from the configured override, then from the source
/// tracker's release metadata.
#[must_use]
pub fn plan_milestones(
    issues: &[SourceIssue],
    versions: &[ReleaseVersion],
    overrides: &BTreeMap<String, MilestoneOverride>,
) -> Vec<NewMilestone> {
    let needed: BTreeSet<&str> = issues
        .iter()
        .flat_map(|issue| {
            issue
                .releases
                .primary
                .iter()
                .chain(&issue.releases.backports)
                .map(String::as_str)
        })
        .collect();

    let mut names: Vec<&str> = needed.into_iter().collect();
    names.sort_by(|a, b| compare_releases(a, b));

    names
        .into_iter()
        .map(|name| {
            let version = versions.iter().find(|v| v.name == name);
            let custom = overrides.get(name);

            let released = custom
                .and_then(|o| o.released)
                .or_else(|| version.map(|v| v.released))
                .unwrap_or(false);

            NewMilestone {
                title: name.to_string(),
                state: if released { "closed" } else { "open" }.to_string(),
                description: custom
                    .and_then(|o| o.description.clone())
                    .or_else(|| version.and_then(|v| v.description.clone())),
                due_on: custom
                    .and_then(|o| o.due_on)
                    .or_else(|| version.and_then(|v| v.release_date)),
            }
        })
        .collect()
}

/// Lists existing milestones and creates the planned ones that are missing.
///
/// In a dry run missing milestones are not created; they are indexed with
/// number 0 so payloads can still be previewed.
///
/// # Errors
///
/// Returns [`ApiError`] if listing or creating fails.
pub async fn resolve_milestones(
    api: &dyn TargetApi,
    planned: Vec<NewMilestone>,
    dry_run: bool,
) -> Result<MilestoneIndex, ApiError> {
    let span = info_span!("resolve_milestones", planned = planned.len());

    async {
        let existing = match api.list_milestones().await {
            Err(e) if dry_run && e.is_not_found() => Vec::new(),
            other => other?,
        };
        let mut index = MilestoneIndex::new(existing);
        let mut created = 0usize;

        for milestone in planned {
            if index.contains(&milestone.title) {
                continue;
            }

            if dry_run {
                debug!(title = %milestone.title, "Would create milestone");
                index.insert(Milestone {
                    number: 0,
                    title: milestone.title,
                    state: milestone.state,
                    due_on: milestone.due_on,
                });
                continue;
            }

            let milestone = api.create_milestone(&milestone).await?;
            debug!(title = %milestone.title, number = milestone.number, "Created milestone");
            index.insert(milestone);
            created += 1;
        }

        info!(total = index.len(), created, "Resolved milestones");
        Ok(index)
    }
    .instrument(span)
    .await
}
