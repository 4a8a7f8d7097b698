//! Backport holder issues.
//!
//! An issue fixed in several release lines is imported once, against its
//! primary release. Every older release line it was backported to gets a
//! single holder issue, titled after the milestone, that lists the
//! backported issues by their target numbers. Holders are built only after
//! every primary issue is recorded in the ledger.

mod group;

pub use group::{group_backports, BackportGroup, IntegrityProblem};

use crate::ledger::{Ledger, LedgerSubject};
use crate::markup::MarkupConverter;
use crate::source::{browse_url, SourceIssue};
use crate::target::{ImportJob, IssuePayload, MilestoneIndex};
use crate::templates::{IssueReference, TemplateRenderer};
use tracing::{debug, warn};

/// A holder issue ready for import.
#[derive(Debug, Clone)]
pub struct HolderJob {
    /// Milestone title, the holder's ledger key.
    pub milestone: String,
    pub job: ImportJob,
}

/// A holder that could not be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolderFailure {
    pub milestone: String,
    pub reason: String,
}

/// Result of [`BackportConsolidator::consolidate`].
#[derive(Debug, Default)]
pub struct Consolidation {
    /// Holders still to import.
    pub jobs: Vec<HolderJob>,

    /// Holders whose body could not be rendered.
    pub failures: Vec<HolderFailure>,

    /// Backported issues without a target number.
    pub problems: Vec<IntegrityProblem>,

    /// Holders already recorded in the ledger.
    pub skipped: usize,
}

/// Builds backport holder import jobs.
pub struct BackportConsolidator<'a> {
    renderer: &'a TemplateRenderer,
    markup: &'a dyn MarkupConverter,
    browse_base: &'a str,
    label: Option<&'a str>,
}

impl<'a> BackportConsolidator<'a> {
    /// Creates a consolidator.
    ///
    /// # Arguments
    ///
    /// * `renderer` - Renders holder bodies
    /// * `markup` - Produces links for unmigrated issues
    /// * `browse_base` - Source tracker browse URL
    #[must_use]
    pub fn new(
        renderer: &'a TemplateRenderer,
        markup: &'a dyn MarkupConverter,
        browse_base: &'a str,
    ) -> Self {
        Self {
            renderer,
            markup,
            browse_base,
            label: None,
        }
    }

    /// Adds `label` to every holder issue.
    #[must_use]
    pub fn with_label(mut self, label: Option<&'a str>) -> Self {
        self.label = label;
        self
    }

    /// Builds one holder job per backport milestone not yet in the ledger.
    ///
    /// Issue numbers are looked up in `ledger`; an issue without one is listed
    /// by its source link and reported as an integrity problem.
    #[must_use]
    pub fn consolidate(
        &self,
        issues: &[SourceIssue],
        milestones: &MilestoneIndex,
        ledger: &Ledger,
    ) -> Consolidation {
        let mut consolidation = Consolidation::default();

        for group in group_backports(issues, milestones) {
            let title = &group.milestone.title;
            if let Some(number) = ledger.holder_number(title) {
                debug!(milestone = %title, issue_number = number, "Holder already migrated");
                consolidation.skipped += 1;
                continue;
            }

            let references: Vec<IssueReference> = group
                .issues
                .iter()
                .map(|issue| {
                    let reference = match ledger.issue_number(&issue.key) {
                        Some(number) => format!("#{number}"),
                        None => {
                            warn!(key = %issue.key, milestone = %title, "Backported issue has no target number");
                            consolidation.problems.push(IntegrityProblem {
                                subject: LedgerSubject::Holder(title.clone()),
                                reason: format!("{} has no migrated issue number", issue.key),
                            });
                            self.markup
                                .link(&issue.key, &browse_url(self.browse_base, &issue.key))
                        }
                    };
                    IssueReference {
                        label: issue.summary.clone(),
                        reference,
                    }
                })
                .collect();

            match self.renderer.render_holder_body(title, &references) {
                Ok(body) => consolidation.jobs.push(HolderJob {
                    milestone: title.clone(),
                    job: self.holder_job(&group, body),
                }),
                Err(e) => consolidation.failures.push(HolderFailure {
                    milestone: title.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        consolidation
    }

    fn holder_job(&self, group: &BackportGroup<'_>, body: String) -> ImportJob {
        let milestone = group.milestone;
        let created_at = milestone
            .due_on
            .or_else(|| group.issues.iter().map(|i| i.created).max())
            .unwrap_or_default();
        let closed = milestone.is_closed();
        let closed_at = closed.then(|| {
            milestone
                .due_on
                .or_else(|| group.issues.iter().map(|i| i.resolved.unwrap_or(i.updated)).max())
                .unwrap_or(created_at)
        });

        ImportJob {
            issue: IssuePayload {
                title: milestone.title.clone(),
                body,
                created_at,
                updated_at: closed_at,
                closed_at,
                assignee: None,
                milestone: Some(milestone.number),
                closed,
                labels: self.label.map(str::to_string).into_iter().collect(),
            },
            comments: Vec::new(),
        }
    }
}
