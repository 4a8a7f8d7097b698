//! Import payload construction.

use super::users::UserDirectory;
use crate::backports::IntegrityProblem;
use crate::labels::LabelRuleSet;
use crate::ledger::LedgerSubject;
use crate::markup::MarkupConverter;
use crate::source::{browse_url, SourceIssue};
use crate::target::{ImportComment, ImportJob, IssuePayload, MilestoneIndex};
use crate::templates::{IssueBody, TemplateError, TemplateRenderer};
use tracing::debug_span;

/// An import job together with the integrity problems found building it.
#[derive(Debug, Clone)]
pub struct BuiltPayload {
    pub job: ImportJob,
    pub problems: Vec<IntegrityProblem>,
}

/// Turns source issues into import jobs.
pub struct PayloadBuilder<'a> {
    pub renderer: &'a TemplateRenderer,
    pub markup: &'a dyn MarkupConverter,
    pub labels: &'a LabelRuleSet,
    pub users: &'a UserDirectory,
    pub milestones: &'a MilestoneIndex,
    pub closed_statuses: &'a [String],
    pub browse_base: &'a str,
}

impl PayloadBuilder<'_> {
    /// Builds the import job for `issue`.
    ///
    /// A primary release without a target milestone is reported as an
    /// integrity problem and the issue is imported without a milestone.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if the body or a comment cannot be rendered.
    pub fn build(&self, issue: &SourceIssue) -> Result<BuiltPayload, TemplateError> {
        let _span = debug_span!("payload", key = %issue.key).entered();
        let mut problems = Vec::new();

        let milestone = match issue.releases.primary.as_deref() {
            Some(release) => match self.milestones.get(release) {
                Some(milestone) => Some(milestone.number),
                None => {
                    problems.push(IntegrityProblem {
                        subject: LedgerSubject::Issue(issue.key.clone()),
                        reason: format!("fix version '{release}' has no target milestone"),
                    });
                    None
                }
            },
            None => None,
        };

        let closed = self
            .closed_statuses
            .iter()
            .any(|status| status.eq_ignore_ascii_case(&issue.status));

        let job = ImportJob {
            issue: IssuePayload {
                title: issue.summary.clone(),
                body: self.body(issue)?,
                created_at: issue.created,
                updated_at: Some(issue.updated),
                closed_at: closed.then(|| issue.resolved.unwrap_or(issue.updated)),
                assignee: issue
                    .assignee
                    .as_ref()
                    .and_then(|user| self.users.login(user))
                    .map(str::to_string),
                milestone,
                closed,
                labels: self.labels.labels_for(issue).into_iter().collect(),
            },
            comments: self.comments(issue)?,
        };

        Ok(BuiltPayload { job, problems })
    }

    fn body(&self, issue: &SourceIssue) -> Result<String, TemplateError> {
        let description = match issue.description.as_deref() {
            Some(text) => self.markup.convert(text),
            None => String::new(),
        };
        let reporter = issue
            .reporter
            .as_ref()
            .map(|user| self.users.attribution(user, self.markup));
        let source_url = browse_url(self.browse_base, &issue.key);

        self.renderer.render_issue_body(&IssueBody {
            reporter: reporter.as_deref(),
            key: &issue.key,
            source_url: &source_url,
            description: &description,
            fix_versions: &issue.releases.sorted,
            backports: &issue.releases.backports,
            footer: self.footer(issue),
        })
    }

    fn footer(&self, issue: &SourceIssue) -> Vec<String> {
        let mut lines = Vec::new();

        if !issue.attachments.is_empty() {
            let links: Vec<_> = issue
                .attachments
                .iter()
                .map(|a| self.markup.link(&a.name, &a.url))
                .collect();
            lines.push(format!("**Attachments:** {}", links.join(", ")));
        }
        if !issue.references.is_empty() {
            let links: Vec<_> = issue
                .references
                .iter()
                .map(|url| self.markup.link(url, url))
                .collect();
            lines.push(format!("**Referenced from:** {}", links.join(", ")));
        }
        if issue.votes > 0 || issue.watchers > 0 {
            lines.push(format!("{} votes, {} watchers", issue.votes, issue.watchers));
        }

        lines
    }

    fn comments(&self, issue: &SourceIssue) -> Result<Vec<ImportComment>, TemplateError> {
        issue
            .comments
            .iter()
            .map(|comment| {
                let author = comment
                    .author
                    .as_ref()
                    .map(|user| self.users.attribution(user, self.markup));
                let body = self.markup.convert(&comment.body);
                Ok(ImportComment {
                    created_at: comment.created,
                    body: self.renderer.render_comment(author.as_deref(), &body)?,
                })
            })
            .collect()
    }
}
