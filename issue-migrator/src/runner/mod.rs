//! Orchestrates a migration run.
//!
//! A run walks the [`Stage`]s in order. Only [`RunnerError`]s stop it;
//! failed imports, failed comments and integrity problems are recorded in
//! the ledger and the run moves on. Primary import is the one gate: if any
//! collected issue is still missing from the ledger afterwards, the run
//! halts before creating backport holders that would reference it.

mod config;
mod error;
mod milestones;
mod payload;
mod preview;
mod progress;
mod stage;
mod users;

pub use config::RunnerConfig;
pub use error::RunnerError;
pub use milestones::{plan_milestones, resolve_milestones};
pub use payload::{BuiltPayload, PayloadBuilder};
pub use stage::Stage;
pub use users::UserDirectory;

use crate::backports::BackportConsolidator;
use crate::config::{resolve_token, MigrationConfig};
use crate::import_job::ImportJobClient;
use crate::labels::LabelRuleSet;
use crate::ledger::{Ledger, LedgerSubject, Outcome};
use crate::markup::{BasicMarkup, MarkupConverter};
use crate::rate_limit::{Clock, RateLimitedTransport, SystemClock};
use crate::source::{
    browse_url, collect_issues, ReleaseVersion, SnapshotSource, SourceIssue, SourceTracker,
};
use crate::summary::RunSummary;
use crate::target::{
    ApiError, GitHubApi, ImportJob, MilestoneIndex, NewLabel, OctocrabTransport, TargetApi,
};
use crate::templates::{IssueReference, TemplateRenderer};
use octocrab::Octocrab;
use progress::Progress;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

const DEFAULT_PROFILE_BASE: &str = "https://github.com";

/// External systems a run talks to.
pub struct Collaborators {
    pub target: Arc<dyn TargetApi>,
    pub source: Arc<dyn SourceTracker>,
    pub markup: Arc<dyn MarkupConverter>,
    pub clock: Arc<dyn Clock>,
}

/// State carried between stages.
struct RunState {
    progress: Progress,
    issues: Vec<SourceIssue>,
    versions: Vec<ReleaseVersion>,
    users: UserDirectory,
    milestones: MilestoneIndex,
    /// Payloads of issues still to import, in key order.
    payloads: Vec<(String, ImportJob)>,
}

/// Orchestrates a full migration run.
pub struct Runner {
    config: MigrationConfig,
    dry_run: bool,
    target: Arc<dyn TargetApi>,
    source: Arc<dyn SourceTracker>,
    markup: Arc<dyn MarkupConverter>,
    jobs: ImportJobClient,
    renderer: TemplateRenderer,
    labels: LabelRuleSet,
}

impl Runner {
    /// Builds a runner against GitHub from a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the configuration, token, source snapshot,
    /// templates or API client cannot be set up.
    pub fn new(options: RunnerConfig) -> Result<Self, RunnerError> {
        let config = MigrationConfig::load(options.config_path())?;
        let token = resolve_token(options.token(), &config)?;

        let mut builder = Octocrab::builder().personal_token(token);
        if let Some(api_url) = &config.target.api_url {
            builder = builder.base_uri(api_url.as_str())?;
        }
        let octocrab = builder.build()?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let transport = RateLimitedTransport::new(
            Arc::new(OctocrabTransport::new(octocrab)),
            Arc::clone(&clock),
            config.throttle.settings(),
        );
        let target = Arc::new(GitHubApi::new(
            transport,
            &config.target.owner,
            &config.target.repository,
        ));
        let source = Arc::new(SnapshotSource::open(&config.source.snapshot)?);

        Self::with_collaborators(
            config,
            options.dry_run(),
            Collaborators {
                target,
                source,
                markup: Arc::new(BasicMarkup),
                clock,
            },
        )
    }

    /// Builds a runner from an already loaded configuration and collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Template`] if a configured template does not compile.
    pub fn with_collaborators(
        config: MigrationConfig,
        dry_run: bool,
        collaborators: Collaborators,
    ) -> Result<Self, RunnerError> {
        let renderer = TemplateRenderer::with_config(&config.templates)?;
        let labels = LabelRuleSet::from(config.labels.clone());
        let jobs = ImportJobClient::new(
            Arc::clone(&collaborators.target),
            collaborators.clock,
            config.throttle.poll_interval(),
        );

        Ok(Self {
            config,
            dry_run,
            target: collaborators.target,
            source: collaborators.source,
            markup: collaborators.markup,
            jobs,
            renderer,
            labels,
        })
    }

    /// Executes the full orchestration flow.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] only for fatal conditions; see the module docs.
    pub async fn run(&self) -> Result<RunSummary, RunnerError> {
        let ledger = Ledger::open(&self.config.ledger.directory)?;
        let mut state = RunState {
            progress: Progress::new(ledger, self.dry_run),
            issues: Vec::new(),
            versions: Vec::new(),
            users: UserDirectory::new(self.config.users.clone(), self.profile_base()),
            milestones: MilestoneIndex::default(),
            payloads: Vec::new(),
        };

        let mut stage = Stage::CollectUsers;
        while stage != Stage::Done {
            info!(%stage, "Starting stage");
            stage = match stage {
                Stage::CollectUsers => {
                    self.collect_users(&mut state).await?;
                    stage.next()
                }
                Stage::ResolveMilestones => {
                    self.resolve_milestones(&mut state).await?;
                    stage.next()
                }
                Stage::BuildPayloads => {
                    self.build_payloads(&mut state).await?;
                    if self.dry_run {
                        self.preview(&mut state)?;
                        Stage::Done
                    } else {
                        stage.next()
                    }
                }
                Stage::ImportPrimary => self.import_primary(&mut state).await?,
                Stage::ConsolidateBackports => {
                    self.consolidate_backports(&mut state).await?;
                    stage.next()
                }
                Stage::CrossLinkIssues => {
                    self.cross_link_issues(&mut state).await?;
                    stage.next()
                }
                Stage::Done => Stage::Done,
            };
        }

        let summary = state.progress.summary;
        info!(
            primary_imported = summary.primary_imported,
            primary_failed = summary.primary_failed,
            holders_imported = summary.holders_imported,
            holders_failed = summary.holders_failed,
            halted = summary.halted,
            "Migration run finished"
        );
        Ok(summary)
    }

    async fn collect_users(&self, state: &mut RunState) -> Result<(), RunnerError> {
        let source = &self.config.source;
        state.issues = collect_issues(
            self.source.as_ref(),
            &source.query,
            source.page_size,
            self.config.import.release_policy,
        )
        .await?;
        state.versions = self.source.versions().await?;

        let remaining = state.progress.ledger.remaining(&state.issues).len();
        state.progress.summary.issues_collected = state.issues.len();
        state.progress.summary.already_migrated = state.issues.len() - remaining;
        info!(
            collected = state.issues.len(),
            remaining,
            "Loaded source issues"
        );

        state.users.collect(&state.issues);
        Ok(())
    }

    async fn resolve_milestones(&self, state: &mut RunState) -> Result<(), RunnerError> {
        if !self.dry_run {
            self.prepare_repository(&state.progress.ledger).await?;
        }

        let planned = plan_milestones(&state.issues, &state.versions, &self.config.milestones);
        state.milestones = resolve_milestones(self.target.as_ref(), planned, self.dry_run)
            .await
            .map_err(|source| prepare("resolve milestones", source))?;
        Ok(())
    }

    async fn prepare_repository(&self, ledger: &Ledger) -> Result<(), RunnerError> {
        let target = &self.config.target;
        if !target.create_repository && !target.recreate_repository {
            return Ok(());
        }

        if !ledger.is_empty() {
            if target.recreate_repository {
                return Err(RunnerError::RecreateRefused {
                    entries: ledger.migrated_count(),
                });
            }
            debug!("Ledger has entries, keeping the existing repository");
            return Ok(());
        }

        if target.recreate_repository {
            info!(repository = %target.repository, "Deleting repository");
            self.target
                .delete_repository()
                .await
                .map_err(|source| prepare("delete the repository", source))?;
        }

        info!(repository = %target.repository, private = target.private, "Creating repository");
        self.target
            .create_repository(target.private)
            .await
            .map_err(|source| prepare("create the repository", source))
    }

    async fn build_payloads(&self, state: &mut RunState) -> Result<(), RunnerError> {
        let builder = PayloadBuilder {
            renderer: &self.renderer,
            markup: self.markup.as_ref(),
            labels: &self.labels,
            users: &state.users,
            milestones: &state.milestones,
            closed_statuses: &self.config.import.closed_statuses,
            browse_base: &self.config.source.browse_url,
        };

        for issue in state.progress.ledger.remaining(&state.issues) {
            match builder.build(issue) {
                Ok(built) => {
                    for problem in built.problems {
                        state.progress.integrity(problem)?;
                    }
                    state.payloads.push((issue.key.clone(), built.job));
                }
                Err(e) if self.dry_run => {
                    warn!(key = %issue.key, error = %e, "Payload would fail");
                }
                Err(e) => {
                    state
                        .progress
                        .record(LedgerSubject::Issue(issue.key.clone()), Outcome::Failed(e.to_string()))?;
                }
            }
        }
        info!(count = state.payloads.len(), "Built import payloads");

        if !self.dry_run {
            self.ensure_labels(&state.payloads).await?;
        }
        Ok(())
    }

    async fn ensure_labels(&self, payloads: &[(String, ImportJob)]) -> Result<(), RunnerError> {
        let names: BTreeSet<&str> = payloads
            .iter()
            .flat_map(|(_, job)| job.issue.labels.iter().map(String::as_str))
            .chain(self.config.import.backport_label.as_deref())
            .collect();

        for name in names {
            let definition = self.labels.definition(name);
            let label = NewLabel {
                name: definition.name,
                color: definition.color,
                description: definition.description,
            };
            self.target
                .create_label(&label)
                .await
                .map_err(|source| prepare(&format!("create label '{name}'"), source))?;
        }
        Ok(())
    }

    async fn import_primary(&self, state: &mut RunState) -> Result<Stage, RunnerError> {
        let jobs = std::mem::take(&mut state.payloads)
            .into_iter()
            .map(|(key, job)| (LedgerSubject::Issue(key), job))
            .collect();
        self.import_batched(jobs, &mut state.progress).await?;

        let remaining = state.progress.ledger.remaining(&state.issues).len();
        if remaining > 0 {
            let summary = &mut state.progress.summary;
            summary.halted = true;
            warn!(
                remaining,
                imported = summary.primary_imported,
                failed = summary.primary_failed,
                "Issues remain unmigrated, skipping backports and cross-links"
            );
            return Ok(Stage::Done);
        }
        Ok(Stage::ImportPrimary.next())
    }

    /// Submits jobs in checkpoint batches, awaiting each batch before the next.
    async fn import_batched(
        &self,
        jobs: Vec<(LedgerSubject, ImportJob)>,
        progress: &mut Progress,
    ) -> Result<(), RunnerError> {
        let checkpoint = self.config.import.checkpoint_size.max(1);
        let batches = jobs.len().div_ceil(checkpoint);

        for (index, batch) in jobs.chunks(checkpoint).enumerate() {
            let span = info_span!("checkpoint", batch = index + 1, of = batches, size = batch.len());

            async {
                let mut submitted = Vec::with_capacity(batch.len());
                for (subject, job) in batch {
                    match self.jobs.submit(job).await {
                        Ok(handle) => submitted.push((subject, handle)),
                        Err(e) => progress.record(subject.clone(), Outcome::Failed(e.to_string()))?,
                    }
                }

                for (subject, handle) in submitted {
                    let outcome = match self.jobs.wait(&handle).await {
                        Ok(number) => Outcome::Imported(number),
                        Err(e) => Outcome::Failed(e.to_string()),
                    };
                    progress.record(subject.clone(), outcome)?;
                }
                Ok::<(), RunnerError>(())
            }
            .instrument(span)
            .await?;
        }
        Ok(())
    }

    fn consolidator(&self) -> BackportConsolidator<'_> {
        BackportConsolidator::new(
            &self.renderer,
            self.markup.as_ref(),
            &self.config.source.browse_url,
        )
        .with_label(self.config.import.backport_label.as_deref())
    }

    async fn consolidate_backports(&self, state: &mut RunState) -> Result<(), RunnerError> {
        let consolidation =
            self.consolidator()
                .consolidate(&state.issues, &state.milestones, &state.progress.ledger);

        for problem in consolidation.problems {
            state.progress.integrity(problem)?;
        }
        state.progress.summary.holders_skipped += consolidation.skipped;
        for failure in consolidation.failures {
            state.progress.record(
                LedgerSubject::Holder(failure.milestone),
                Outcome::Failed(failure.reason),
            )?;
        }

        info!(
            holders = consolidation.jobs.len(),
            skipped = consolidation.skipped,
            "Importing backport holders"
        );
        let jobs = consolidation
            .jobs
            .into_iter()
            .map(|holder| (LedgerSubject::Holder(holder.milestone), holder.job))
            .collect();
        self.import_batched(jobs, &mut state.progress).await
    }

    async fn cross_link_issues(&self, state: &mut RunState) -> Result<(), RunnerError> {
        for issue in &state.issues {
            let ledger = &state.progress.ledger;
            let Some(number) = ledger.issue_number(&issue.key) else {
                continue;
            };
            if ledger.is_linked(&issue.key) {
                continue;
            }

            let references = self.cross_references(issue, ledger);
            if references.is_empty() {
                continue;
            }

            let subject = LedgerSubject::Link(issue.key.clone());
            let outcome = match self.renderer.render_cross_links(&references) {
                Ok(body) => {
                    let span = info_span!("cross_link", key = %issue.key, issue_number = number);
                    match self.target.create_comment(number, &body).instrument(span).await {
                        Ok(()) => Outcome::Imported(number),
                        Err(e) => Outcome::Failed(e.to_string()),
                    }
                }
                Err(e) => Outcome::Failed(e.to_string()),
            };
            state.progress.record(subject, outcome)?;
        }
        Ok(())
    }

    /// Parent and outward links of `issue`, by target number when migrated.
    fn cross_references(&self, issue: &SourceIssue, ledger: &Ledger) -> Vec<IssueReference> {
        let reference = |key: &str| match ledger.issue_number(key) {
            Some(number) => format!("#{number}"),
            None => self
                .markup
                .link(key, &browse_url(&self.config.source.browse_url, key)),
        };

        issue
            .parent
            .iter()
            .map(|parent| IssueReference {
                label: "sub-task of".to_string(),
                reference: reference(parent),
            })
            .chain(issue.outward_links().map(|link| IssueReference {
                label: link.kind.clone(),
                reference: reference(&link.key),
            }))
            .collect()
    }

    fn preview(&self, state: &mut RunState) -> Result<(), RunnerError> {
        let consolidation =
            self.consolidator()
                .consolidate(&state.issues, &state.milestones, &state.progress.ledger);
        for problem in consolidation.problems {
            state.progress.integrity(problem)?;
        }

        let repository = format!("{}/{}", self.config.target.owner, self.config.target.repository);
        preview::print_dry_run_preview(&repository, &state.payloads, &consolidation.jobs);
        Ok(())
    }

    /// Base URL of target user profiles, derived from the API URL.
    fn profile_base(&self) -> String {
        match &self.config.target.api_url {
            Some(api_url) => api_url
                .trim_end_matches('/')
                .trim_end_matches("/api/v3")
                .to_string(),
            None => DEFAULT_PROFILE_BASE.to_string(),
        }
    }
}

fn prepare(step: &str, source: ApiError) -> RunnerError {
    RunnerError::Prepare {
        step: step.to_string(),
        source,
    }
}
