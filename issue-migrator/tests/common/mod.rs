#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use issue_migrator::config::MigrationConfig;
use issue_migrator::rate_limit::ManualClock;
use issue_migrator::runner::{Collaborators, Runner};
use issue_migrator::source::{ReleaseVersion, SnapshotSource, SourceIssue};
use issue_migrator::target::{
    ApiError, ImportErrorDetail, ImportJob, ImportStatus, Milestone, NewLabel, NewMilestone,
    TargetApi,
};
use issue_migrator::BasicMarkup;
use serde_json::json;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub const BROWSE: &str = "https://jira.example.com/browse";

#[derive(Debug, Default)]
pub struct FakeState {
    pub repository_created: bool,
    pub repository_deleted: bool,
    pub milestones: Vec<Milestone>,
    pub labels: Vec<String>,
    /// Every accepted submission, in order.
    pub submitted: Vec<ImportJob>,
    /// Created issues by number.
    pub issues: BTreeMap<u64, ImportJob>,
    pub comments: Vec<(u64, String)>,
    /// `submit <title>` and `poll <title>` in call order.
    pub events: Vec<String>,
    /// Titles whose submission is rejected.
    pub rejected: HashSet<String>,
    /// Titles whose import is reported as failed.
    pub failing: HashSet<String>,
    imports: HashMap<u64, (ImportJob, u32, Option<u64>)>,
    next_import: u64,
    next_issue: u64,
}

/// In-memory GitHub repository with an asynchronous import endpoint.
///
/// Every import is pending on its first poll and done on the second.
#[derive(Debug, Default)]
pub struct FakeTarget {
    state: Mutex<FakeState>,
}

impl FakeTarget {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn reject(&self, title: &str) {
        self.state().rejected.insert(title.to_string());
    }

    pub fn fail(&self, title: &str) {
        self.state().failing.insert(title.to_string());
    }

    pub fn allow_all(&self) {
        let mut state = self.state();
        state.rejected.clear();
        state.failing.clear();
    }

    pub fn submitted_titles(&self) -> Vec<String> {
        self.state()
            .submitted
            .iter()
            .map(|job| job.issue.title.clone())
            .collect()
    }

    pub fn issue_titled(&self, title: &str) -> Option<(u64, ImportJob)> {
        self.state()
            .issues
            .iter()
            .find(|(_, job)| job.issue.title == title)
            .map(|(number, job)| (*number, job.clone()))
    }
}

#[async_trait]
impl TargetApi for FakeTarget {
    async fn create_repository(&self, _private: bool) -> Result<(), ApiError> {
        self.state().repository_created = true;
        Ok(())
    }

    async fn delete_repository(&self) -> Result<(), ApiError> {
        self.state().repository_deleted = true;
        Ok(())
    }

    async fn list_milestones(&self) -> Result<Vec<Milestone>, ApiError> {
        Ok(self.state().milestones.clone())
    }

    async fn create_milestone(&self, milestone: &NewMilestone) -> Result<Milestone, ApiError> {
        let mut state = self.state();
        let created = Milestone {
            number: state.milestones.len() as u64 + 1,
            title: milestone.title.clone(),
            state: milestone.state.clone(),
            due_on: milestone.due_on,
        };
        state.milestones.push(created.clone());
        Ok(created)
    }

    async fn create_label(&self, label: &NewLabel) -> Result<(), ApiError> {
        let mut state = self.state();
        if !state.labels.contains(&label.name) {
            state.labels.push(label.name.clone());
        }
        Ok(())
    }

    async fn submit_import(&self, job: &ImportJob) -> Result<ImportStatus, ApiError> {
        let mut state = self.state();
        if state.rejected.contains(&job.issue.title) {
            return Err(ApiError::Status {
                path: "/repos/example/project/import/issues".to_string(),
                status: 422,
                message: "Validation Failed".to_string(),
            });
        }

        state.events.push(format!("submit {}", job.issue.title));
        state.next_import += 1;
        let id = state.next_import;
        state.submitted.push(job.clone());
        state.imports.insert(id, (job.clone(), 0, None));
        Ok(status(id, "pending", None))
    }

    async fn poll_import(&self, url: &str) -> Result<ImportStatus, ApiError> {
        let id: u64 = url.rsplit('/').next().unwrap().parse().unwrap();
        let mut guard = self.state();
        let state = &mut *guard;
        let (job, polls, number) = state.imports.get_mut(&id).unwrap();

        state.events.push(format!("poll {}", job.issue.title));
        *polls += 1;
        if *polls == 1 {
            return Ok(status(id, "pending", None));
        }
        if state.failing.contains(&job.issue.title) {
            let mut failed = status(id, "failed", None);
            failed.errors.push(ImportErrorDetail {
                field: Some("title".to_string()),
                code: Some("invalid".to_string()),
                ..ImportErrorDetail::default()
            });
            return Ok(failed);
        }

        let assigned = match *number {
            Some(assigned) => assigned,
            None => {
                state.next_issue += 1;
                *number = Some(state.next_issue);
                state.issues.insert(state.next_issue, job.clone());
                state.next_issue
            }
        };
        Ok(status(
            id,
            "imported",
            Some(format!(
                "https://api.github.com/repos/example/project/issues/{assigned}"
            )),
        ))
    }

    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<(), ApiError> {
        self.state().comments.push((issue_number, body.to_string()));
        Ok(())
    }
}

fn status(id: u64, status: &str, issue_url: Option<String>) -> ImportStatus {
    ImportStatus {
        id: Some(id),
        status: status.to_string(),
        url: Some(format!(
            "https://api.github.com/repos/example/project/import/issues/{id}"
        )),
        issue_url,
        errors: Vec::new(),
    }
}

pub fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(1_600_000_000, 0).unwrap()
}

/// Source issue with the given fix versions and extra JSON fields.
pub fn issue(key: &str, versions: &[&str], extra: serde_json::Value) -> SourceIssue {
    let mut value = json!({
        "key": key,
        "summary": format!("Summary of {key}"),
        "description": format!("Description of {key}"),
        "created": "2014-05-13T22:13:20Z",
        "updated": "2014-05-15T01:33:20Z",
        "status": "Closed",
        "issue_type": "Bug",
        "fix_versions": versions,
        "reporter": { "name": "rwinch", "display_name": "Rob Winch" },
    });
    if let (Some(base), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
        base.extend(extra.clone());
    }
    serde_json::from_value(value).unwrap()
}

/// Minimal configuration with the ledger in `ledger_dir`.
pub fn config(ledger_dir: &Path) -> MigrationConfig {
    let mut config: MigrationConfig = toml::from_str(&format!(
        r#"
[source]
snapshot = "unused.json"
browse-url = "{BROWSE}"

[target]
owner = "example"
repository = "project"

[import]
checkpoint-size = 2
backport-label = "type: backport"

[users]
rwinch = "rwinch"

[[labels.rule]]
kind = "field-match"
field = "issue-type"
value = "bug"
labels = ["type: bug"]
"#
    ))
    .unwrap();
    config.ledger.directory = ledger_dir.to_path_buf();
    config
}

pub fn runner(
    config: MigrationConfig,
    issues: Vec<SourceIssue>,
    target: &Arc<FakeTarget>,
    clock: &Arc<ManualClock>,
    dry_run: bool,
) -> Runner {
    let versions = vec![ReleaseVersion {
        name: "4.3.19".to_string(),
        release_date: Some(start()),
        released: true,
        description: None,
    }];
    Runner::with_collaborators(
        config,
        dry_run,
        Collaborators {
            target: Arc::clone(target) as Arc<dyn TargetApi>,
            source: Arc::new(SnapshotSource::from_parts(versions, issues)),
            markup: Arc::new(BasicMarkup),
            clock: Arc::clone(clock) as _,
        },
    )
    .unwrap()
}
