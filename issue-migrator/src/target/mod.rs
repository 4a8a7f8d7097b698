//! Target tracker (GitHub) API.
//!
//! [`TargetApi`] names every operation the migration performs against the
//! target. [`GitHubApi`] implements it over a [`RateLimitedTransport`] so all
//! calls share one throttle.
//!
//! [`RateLimitedTransport`]: crate::rate_limit::RateLimitedTransport

mod error;
mod github;
mod milestones;
mod models;
mod transport;

pub use error::ApiError;
pub use github::GitHubApi;
pub use milestones::MilestoneIndex;
pub use models::{
    ImportComment, ImportErrorDetail, ImportJob, ImportStatus, IssuePayload, Milestone,
    NewLabel, NewMilestone,
};
pub use transport::{ApiRequest, ApiResponse, OctocrabTransport, Transport};

use async_trait::async_trait;

/// Write (and supporting read) operations on the target repository.
#[async_trait]
pub trait TargetApi: Send + Sync {
    /// Creates the target repository; succeeds if it already exists.
    async fn create_repository(&self, private: bool) -> Result<(), ApiError>;

    /// Deletes the target repository; succeeds if it does not exist.
    async fn delete_repository(&self) -> Result<(), ApiError>;

    /// Lists every milestone, open and closed.
    async fn list_milestones(&self) -> Result<Vec<Milestone>, ApiError>;

    /// Creates a milestone.
    async fn create_milestone(&self, milestone: &NewMilestone) -> Result<Milestone, ApiError>;

    /// Creates a label; succeeds if it already exists.
    async fn create_label(&self, label: &NewLabel) -> Result<(), ApiError>;

    /// Submits an import job, returning its initial status (with poll URL).
    async fn submit_import(&self, job: &ImportJob) -> Result<ImportStatus, ApiError>;

    /// Polls an import job by the URL returned from submission.
    async fn poll_import(&self, url: &str) -> Result<ImportStatus, ApiError>;

    /// Posts a comment on an existing issue.
    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<(), ApiError>;
}
