//! [`TargetApi`] implementation for the GitHub REST API.

use super::{
    ApiError, ApiRequest, ImportJob, ImportStatus, Milestone, NewLabel, NewMilestone, TargetApi,
};
use crate::rate_limit::RateLimitedTransport;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

/// Media type required by the issue import endpoints.
const IMPORT_ACCEPT: &str = "application/vnd.github.golden-comet-preview+json";

/// Page size used when listing milestones.
const MILESTONES_PER_PAGE: usize = 100;

/// GitHub repository endpoint set, throttled through one transport.
pub struct GitHubApi {
    transport: RateLimitedTransport,
    owner: String,
    repository: String,
}

impl GitHubApi {
    /// Creates an API bound to `owner/repository`.
    #[must_use]
    pub fn new(
        transport: RateLimitedTransport,
        owner: impl Into<String>,
        repository: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            owner: owner.into(),
            repository: repository.into(),
        }
    }

    /// Returns `owner/repository`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repository)
    }

    fn repo_path(&self, suffix: &str) -> String {
        format!("/repos/{}/{}{}", self.owner, self.repository, suffix)
    }

    async fn call_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ApiError> {
        let response = self.transport.call(request).await?;
        serde_json::from_str(&response.body).map_err(|source| ApiError::Decode {
            path: request.path.clone(),
            source,
        })
    }
}

#[async_trait]
impl TargetApi for GitHubApi {
    async fn create_repository(&self, private: bool) -> Result<(), ApiError> {
        let body = json!({
            "name": self.repository,
            "private": private,
            "has_issues": true,
        });

        let org_request = ApiRequest::post(format!("/orgs/{}/repos", self.owner), body.clone());
        let result = match self.transport.call(&org_request).await {
            Err(e) if e.is_not_found() => {
                debug!(owner = %self.owner, "Owner is not an organization, creating user repository");
                self.transport
                    .call(&ApiRequest::post("/user/repos", body))
                    .await
            }
            other => other,
        };

        match result {
            Ok(_) => {
                info!(repo = %self.full_name(), "Repository created");
                Ok(())
            }
            Err(e) if e.is_already_exists() => {
                debug!(repo = %self.full_name(), "Repository already exists");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_repository(&self) -> Result<(), ApiError> {
        match self.transport.call(&ApiRequest::delete(self.repo_path(""))).await {
            Ok(_) => {
                info!(repo = %self.full_name(), "Repository deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn list_milestones(&self) -> Result<Vec<Milestone>, ApiError> {
        let mut milestones = Vec::new();
        let mut page = 1;
        loop {
            let request = ApiRequest::get(self.repo_path(&format!(
                "/milestones?state=all&per_page={MILESTONES_PER_PAGE}&page={page}"
            )));
            let batch: Vec<Milestone> = self.call_json(&request).await?;
            let done = batch.len() < MILESTONES_PER_PAGE;
            milestones.extend(batch);
            if done {
                return Ok(milestones);
            }
            page += 1;
        }
    }

    async fn create_milestone(&self, milestone: &NewMilestone) -> Result<Milestone, ApiError> {
        let request = ApiRequest::post(self.repo_path("/milestones"), serde_json::to_value(milestone)?);
        self.call_json(&request).await
    }

    async fn create_label(&self, label: &NewLabel) -> Result<(), ApiError> {
        let request = ApiRequest::post(self.repo_path("/labels"), serde_json::to_value(label)?);
        match self.transport.call(&request).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_already_exists() => {
                debug!(label = %label.name, "Label already exists");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn submit_import(&self, job: &ImportJob) -> Result<ImportStatus, ApiError> {
        let request = ApiRequest::post(self.repo_path("/import/issues"), serde_json::to_value(job)?)
            .with_accept(IMPORT_ACCEPT);
        self.call_json(&request).await
    }

    async fn poll_import(&self, url: &str) -> Result<ImportStatus, ApiError> {
        let request = ApiRequest::get(request_path(url)?).with_accept(IMPORT_ACCEPT);
        self.call_json(&request).await
    }

    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<(), ApiError> {
        let request = ApiRequest::post(
            self.repo_path(&format!("/issues/{issue_number}/comments")),
            json!({ "body": body }),
        );
        self.transport.call(&request).await.map(|_| ())
    }
}

/// Reduces an absolute API URL to the path (and query) the transport expects.
fn request_path(url: &str) -> Result<String, ApiError> {
    if url.starts_with('/') {
        return Ok(url.to_string());
    }
    let parsed = Url::parse(url).map_err(|_| ApiError::InvalidUrl {
        url: url.to_string(),
    })?;
    Ok(match parsed.query() {
        Some(query) => format!("{}?{query}", parsed.path()),
        None => parsed.path().to_string(),
    })
}
