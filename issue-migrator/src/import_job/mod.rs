//! Asynchronous issue import jobs.
//!
//! An issue and its comments are submitted as one import request. The
//! returned poll URL is then polled at a fixed cadence until the target
//! reports the created issue or a failure. There is deliberately no
//! timeout: large imports can stay pending for hours.

mod error;
mod handle;

pub use error::ImportError;
pub use handle::JobHandle;

use crate::rate_limit::Clock;
use crate::target::{ImportJob, TargetApi};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};

/// Default delay between two polls of the same job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Submits import jobs and waits for their results.
#[derive(Clone)]
pub struct ImportJobClient {
    api: Arc<dyn TargetApi>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
}

impl ImportJobClient {
    /// Creates a client polling every `poll_interval`.
    #[must_use]
    pub fn new(api: Arc<dyn TargetApi>, clock: Arc<dyn Clock>, poll_interval: Duration) -> Self {
        Self {
            api,
            clock,
            poll_interval,
        }
    }

    /// Submits one issue with its comments.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError`] if the request fails or no poll URL comes back.
    pub async fn submit(&self, job: &ImportJob) -> Result<JobHandle, ImportError> {
        let span = info_span!("submit_import", title = %job.issue.title);

        async {
            let status = self.api.submit_import(job).await?;
            let poll_url = status.url.ok_or(ImportError::MissingPollUrl {
                status: status.status.clone(),
            })?;
            debug!(poll_url = %poll_url, "Import accepted");

            Ok(JobHandle {
                poll_url,
                submitted_at: self.clock.now(),
            })
        }
        .instrument(span)
        .await
    }

    /// Polls a submitted job until it reaches a terminal state.
    ///
    /// # Returns
    ///
    /// The number of the created issue.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Failed`] when the target rejects the import, or
    /// an API error when polling itself fails. Failed jobs are never resubmitted.
    pub async fn wait(&self, handle: &JobHandle) -> Result<u64, ImportError> {
        let span = info_span!("await_import", poll_url = %handle.poll_url);

        async {
            let mut polls: u64 = 0;
            loop {
                let status = self.api.poll_import(&handle.poll_url).await?;
                polls += 1;

                if let Some(issue_url) = status.issue_url.as_deref() {
                    let number = issue_number_from_url(issue_url)?;
                    let elapsed = (self.clock.now() - handle.submitted_at).num_seconds();
                    info!(issue_number = number, polls, elapsed_secs = elapsed, "Import completed");
                    return Ok(number);
                }

                if status.is_failed() {
                    let reason = status.failure_reason();
                    warn!(reason = %reason, "Import failed");
                    return Err(ImportError::Failed { reason });
                }

                debug!(status = %status.status, polls, "Import still pending");
                self.clock.sleep(self.poll_interval).await;
            }
        }
        .instrument(span)
        .await
    }
}

/// Reads the issue number from the trailing path segment of an issue URL.
///
/// # Errors
///
/// Returns [`ImportError::MalformedIssueUrl`] if the last segment is not a number.
pub fn issue_number_from_url(url: &str) -> Result<u64, ImportError> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
        .ok_or_else(|| ImportError::MalformedIssueUrl {
            url: url.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::ManualClock;
    use crate::target::{
        ApiError, ImportStatus, IssuePayload, Milestone, NewLabel, NewMilestone,
    };
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct PollingApi {
        submit: Mutex<Option<ImportStatus>>,
        polls: Mutex<VecDeque<ImportStatus>>,
    }

    impl PollingApi {
        fn new(submit: &str, polls: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                submit: Mutex::new(Some(serde_json::from_str(submit).unwrap())),
                polls: Mutex::new(
                    polls
                        .iter()
                        .map(|p| serde_json::from_str(p).unwrap())
                        .collect(),
                ),
            })
        }
    }

    #[async_trait]
    impl TargetApi for PollingApi {
        async fn create_repository(&self, _private: bool) -> Result<(), ApiError> {
            unimplemented!()
        }
        async fn delete_repository(&self) -> Result<(), ApiError> {
            unimplemented!()
        }
        async fn list_milestones(&self) -> Result<Vec<Milestone>, ApiError> {
            unimplemented!()
        }
        async fn create_milestone(&self, _m: &NewMilestone) -> Result<Milestone, ApiError> {
            unimplemented!()
        }
        async fn create_label(&self, _l: &NewLabel) -> Result<(), ApiError> {
            unimplemented!()
        }
        async fn submit_import(&self, _job: &ImportJob) -> Result<ImportStatus, ApiError> {
            Ok(self.submit.lock().unwrap().take().unwrap())
        }
        async fn poll_import(&self, _url: &str) -> Result<ImportStatus, ApiError> {
            Ok(self.polls.lock().unwrap().pop_front().unwrap())
        }
        async fn create_comment(&self, _n: u64, _b: &str) -> Result<(), ApiError> {
            unimplemented!()
        }
    }

    fn job() -> ImportJob {
        ImportJob {
            issue: IssuePayload {
                title: "t".to_string(),
                body: "b".to_string(),
                created_at: DateTime::from_timestamp(0, 0).unwrap(),
                updated_at: None,
                closed_at: None,
                assignee: None,
                milestone: None,
                closed: false,
                labels: Vec::new(),
            },
            comments: Vec::new(),
        }
    }

    fn client(api: Arc<PollingApi>) -> (Arc<ManualClock>, ImportJobClient) {
        let clock = Arc::new(ManualClock::new(DateTime::from_timestamp(0, 0).unwrap()));
        let client = ImportJobClient::new(api, clock.clone(), DEFAULT_POLL_INTERVAL);
        (clock, client)
    }

    #[tokio::test]
    async fn polls_until_issue_url_appears() {
        let api = PollingApi::new(
            r#"{"id":1,"status":"pending","url":"https://api.github.com/repos/o/r/import/issues/1"}"#,
            &[
                r#"{"status":"pending"}"#,
                r#"{"status":"pending"}"#,
                r#"{"status":"imported","issue_url":"https://api.github.com/repos/o/r/issues/42"}"#,
            ],
        );
        let (clock, client) = client(api);

        let handle = client.submit(&job()).await.unwrap();
        let number = client.wait(&handle).await.unwrap();

        assert_eq!(number, 42);
        assert_eq!(clock.sleeps(), vec![DEFAULT_POLL_INTERVAL; 2]);
    }

    #[tokio::test]
    async fn failed_import_returns_immediately() {
        let api = PollingApi::new(
            r#"{"status":"pending","url":"/repos/o/r/import/issues/2"}"#,
            &[r#"{"status":"failed","errors":[{"location":"/issue/milestone","code":"invalid"}]}"#],
        );
        let (clock, client) = client(api);

        let handle = client.submit(&job()).await.unwrap();
        let err = client.wait(&handle).await.unwrap_err();

        assert!(matches!(err, ImportError::Failed { ref reason } if reason == "/issue/milestone: invalid"));
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn submission_without_poll_url_is_an_error() {
        let api = PollingApi::new(r#"{"status":"failed"}"#, &[]);
        let (_clock, client) = client(api);

        let err = client.submit(&job()).await.unwrap_err();
        assert!(matches!(err, ImportError::MissingPollUrl { .. }));
    }

    #[test]
    fn can_parse_issue_number_from_url() {
        assert_eq!(
            issue_number_from_url("https://api.github.com/repos/o/r/issues/1234").unwrap(),
            1234
        );
        assert_eq!(issue_number_from_url("/repos/o/r/issues/7/").unwrap(), 7);
        assert!(matches!(
            issue_number_from_url("https://api.github.com/repos/o/r/issues"),
            Err(ImportError::MalformedIssueUrl { .. })
        ));
    }
}
