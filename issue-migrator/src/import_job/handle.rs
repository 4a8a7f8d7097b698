//! Submitted import job handle.

use chrono::{DateTime, Utc};

/// A submitted import awaiting completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    /// URL polled for the job status.
    pub poll_url: String,

    /// When the job was accepted by the target.
    pub submitted_at: DateTime<Utc>,
}
