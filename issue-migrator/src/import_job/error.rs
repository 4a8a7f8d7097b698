//! Import job error types.

use crate::target::ApiError;
use thiserror::Error;

/// Errors that can occur while submitting or awaiting an import job.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Target API error during submission or polling.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The target reported the import as failed.
    #[error("Import failed: {reason}")]
    Failed { reason: String },

    /// The submission response carried no poll URL.
    #[error("Import submission returned no poll URL (status '{status}')")]
    MissingPollUrl { status: String },

    /// The created issue URL does not end in an issue number.
    #[error("Cannot read an issue number from '{url}'")]
    MalformedIssueUrl { url: String },
}
