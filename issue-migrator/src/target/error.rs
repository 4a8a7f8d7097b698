//! Target API error types.

use thiserror::Error;

/// Errors that can occur while talking to the target tracker.
#[derive(Debug, Error)]
pub enum ApiError {
    /// GitHub client error (network, TLS, request building).
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),

    /// The server answered with a non-success status that is not a rate limit.
    #[error("Request to {path} failed with status {status}: {message}")]
    Status {
        path: String,
        status: u16,
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The request body could not be encoded.
    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// The server returned a URL this client cannot use.
    #[error("Invalid URL '{url}' returned by the server")]
    InvalidUrl { url: String },
}

impl ApiError {
    /// Returns the HTTP status for [`ApiError::Status`] errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true when the server rejected a create because the resource exists.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        self.status() == Some(422)
    }

    /// Returns true when the server reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_classify_status_errors() {
        let exists = ApiError::Status {
            path: "/repos/o/r/labels".to_string(),
            status: 422,
            message: "Validation Failed".to_string(),
        };
        assert!(exists.is_already_exists());
        assert!(!exists.is_not_found());

        let invalid = ApiError::InvalidUrl {
            url: "::".to_string(),
        };
        assert_eq!(invalid.status(), None);
    }
}
