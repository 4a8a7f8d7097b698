//! Source tracker error types.

use thiserror::Error;

/// Errors that can occur while loading source issues. All are fatal.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to read a snapshot file.
    #[error("Failed to read source snapshot '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a snapshot file.
    #[error("Failed to parse source snapshot '{path}': {source}")]
    ParseError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The source tracker reported more results but returned an empty page.
    #[error("Source tracker returned an empty page at offset {start_at} while reporting more results")]
    StalledPagination { start_at: usize },
}
