//! Ledger error types.

use thiserror::Error;

/// Errors raised by the migration ledger. All of them are fatal to a run.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Failed to read or write a ledger file.
    #[error("Ledger I/O error on '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A ledger line could not be parsed.
    #[error("Malformed ledger line {line} in '{path}': {content}")]
    Malformed {
        path: String,
        line: usize,
        content: String,
    },

    /// A success was recorded twice for the same subject.
    #[error("{subject} is already recorded as #{number}")]
    AlreadyRecorded { subject: String, number: u64 },
}
