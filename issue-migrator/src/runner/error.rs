//! Runner error types.

use crate::target::ApiError;
use crate::templates::TemplateError;

/// Fatal errors that stop a migration run.
///
/// Everything not listed here is recorded in the ledger's failure log and
/// the run continues.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Configuration loading and validation errors.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// GitHub API client initialization errors.
    #[error(transparent)]
    Octocrab(#[from] octocrab::Error),

    /// The ledger cannot be read or written.
    #[error(transparent)]
    Ledger(#[from] crate::ledger::LedgerError),

    /// Source issues cannot be loaded.
    #[error(transparent)]
    Source(#[from] crate::source::SourceError),

    /// A template does not compile.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The target repository, its milestones or labels cannot be prepared.
    #[error("Failed to {step}: {source}")]
    Prepare {
        step: String,
        #[source]
        source: ApiError,
    },

    /// Recreating the repository would discard migrated issues.
    #[error("Refusing to recreate the repository: the ledger already records {entries} issues")]
    RecreateRefused { entries: usize },
}
