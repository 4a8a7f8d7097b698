//! Processing result types.

use crate::ledger::LedgerSubject;

/// Result of processing a single issue, holder or cross-link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingResult {
    /// The target issue (or comment on it) was created.
    Imported {
        subject: LedgerSubject,
        /// Target issue number.
        number: u64,
    },

    /// Processing failed; recorded in the failure log.
    Failed {
        subject: LedgerSubject,
        /// Error message.
        error: String,
    },
}

impl ProcessingResult {
    /// What the result is about.
    #[must_use]
    pub fn subject(&self) -> &LedgerSubject {
        match self {
            Self::Imported { subject, .. } | Self::Failed { subject, .. } => subject,
        }
    }
}
