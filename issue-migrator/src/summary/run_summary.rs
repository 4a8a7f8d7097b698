//! Run summary types.

use super::result::ProcessingResult;
use crate::ledger::LedgerSubject;

/// Summary of a complete run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of source issues collected.
    pub issues_collected: usize,

    /// Issues skipped because an earlier run migrated them.
    pub already_migrated: usize,

    /// Primary issues imported in this run.
    pub primary_imported: usize,

    /// Primary issues that failed in this run.
    pub primary_failed: usize,

    /// Backport holders imported in this run.
    pub holders_imported: usize,

    /// Backport holders skipped because an earlier run imported them.
    pub holders_skipped: usize,

    /// Backport holders that failed in this run.
    pub holders_failed: usize,

    /// Cross-link comments posted.
    pub links_posted: usize,

    /// Cross-link comments that failed.
    pub links_failed: usize,

    /// Data-integrity problems logged (unknown milestones, unresolved backports).
    pub integrity_problems: usize,

    /// The run stopped after primary import because issues remain unmigrated.
    pub halted: bool,

    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl RunSummary {
    /// Creates a new empty summary.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Updates the summary with a processing result.
    pub fn record_result(&mut self, result: &ProcessingResult) {
        match (result, result.subject()) {
            (ProcessingResult::Imported { .. }, LedgerSubject::Issue(_)) => {
                self.primary_imported += 1;
            }
            (ProcessingResult::Failed { .. }, LedgerSubject::Issue(_)) => self.primary_failed += 1,
            (ProcessingResult::Imported { .. }, LedgerSubject::Holder(_)) => {
                self.holders_imported += 1;
            }
            (ProcessingResult::Failed { .. }, LedgerSubject::Holder(_)) => self.holders_failed += 1,
            (ProcessingResult::Imported { .. }, LedgerSubject::Link(_)) => self.links_posted += 1,
            (ProcessingResult::Failed { .. }, LedgerSubject::Link(_)) => self.links_failed += 1,
        }
    }

    /// Counts one logged data-integrity problem.
    pub fn record_integrity_problem(&mut self) {
        self.integrity_problems += 1;
    }

    /// Returns true if any job failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.primary_failed > 0 || self.holders_failed > 0 || self.links_failed > 0
    }

    /// Returns true if the run completed without failures or integrity problems.
    #[must_use]
    pub fn all_success(&self) -> bool {
        !self.has_failures() && !self.halted && self.integrity_problems == 0
    }
}
