//! Ledger writes paired with summary counts.

use crate::backports::IntegrityProblem;
use crate::ledger::{Ledger, LedgerError, LedgerSubject, Outcome};
use crate::summary::{ProcessingResult, RunSummary};
use tracing::{info, warn};

/// Single writer of the ledger during a run.
pub(super) struct Progress {
    pub ledger: Ledger,
    pub summary: RunSummary,
    dry_run: bool,
}

impl Progress {
    pub fn new(ledger: Ledger, dry_run: bool) -> Self {
        Self {
            ledger,
            summary: RunSummary::new(dry_run),
            dry_run,
        }
    }

    /// Durably records a completed job before counting it.
    pub fn record(&mut self, subject: LedgerSubject, outcome: Outcome) -> Result<(), LedgerError> {
        self.ledger.record(&subject, &outcome)?;

        let result = match outcome {
            Outcome::Imported(number) => {
                info!(subject = %subject, issue_number = number, "Recorded import");
                ProcessingResult::Imported { subject, number }
            }
            Outcome::Failed(error) => {
                warn!(subject = %subject, error = %error, "Recorded failure");
                ProcessingResult::Failed { subject, error }
            }
        };
        self.summary.record_result(&result);
        Ok(())
    }

    /// Logs an integrity problem; dry runs leave the ledger untouched.
    pub fn integrity(&mut self, problem: IntegrityProblem) -> Result<(), LedgerError> {
        warn!(subject = %problem.subject, reason = %problem.reason, "Data integrity problem");
        if !self.dry_run {
            self.ledger
                .record_integrity_problem(&problem.subject, &problem.reason)?;
        }
        self.summary.record_integrity_problem();
        Ok(())
    }
}
