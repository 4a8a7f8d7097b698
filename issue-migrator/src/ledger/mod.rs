//! Durable, resumable migration state.
//!
//! The ledger is a directory of append-only text files:
//!
//! ```text
//! migration-state/
//! ├── migrated.txt    # PROJ-1:17       source key -> target issue number
//! ├── backports.txt   # 4.3.19:230      milestone title -> holder issue number
//! ├── linked.txt      # PROJ-1:17       cross-link comment posted
//! └── failures.txt    # <time> failed issue PROJ-2: <reason>
//! ```
//!
//! Every record is flushed to disk before [`Ledger::record`] returns, so a
//! crash right after a job completes never loses its result. The files are
//! plain text so they can be inspected and edited between runs.

mod entry;
mod error;

pub use entry::{FailureEntry, FailureKind, LedgerSubject, Outcome};
pub use error::LedgerError;

use crate::source::SourceIssue;
use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const MIGRATED_FILE: &str = "migrated.txt";
const HOLDERS_FILE: &str = "backports.txt";
const LINKED_FILE: &str = "linked.txt";
const FAILURES_FILE: &str = "failures.txt";

/// Persistent record of what has been migrated.
#[derive(Debug)]
pub struct Ledger {
    directory: PathBuf,
    migrated: HashMap<String, u64>,
    holders: HashMap<String, u64>,
    linked: HashMap<String, u64>,
}

impl Ledger {
    /// Opens (creating if needed) the ledger stored in `directory`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the directory cannot be created or a file
    /// cannot be read or parsed.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|source| LedgerError::IoError {
            path: directory.display().to_string(),
            source,
        })?;

        let ledger = Self {
            migrated: load_map(&directory.join(MIGRATED_FILE))?,
            holders: load_map(&directory.join(HOLDERS_FILE))?,
            linked: load_map(&directory.join(LINKED_FILE))?,
            directory,
        };

        info!(
            path = %ledger.directory.display(),
            migrated = ledger.migrated.len(),
            holders = ledger.holders.len(),
            "Opened migration ledger"
        );
        Ok(ledger)
    }

    /// Returns the ledger directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the issues not yet imported, in their original order.
    #[must_use]
    pub fn remaining<'a>(&self, issues: &'a [SourceIssue]) -> Vec<&'a SourceIssue> {
        issues
            .iter()
            .filter(|issue| !self.migrated.contains_key(&issue.key))
            .collect()
    }

    /// Returns true when nothing has been recorded as migrated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.migrated.is_empty() && self.holders.is_empty()
    }

    /// Number of source issues recorded as migrated.
    #[must_use]
    pub fn migrated_count(&self) -> usize {
        self.migrated.len()
    }

    /// Target issue number of a migrated source issue.
    #[must_use]
    pub fn issue_number(&self, key: &str) -> Option<u64> {
        self.migrated.get(key).copied()
    }

    /// Target issue number of a backport holder.
    #[must_use]
    pub fn holder_number(&self, milestone: &str) -> Option<u64> {
        self.holders.get(milestone).copied()
    }

    /// Returns true when the cross-link comment for `key` was already posted.
    #[must_use]
    pub fn is_linked(&self, key: &str) -> bool {
        self.linked.contains_key(key)
    }

    /// Records the outcome of one completed job and flushes it to disk.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AlreadyRecorded`] when a success is recorded
    /// twice for the same subject, or an I/O error if the write fails.
    pub fn record(&mut self, subject: &LedgerSubject, outcome: &Outcome) -> Result<(), LedgerError> {
        match outcome {
            Outcome::Imported(number) => self.record_success(subject, *number),
            Outcome::Failed(reason) => self.record_failure(subject, FailureKind::Job, reason),
        }
    }

    /// Logs a data-integrity problem without affecting resumption state.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the write fails.
    pub fn record_integrity_problem(
        &mut self,
        subject: &LedgerSubject,
        reason: &str,
    ) -> Result<(), LedgerError> {
        self.record_failure(subject, FailureKind::Integrity, reason)
    }

    /// Reads back the whole failure log.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file exists but cannot be read.
    pub fn failures(&self) -> Result<Vec<FailureEntry>, LedgerError> {
        let path = self.directory.join(FAILURES_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path).map_err(|source| LedgerError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Ok(content.lines().filter_map(FailureEntry::parse).collect())
    }

    fn record_success(&mut self, subject: &LedgerSubject, number: u64) -> Result<(), LedgerError> {
        let (file, map) = match subject {
            LedgerSubject::Issue(_) => (MIGRATED_FILE, &self.migrated),
            LedgerSubject::Holder(_) => (HOLDERS_FILE, &self.holders),
            LedgerSubject::Link(_) => (LINKED_FILE, &self.linked),
        };
        if let Some(existing) = map.get(subject.id()) {
            return Err(LedgerError::AlreadyRecorded {
                subject: subject.to_string(),
                number: *existing,
            });
        }

        append_line(&self.directory.join(file), &format!("{}:{number}", subject.id()))?;

        let map = match subject {
            LedgerSubject::Issue(_) => &mut self.migrated,
            LedgerSubject::Holder(_) => &mut self.holders,
            LedgerSubject::Link(_) => &mut self.linked,
        };
        map.insert(subject.id().to_string(), number);
        debug!(subject = %subject, number, "Recorded success");
        Ok(())
    }

    fn record_failure(
        &mut self,
        subject: &LedgerSubject,
        kind: FailureKind,
        reason: &str,
    ) -> Result<(), LedgerError> {
        let entry = FailureEntry {
            recorded_at: Utc::now().to_rfc3339(),
            kind,
            namespace: subject.namespace().to_string(),
            subject: subject.id().to_string(),
            reason: reason.to_string(),
        };
        append_line(&self.directory.join(FAILURES_FILE), &entry.to_line())?;
        debug!(subject = %subject, kind = kind.tag(), "Recorded failure");
        Ok(())
    }
}

/// Appends one line and forces it to disk.
fn append_line(path: &Path, line: &str) -> Result<(), LedgerError> {
    let io_error = |source| LedgerError::IoError {
        path: path.display().to_string(),
        source,
    };
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_error)?;
    let mut line = line.to_string();
    line.push('\n');
    file.write_all(line.as_bytes()).map_err(io_error)?;
    file.sync_data().map_err(io_error)
}

/// Loads a `name:number` file. Blank lines and `#` comments are skipped.
fn load_map(path: &Path) -> Result<HashMap<String, u64>, LedgerError> {
    let mut map = HashMap::new();
    if !path.exists() {
        return Ok(map);
    }
    let content = fs::read_to_string(path).map_err(|source| LedgerError::IoError {
        path: path.display().to_string(),
        source,
    })?;

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parsed = line
            .rsplit_once(':')
            .and_then(|(name, number)| Some((name.trim(), number.trim().parse::<u64>().ok()?)))
            .filter(|(name, _)| !name.is_empty());
        let Some((name, number)) = parsed else {
            return Err(LedgerError::Malformed {
                path: path.display().to_string(),
                line: index + 1,
                content: raw.to_string(),
            });
        };
        if let Some(existing) = map.get(name) {
            warn!(
                path = %path.display(),
                name,
                kept = existing,
                ignored = number,
                "Duplicate ledger entry, keeping the first"
            );
            continue;
        }
        map.insert(name.to_string(), number);
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::test_support::issue;
    use tempfile::TempDir;

    #[test]
    fn remaining_is_stable_without_records() {
        let temp = TempDir::new().unwrap();
        let ledger = Ledger::open(temp.path()).unwrap();
        let issues = vec![issue("PROJ-1"), issue("PROJ-2")];

        let first: Vec<_> = ledger.remaining(&issues).iter().map(|i| i.key.clone()).collect();
        let second: Vec<_> = ledger.remaining(&issues).iter().map(|i| i.key.clone()).collect();

        assert_eq!(first, second);
        assert_eq!(first, vec!["PROJ-1", "PROJ-2"]);
    }

    #[test]
    fn recorded_issue_is_excluded_after_reopen() {
        let temp = TempDir::new().unwrap();
        let issues = vec![issue("PROJ-1"), issue("PROJ-2"), issue("PROJ-3")];

        {
            let mut ledger = Ledger::open(temp.path()).unwrap();
            ledger
                .record(&LedgerSubject::Issue("PROJ-2".to_string()), &Outcome::Imported(5))
                .unwrap();
            let keys: Vec<_> = ledger.remaining(&issues).iter().map(|i| i.key.as_str()).collect();
            assert_eq!(keys, vec!["PROJ-1", "PROJ-3"]);
        }

        let reopened = Ledger::open(temp.path()).unwrap();
        let keys: Vec<_> = reopened.remaining(&issues).iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["PROJ-1", "PROJ-3"]);
        assert_eq!(reopened.issue_number("PROJ-2"), Some(5));
    }

    #[test]
    fn duplicate_success_is_rejected() {
        let temp = TempDir::new().unwrap();
        let mut ledger = Ledger::open(temp.path()).unwrap();
        let subject = LedgerSubject::Issue("PROJ-1".to_string());

        ledger.record(&subject, &Outcome::Imported(1)).unwrap();
        let result = ledger.record(&subject, &Outcome::Imported(2));

        assert!(matches!(result, Err(LedgerError::AlreadyRecorded { number: 1, .. })));
        let content = fs::read_to_string(temp.path().join(MIGRATED_FILE)).unwrap();
        assert_eq!(content, "PROJ-1:1\n");
    }

    #[test]
    fn holders_and_issues_use_separate_namespaces() {
        let temp = TempDir::new().unwrap();
        let mut ledger = Ledger::open(temp.path()).unwrap();

        ledger
            .record(&LedgerSubject::Holder("4.3.19".to_string()), &Outcome::Imported(90))
            .unwrap();
        ledger
            .record(
                &LedgerSubject::Holder("4.3.20".to_string()),
                &Outcome::Failed("validation".to_string()),
            )
            .unwrap();
        ledger
            .record(
                &LedgerSubject::Issue("PROJ-9".to_string()),
                &Outcome::Failed("timeout".to_string()),
            )
            .unwrap();

        assert_eq!(ledger.holder_number("4.3.19"), Some(90));
        assert_eq!(ledger.issue_number("4.3.19"), None);

        let failures = ledger.failures().unwrap();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].namespace, "backport");
        assert_eq!(failures[1].namespace, "issue");
        assert_eq!(failures[1].subject, "PROJ-9");
    }

    #[test]
    fn integrity_problems_do_not_mark_progress() {
        let temp = TempDir::new().unwrap();
        let mut ledger = Ledger::open(temp.path()).unwrap();

        ledger
            .record_integrity_problem(
                &LedgerSubject::Issue("PROJ-1".to_string()),
                "fix version 9.9 has no milestone",
            )
            .unwrap();

        assert!(ledger.is_empty());
        assert_eq!(ledger.failures().unwrap()[0].kind, FailureKind::Integrity);
    }

    #[test]
    fn load_skips_comments_and_keeps_first_duplicate() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(MIGRATED_FILE),
            "# edited by hand\nPROJ-1:3\n\nPROJ-1:4\nPROJ-2:8\n",
        )
        .unwrap();

        let ledger = Ledger::open(temp.path()).unwrap();

        assert_eq!(ledger.issue_number("PROJ-1"), Some(3));
        assert_eq!(ledger.migrated_count(), 2);
    }

    #[test]
    fn load_rejects_malformed_lines() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(MIGRATED_FILE), "PROJ-1:3\nPROJ-2\n").unwrap();

        let result = Ledger::open(temp.path());
        assert!(matches!(result, Err(LedgerError::Malformed { line: 2, .. })));
    }
}
