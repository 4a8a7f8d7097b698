//! Source tracker backed by a JSON export.

use super::{ReleaseVersion, SourceError, SourceIssue, SourcePage, SourceTracker};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Layout of a snapshot file.
#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    versions: Vec<ReleaseVersion>,
    #[serde(default)]
    issues: Vec<SourceIssue>,
}

/// Serves pages from an exported query result.
///
/// The export already is the result of the migration query, so the query
/// string passed to [`SourceTracker::search`] is not re-evaluated.
#[derive(Debug)]
pub struct SnapshotSource {
    versions: Vec<ReleaseVersion>,
    issues: Vec<SourceIssue>,
}

impl SnapshotSource {
    /// Loads a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the file cannot be read or parsed.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let content = std::fs::read_to_string(path).map_err(|source| SourceError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        let snapshot: SnapshotFile =
            serde_json::from_str(&content).map_err(|source| SourceError::ParseError {
                path: path.display().to_string(),
                source,
            })?;

        info!(
            path = %path.display(),
            issues = snapshot.issues.len(),
            versions = snapshot.versions.len(),
            "Loaded source snapshot"
        );
        Ok(Self {
            versions: snapshot.versions,
            issues: snapshot.issues,
        })
    }

    /// Builds a snapshot from in-memory data.
    #[must_use]
    pub fn from_parts(versions: Vec<ReleaseVersion>, issues: Vec<SourceIssue>) -> Self {
        Self { versions, issues }
    }
}

#[async_trait]
impl SourceTracker for SnapshotSource {
    async fn search(
        &self,
        query: &str,
        start_at: usize,
        max_results: usize,
    ) -> Result<SourcePage, SourceError> {
        debug!(query, start_at, max_results, "Serving snapshot page");
        let end = start_at.saturating_add(max_results).min(self.issues.len());
        let issues = self
            .issues
            .get(start_at..end)
            .map(<[SourceIssue]>::to_vec)
            .unwrap_or_default();

        Ok(SourcePage {
            issues,
            has_more: end < self.issues.len(),
        })
    }

    async fn versions(&self) -> Result<Vec<ReleaseVersion>, SourceError> {
        Ok(self.versions.clone())
    }
}
