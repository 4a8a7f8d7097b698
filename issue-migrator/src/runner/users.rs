//! Source user to target login mapping.

use crate::markup::MarkupConverter;
use crate::source::{SourceIssue, SourceUser};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Resolves source users to target logins and attribution text.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    logins: BTreeMap<String, String>,
    profile_base: String,
    unmapped: BTreeSet<String>,
}

impl UserDirectory {
    /// Creates a directory from configured mappings.
    ///
    /// # Arguments
    ///
    /// * `logins` - Source user name to target login
    /// * `profile_base` - Base URL of target user profiles, e.g. `https://github.com`
    #[must_use]
    pub fn new(logins: BTreeMap<String, String>, profile_base: impl Into<String>) -> Self {
        Self {
            logins,
            profile_base: profile_base.into().trim_end_matches('/').to_string(),
            unmapped: BTreeSet::new(),
        }
    }

    /// Notes every participant of `issues` that has no target login.
    pub fn collect(&mut self, issues: &[SourceIssue]) {
        for user in issues.iter().flat_map(SourceIssue::participants) {
            if !self.logins.contains_key(&user.name) && self.unmapped.insert(user.name.clone()) {
                debug!(user = %user.name, "No target login for source user");
            }
        }
        info!(
            mapped = self.logins.len(),
            unmapped = self.unmapped.len(),
            "Collected source users"
        );
    }

    /// Target login of `user`, if mapped.
    #[must_use]
    pub fn login(&self, user: &SourceUser) -> Option<&str> {
        self.logins.get(&user.name).map(String::as_str)
    }

    /// Display name, linked to the target profile when mapped.
    ///
    /// Never produces an `@mention`, so migrated text does not notify anyone.
    #[must_use]
    pub fn attribution(&self, user: &SourceUser, markup: &dyn MarkupConverter) -> String {
        match self.login(user) {
            Some(login) => markup.link(user.display(), &format!("{}/{login}", self.profile_base)),
            None => user.display().to_string(),
        }
    }

    /// Source users seen without a mapping.
    #[must_use]
    pub fn unmapped(&self) -> &BTreeSet<String> {
        &self.unmapped
    }
}
