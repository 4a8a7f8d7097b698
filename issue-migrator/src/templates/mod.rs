//! Template rendering using Handlebars.
//!
//! Issue bodies, comments, backport holder bodies and cross-link comments
//! are all rendered through named templates. Each can be replaced from the
//! `[templates]` configuration section.

mod error;
mod renderer;

pub use error::TemplateError;
pub use renderer::{create_handlebars_registry, TemplateRenderer};

use serde::{Deserialize, Serialize};

/// Template overrides, keyed by template name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TemplateConfig {
    #[serde(default)]
    pub issue_body: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub holder_body: Option<String>,
    #[serde(default)]
    pub cross_link: Option<String>,
}

/// Data for the `issue-body` template.
#[derive(Debug, Serialize)]
pub struct IssueBody<'a> {
    /// Attribution for the reporter, `None` when unknown.
    pub reporter: Option<&'a str>,

    /// Source issue key.
    pub key: &'a str,

    /// Link back to the issue on the source tracker.
    pub source_url: &'a str,

    /// Converted description.
    pub description: &'a str,

    /// Fix versions, newest first.
    pub fix_versions: &'a [String],

    /// Backport releases, newest first.
    pub backports: &'a [String],

    /// Further footer lines, already converted to markdown.
    pub footer: Vec<String>,
}

/// One entry in a list of issue references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueReference {
    /// Leading text, e.g. an issue summary or a relationship name.
    pub label: String,

    /// `#number` or a link to the unmigrated source issue.
    pub reference: String,
}
