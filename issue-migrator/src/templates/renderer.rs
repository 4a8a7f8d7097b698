//! Template renderer.

use super::{IssueBody, IssueReference, TemplateConfig, TemplateError};
use handlebars::{handlebars_helper, no_escape, Handlebars};
use serde::Serialize;
use serde_json::{json, Value};

pub(super) const ISSUE_BODY: &str = "issue-body";
pub(super) const COMMENT: &str = "comment";
pub(super) const HOLDER_BODY: &str = "holder-body";
pub(super) const CROSS_LINK: &str = "cross-link";

const DEFAULT_ISSUE_BODY: &str = "\
{{#if reporter}}**{{reporter}}** opened{{else}}Migrated from{{/if}} **[{{key}}]({{source_url}})** and commented

{{description}}
{{#if (or fix_versions footer)}}

---
{{#if fix_versions}}
**Fix versions:** {{join fix_versions}}
{{/if}}
{{#if backports}}
**Backported to:** {{join backports}}
{{/if}}
{{#each footer}}
{{this}}
{{/each}}
{{/if}}";

const DEFAULT_COMMENT: &str = "\
{{#if author}}**{{author}}**{{else}}Unknown user{{/if}} commented

{{body}}";

const DEFAULT_HOLDER_BODY: &str = "\
Backport of the following issues to {{milestone}}:

{{#each issues}}
- {{this.label}} {{this.reference}}
{{/each}}";

const DEFAULT_CROSS_LINK: &str = "\
Related issues:

{{#each links}}
- {{this.label}} {{this.reference}}
{{/each}}";

handlebars_helper!(join: |values: array| values
    .iter()
    .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
    .collect::<Vec<_>>()
    .join(", "));

/// Creates a configured Handlebars registry with custom helpers.
///
/// The registry is configured with:
/// - No HTML escaping (for markdown output)
/// - Strict mode (catches missing variables)
/// - `join` helper for comma separated lists
#[must_use]
pub fn create_handlebars_registry() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();

    // Disable HTML escaping for markdown output
    hbs.register_escape_fn(no_escape);

    // Enable strict mode to catch missing variables
    hbs.set_strict_mode(true);

    hbs.register_helper("join", Box::new(join));

    hbs
}

/// Renders issue bodies, comments, holder bodies and cross-link comments.
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl TemplateRenderer {
    /// Creates a renderer with the built-in templates.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in template fails to compile.
    pub fn new() -> Result<Self, TemplateError> {
        Self::with_config(&TemplateConfig::default())
    }

    /// Creates a renderer, replacing built-in templates with configured ones.
    ///
    /// # Errors
    ///
    /// Returns an error if any template fails to compile.
    pub fn with_config(config: &TemplateConfig) -> Result<Self, TemplateError> {
        let mut handlebars = create_handlebars_registry();
        let templates = [
            (ISSUE_BODY, config.issue_body.as_deref(), DEFAULT_ISSUE_BODY),
            (COMMENT, config.comment.as_deref(), DEFAULT_COMMENT),
            (HOLDER_BODY, config.holder_body.as_deref(), DEFAULT_HOLDER_BODY),
            (CROSS_LINK, config.cross_link.as_deref(), DEFAULT_CROSS_LINK),
        ];

        for (name, custom, default) in templates {
            handlebars
                .register_template_string(name, custom.unwrap_or(default))
                .map_err(|e| TemplateError::RegistrationError {
                    name,
                    source: Box::new(e),
                })?;
        }

        Ok(Self { handlebars })
    }

    /// Renders the body of a migrated issue.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_issue_body(&self, body: &IssueBody<'_>) -> Result<String, TemplateError> {
        self.render(ISSUE_BODY, body)
    }

    /// Renders a migrated comment with its attribution line.
    ///
    /// # Arguments
    ///
    /// * `author` - Attribution text, `None` when the author is unknown
    /// * `body` - Converted comment text
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_comment(&self, author: Option<&str>, body: &str) -> Result<String, TemplateError> {
        self.render(COMMENT, &json!({ "author": author, "body": body }))
    }

    /// Renders the body of a backport holder issue.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_holder_body(
        &self,
        milestone: &str,
        issues: &[IssueReference],
    ) -> Result<String, TemplateError> {
        self.render(HOLDER_BODY, &json!({ "milestone": milestone, "issues": issues }))
    }

    /// Renders the comment listing an issue's related issues.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_cross_links(&self, links: &[IssueReference]) -> Result<String, TemplateError> {
        self.render(CROSS_LINK, &json!({ "links": links }))
    }

    fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, TemplateError> {
        let data: Value = serde_json::to_value(data)?;
        let rendered = self.handlebars.render(name, &data)?;
        Ok(rendered.trim_end().to_string())
    }
}
