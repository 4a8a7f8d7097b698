//! Label derivation for target issues.
//!
//! Rules are data, not code: a table of [`LabelRule`] entries interpreted by
//! [`LabelRuleSet::labels_for`] in three fixed phases, whatever the table
//! order:
//!
//! 1. every field-match and predicate rule contributes candidates independently;
//! 2. supersede pairs drop the general label when the specific one is present;
//! 3. removal rules drop matching labels when their trigger is present.
//!
//! Removal runs after supersede so a rule like "triage strips all `type:`
//! labels" sees bug-vs-regression already resolved.

mod rule;

pub use rule::{IssueField, IssuePredicate, LabelPredicate, LabelRule};

use crate::source::SourceIssue;
use serde::Deserialize;
use std::collections::BTreeSet;

/// Fallback color for labels without a definition.
pub const DEFAULT_LABEL_COLOR: &str = "ededed";

/// Color and description of a target label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LabelDefinition {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// `[labels]` configuration section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LabelConfig {
    /// Rule table.
    #[serde(default, rename = "rule")]
    pub rules: Vec<LabelRule>,

    /// Label colors and descriptions.
    #[serde(default)]
    pub define: Vec<LabelDefinition>,

    /// Color for labels missing from `define`.
    #[serde(default)]
    pub default_color: Option<String>,
}

/// Interpreter over a label rule table.
#[derive(Debug, Clone, Default)]
pub struct LabelRuleSet {
    rules: Vec<LabelRule>,
    definitions: Vec<LabelDefinition>,
    default_color: Option<String>,
}

impl LabelRuleSet {
    /// Creates a rule set without label definitions.
    #[must_use]
    pub fn new(rules: Vec<LabelRule>) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    /// Computes the target labels of `issue`.
    #[must_use]
    pub fn labels_for(&self, issue: &SourceIssue) -> BTreeSet<String> {
        let mut labels = BTreeSet::new();

        for rule in &self.rules {
            match rule {
                LabelRule::FieldMatch {
                    field,
                    value,
                    labels: added,
                } if field.matches(issue, value) => labels.extend(added.iter().cloned()),
                LabelRule::Predicate { when, labels: added } if when.holds(issue) => {
                    labels.extend(added.iter().cloned());
                }
                _ => {}
            }
        }

        for rule in &self.rules {
            if let LabelRule::Supersede { general, specific } = rule {
                if labels.contains(specific) {
                    labels.remove(general);
                }
            }
        }

        for rule in &self.rules {
            if let LabelRule::Removal { trigger, remove } = rule {
                if labels.contains(trigger) {
                    labels.retain(|label| !remove.matches(label));
                }
            }
        }

        labels
    }

    /// Returns the color and description for `name`.
    #[must_use]
    pub fn definition(&self, name: &str) -> LabelDefinition {
        self.definitions
            .iter()
            .find(|d| d.name == name)
            .cloned()
            .unwrap_or_else(|| LabelDefinition {
                name: name.to_string(),
                color: self
                    .default_color
                    .clone()
                    .unwrap_or_else(|| DEFAULT_LABEL_COLOR.to_string()),
                description: None,
            })
    }
}

impl From<LabelConfig> for LabelRuleSet {
    fn from(config: LabelConfig) -> Self {
        Self {
            rules: config.rules,
            definitions: config.define,
            default_color: config.default_color,
        }
    }
}
