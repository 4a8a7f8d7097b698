#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod backports;
pub mod config;
pub mod import_job;
pub mod labels;
pub mod ledger;
pub mod markup;
pub mod rate_limit;
pub mod releases;
pub mod runner;
pub mod source;
pub mod summary;
pub mod target;
pub mod templates;

pub use backports::{BackportConsolidator, Consolidation, HolderJob, IntegrityProblem};
pub use config::{resolve_token, ConfigError, MigrationConfig};
pub use import_job::{ImportError, ImportJobClient, JobHandle};
pub use labels::{LabelConfig, LabelRule, LabelRuleSet};
pub use ledger::{Ledger, LedgerError, LedgerSubject, Outcome};
pub use markup::{BasicMarkup, MarkupConverter};
pub use rate_limit::{Clock, ManualClock, RateLimitedTransport, SystemClock, ThrottleSettings};
pub use releases::{ReleaseLines, ReleasePolicy};
pub use runner::{Collaborators, Runner, RunnerConfig, RunnerError, Stage};
pub use source::{SnapshotSource, SourceIssue, SourceTracker};
pub use summary::{ProcessingResult, RunSummary};
pub use target::{ApiError, GitHubApi, ImportJob, TargetApi};
pub use templates::{create_handlebars_registry, TemplateError, TemplateRenderer};
