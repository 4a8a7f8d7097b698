//! Template rendering error types.

/// Template rendering error.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Handlebars rendering error.
    #[error("Template rendering error: {0}")]
    RenderError(#[from] handlebars::RenderError),

    /// Template registration error.
    #[error("Template registration error in '{name}': {source}")]
    RegistrationError {
        name: &'static str,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    /// Context serialization error.
    #[error("Template context error: {0}")]
    ContextError(#[from] serde_json::Error),
}
