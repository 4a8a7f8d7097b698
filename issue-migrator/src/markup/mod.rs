//! Conversion of source tracker markup into target markdown.

mod basic;

pub use basic::BasicMarkup;

/// Rewrites source markup into the target's markdown dialect.
pub trait MarkupConverter: Send + Sync {
    /// Converts a block of source markup.
    ///
    /// Never fails: markup the converter does not understand is passed
    /// through, and blocks left open are closed at the end of the text.
    fn convert(&self, text: &str) -> String;

    /// Produces a target markdown link.
    fn link(&self, label: &str, url: &str) -> String;
}
