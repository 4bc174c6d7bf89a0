//! The incremental builder contract shared by both markup dialects.
//!
//! A builder accumulates one document. Block emitters (`header`, `line`,
//! list and paragraph scopes) append to it; inline emitters (`link`,
//! `bold`, `italic`) only return an [`Inline`] fragment that the caller
//! inserts explicitly.
//!
//! # Escaping
//!
//! Plain [`Inline::Text`] is escaped by dialects that have reserved
//! characters. [`Inline::Markup`] fragments and `raw_*` input are inserted
//! verbatim; the caller is responsible for their correctness.

/// Inline content handed to a builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Untrusted text, escaped by structured dialects.
    Text(String),
    /// A fragment already in the builder's dialect.
    Markup(String),
}

impl From<&str> for Inline {
    fn from(text: &str) -> Self {
        Inline::Text(text.to_string())
    }
}

impl From<String> for Inline {
    fn from(text: String) -> Self {
        Inline::Text(text)
    }
}

/// Heading levels are clamped to what both dialects support.
pub fn clamp_level(level: u8) -> u8 {
    level.clamp(1, 6)
}

pub trait MarkupBuilder {
    /// Emit a heading; `level` is clamped to `1..=6`.
    fn header(&mut self, text: &str, level: u8);

    /// Enter a list scope.
    fn push_list(&mut self);

    /// Leave the innermost list scope.
    fn pop_list(&mut self);

    /// Emit one item under the current list scope. Lines emitted after it
    /// belong to the same item.
    fn list_item(&mut self, item: impl Into<Inline>);

    fn paragraph_push(&mut self);

    fn paragraph_pop(&mut self);

    /// Emit one line terminated by the dialect's line break.
    fn line(&mut self, text: impl Into<Inline>);

    /// Emit one line verbatim, terminated by the dialect's line break.
    fn raw_line(&mut self, data: &str);

    fn link(&self, label: &str, url: &str) -> Inline;

    fn bold(&self, text: &str) -> Inline;

    fn italic(&self, text: &str) -> Inline;

    /// Append pre-formatted content verbatim.
    fn raw_insert(&mut self, data: &str);

    /// Called once before any content is emitted.
    fn open_document(&mut self) {}

    /// Called once after all content is emitted.
    fn close_document(&mut self) {}

    /// Content accumulated so far.
    fn content(&self) -> &str;

    fn into_content(self) -> String
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_level() {
        assert_eq!(clamp_level(0), 1);
        assert_eq!(clamp_level(3), 3);
        assert_eq!(clamp_level(9), 6);
    }

    #[test]
    fn test_plain_strings_are_text() {
        assert_eq!(Inline::from("<b>"), Inline::Text("<b>".to_string()));
        assert_eq!(
            Inline::from(String::from("x")),
            Inline::Text("x".to_string())
        );
    }
}
