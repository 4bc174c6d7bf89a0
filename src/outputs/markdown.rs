//! Lightweight markup builder producing Markdown.
//!
//! The output has to read well both on Medium and when pasted into chat,
//! so only basic syntax is used. Text is passed through unescaped.

use super::markup::{Inline, MarkupBuilder, clamp_level};

const INDENT: &str = "  ";
const LINE_BREAK: &str = "  \n";

#[derive(Debug, Default)]
pub struct MarkdownBuilder {
    content: String,
    indent: String,
}

impl MarkdownBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_line(&mut self, prefix: &str, text: &str) {
        self.content.push_str(&self.indent);
        self.content.push_str(prefix);
        self.content.push_str(text);
        self.content.push_str(LINE_BREAK);
    }
}

fn text_of(inline: Inline) -> String {
    match inline {
        Inline::Text(text) | Inline::Markup(text) => text,
    }
}

impl MarkupBuilder for MarkdownBuilder {
    fn header(&mut self, text: &str, level: u8) {
        let hashes = "#".repeat(clamp_level(level) as usize);
        self.content.push_str(&format!("\n{hashes} {text}\n\n"));
    }

    fn push_list(&mut self) {
        self.indent.push_str(INDENT);
    }

    fn pop_list(&mut self) {
        let depth = self.indent.len().saturating_sub(INDENT.len());
        self.indent.truncate(depth);
    }

    fn list_item(&mut self, item: impl Into<Inline>) {
        self.push_line("- ", &text_of(item.into()));
    }

    fn paragraph_push(&mut self) {}

    fn paragraph_pop(&mut self) {
        self.content.push('\n');
    }

    fn line(&mut self, text: impl Into<Inline>) {
        self.push_line("", &text_of(text.into()));
    }

    fn raw_line(&mut self, data: &str) {
        self.push_line("", data);
    }

    fn link(&self, label: &str, url: &str) -> Inline {
        Inline::Markup(format!("[{label}]({url})"))
    }

    fn bold(&self, text: &str) -> Inline {
        Inline::Markup(format!("**{text}**"))
    }

    fn italic(&self, text: &str) -> Inline {
        Inline::Markup(format!("*{text}*"))
    }

    fn raw_insert(&mut self, data: &str) {
        self.content.push_str(data);
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn into_content(self) -> String {
        self.content
    }
}
