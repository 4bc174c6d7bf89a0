//! Structured markup builder producing Confluence storage-format HTML.
//!
//! All text reaching the document through non-raw emitters is escaped for
//! `&`, `<`, `>`, `"` and `'`, so article fields cannot inject markup.

use super::markup::{Inline, MarkupBuilder, clamp_level};
use html_escape::encode_quoted_attribute;

/// Confluence client-side table-of-contents macro.
pub const CONFLUENCE_TOC_MACRO: &str = r#"<div class="toc-macro client-side-toc-macro conf-macro output-block" data-headerelements="H1,H2,H3,H4,H5,H6,H7" data-hasbody="false" data-macro-name="toc"></div>"#;

const LINE_BREAK: &str = "<br/>";

#[derive(Debug, Default)]
pub struct HtmlBuilder {
    content: String,
    /// One entry per open list; `true` while that list has an open `<li>`.
    lists: Vec<bool>,
    toc: bool,
}

impl HtmlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the Confluence table-of-contents macro at the top of the
    /// document.
    pub fn with_toc(mut self, toc: bool) -> Self {
        self.toc = toc;
        self
    }

    fn render(&self, inline: Inline) -> String {
        match inline {
            Inline::Text(text) => encode_quoted_attribute(&text).into_owned(),
            Inline::Markup(markup) => markup,
        }
    }

    fn close_item(&mut self) {
        if let Some(open) = self.lists.last_mut() {
            if *open {
                self.content.push_str("</li>");
                *open = false;
            }
        }
    }
}

impl MarkupBuilder for HtmlBuilder {
    fn header(&mut self, text: &str, level: u8) {
        let level = clamp_level(level);
        self.content.push_str(&format!(
            "<h{level}>{}</h{level}>",
            encode_quoted_attribute(text)
        ));
    }

    fn push_list(&mut self) {
        self.content.push_str("<ol>");
        self.lists.push(false);
    }

    fn pop_list(&mut self) {
        if self.lists.is_empty() {
            return;
        }
        self.close_item();
        self.lists.pop();
        self.content.push_str("</ol>");
    }

    fn list_item(&mut self, item: impl Into<Inline>) {
        let item = self.render(item.into());
        self.close_item();
        self.content.push_str("<li>");
        self.content.push_str(&item);
        self.content.push_str(LINE_BREAK);
        match self.lists.last_mut() {
            Some(open) => *open = true,
            None => self.content.push_str("</li>"),
        }
    }

    fn paragraph_push(&mut self) {
        self.content.push_str("<p>");
    }

    fn paragraph_pop(&mut self) {
        self.content.push_str("</p>");
    }

    fn line(&mut self, text: impl Into<Inline>) {
        let text = self.render(text.into());
        self.content.push_str(&text);
        self.content.push_str(LINE_BREAK);
    }

    fn raw_line(&mut self, data: &str) {
        self.content.push_str(data);
        self.content.push_str(LINE_BREAK);
    }

    fn link(&self, label: &str, url: &str) -> Inline {
        Inline::Markup(format!(
            r#"<a href="{}">{}</a>"#,
            encode_quoted_attribute(url),
            encode_quoted_attribute(label)
        ))
    }

    fn bold(&self, text: &str) -> Inline {
        Inline::Markup(format!("<strong>{}</strong>", encode_quoted_attribute(text)))
    }

    fn italic(&self, text: &str) -> Inline {
        Inline::Markup(format!("<i>{}</i>", encode_quoted_attribute(text)))
    }

    fn raw_insert(&mut self, data: &str) {
        self.content.push_str(data);
    }

    fn open_document(&mut self) {
        if self.toc {
            self.raw_insert(CONFLUENCE_TOC_MACRO);
        }
    }

    fn close_document(&mut self) {
        while !self.lists.is_empty() {
            self.pop_list();
        }
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn into_content(self) -> String {
        self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_escapes_and_clamps() {
        let mut html = HtmlBuilder::new();
        html.header("Tom & <Jerry>", 0);
        html.header("deep", 12);
        assert_eq!(
            html.content(),
            "<h1>Tom &amp; &lt;Jerry&gt;</h1><h6>deep</h6>"
        );
    }

    #[test]
    fn test_list_items_stay_open_for_following_lines() {
        let mut html = HtmlBuilder::new();
        html.push_list();
        html.list_item("first");
        html.line("detail");
        html.list_item("second");
        html.pop_list();
        assert_eq!(
            html.into_content(),
            "<ol><li>first<br/>detail<br/></li><li>second<br/></li></ol>"
        );
    }

    #[test]
    fn test_inline_fragments_do_not_append() {
        let html = HtmlBuilder::new();
        let link = html.link("a \"quoted\" label", "http://x?a=1&b=2");
        assert_eq!(html.content(), "");
        assert_eq!(
            link,
            Inline::Markup(
                r#"<a href="http://x?a=1&amp;b=2">a &quot;quoted&quot; label</a>"#.to_string()
            )
        );
        assert_eq!(
            html.bold("<b>"),
            Inline::Markup("<strong>&lt;b&gt;</strong>".to_string())
        );
        assert_eq!(html.italic("i"), Inline::Markup("<i>i</i>".to_string()));
    }

    #[test]
    fn test_markup_fragments_are_not_escaped_twice() {
        let mut html = HtmlBuilder::new();
        let bold = html.bold("x & y");
        html.line(bold);
        assert_eq!(html.content(), "<strong>x &amp; y</strong><br/>");
    }

    #[test]
    fn test_raw_content_is_verbatim() {
        let mut html = HtmlBuilder::new();
        html.raw_insert("<pre>");
        html.raw_line("<em>operator</em>");
        assert_eq!(html.content(), "<pre><em>operator</em><br/>");
    }

    #[test]
    fn test_toc_and_unbalanced_lists() {
        let mut html = HtmlBuilder::new().with_toc(true);
        html.open_document();
        html.push_list();
        html.list_item("dangling");
        html.close_document();
        let content = html.into_content();
        assert!(content.starts_with(CONFLUENCE_TOC_MACRO));
        assert!(content.ends_with("<li>dangling<br/></li></ol>"));
    }

    #[test]
    fn test_pop_list_without_scope_is_ignored() {
        let mut html = HtmlBuilder::new();
        html.pop_list();
        html.list_item("loose");
        assert_eq!(html.content(), "<li>loose<br/></li>");
    }
}
