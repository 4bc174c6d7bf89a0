//! Rendering of grouped articles into a digest document.
//!
//! The traversal is written once against [`MarkupBuilder`] and driven with
//! a fresh builder per dialect:
//!
//! 1. Title as a level-1 heading
//! 2. Preface lines, inserted verbatim
//! 3. One chapter per category of the [`CategoryOrder`] that has articles,
//!    listing each article with its link, a source/credit line and, for
//!    meetings, the summary lines
//!
//! Categories missing from the order never get a chapter.

use super::html::HtmlBuilder;
use super::markdown::MarkdownBuilder;
use super::markup::{Inline, MarkupBuilder};
use crate::category::{CategoryOrder, group};
use crate::error::DataError;
use crate::models::{Article, RenderedDigest};
use itertools::Itertools;
use tracing::{debug, info, instrument, warn};

/// Link label used when an article has neither a name nor a link.
const UNTITLED: &str = "untitled";

#[derive(Debug, Clone, Default)]
pub struct DigestRenderer {
    order: CategoryOrder,
    toc: bool,
}

impl DigestRenderer {
    pub fn new(order: CategoryOrder) -> Self {
        Self { order, toc: false }
    }

    /// Prefix the HTML rendition with the Confluence table of contents.
    pub fn with_toc(mut self, toc: bool) -> Self {
        self.toc = toc;
        self
    }

    /// Render the digest in both dialects.
    ///
    /// An empty `title` produces no heading but still names the digest.
    ///
    /// # Errors
    ///
    /// Fails with a [`DataError`] if `articles` is empty or an article has
    /// no category.
    pub fn render_digest(
        &self,
        articles: &[Article],
        title: &str,
        preface: Option<&str>,
    ) -> Result<RenderedDigest, DataError> {
        let heading = Some(title).filter(|t| !t.is_empty());
        let markdown = self.render(MarkdownBuilder::new(), articles, heading, preface)?;
        let html = self.render(
            HtmlBuilder::new().with_toc(self.toc),
            articles,
            heading,
            preface,
        )?;
        Ok(RenderedDigest {
            title: title.to_string(),
            markdown,
            html,
        })
    }

    /// Render the digest into `builder` and return the resulting document.
    #[instrument(level = "info", skip_all, fields(articles = articles.len(), title = ?title))]
    pub fn render<B: MarkupBuilder>(
        &self,
        mut builder: B,
        articles: &[Article],
        title: Option<&str>,
        preface: Option<&str>,
    ) -> Result<String, DataError> {
        if articles.is_empty() {
            return Err(DataError::EmptyDigest);
        }
        let buckets = group(articles)?;
        info!(categories = %buckets.keys().join(", "), "Grouped articles by category");

        for (category, bucket) in &buckets {
            if !self.order.contains(category) {
                warn!(%category, articles = bucket.len(), "Category has no chapter; dropping its articles");
            }
        }

        builder.open_document();
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            builder.header(title, 1);
        }
        if let Some(preface) = preface.filter(|p| !p.is_empty()) {
            builder.paragraph_push();
            for line in preface.split('\n') {
                builder.raw_line(line);
            }
            builder.paragraph_pop();
        }

        for category in self.order.iter() {
            if let Some(bucket) = buckets.get(category) {
                debug!(%category, articles = bucket.len(), "Rendering chapter");
                chapter(&mut builder, category, bucket);
            }
        }
        builder.close_document();

        Ok(builder.into_content())
    }
}

fn chapter<B: MarkupBuilder>(builder: &mut B, category: &str, articles: &[&Article]) {
    builder.header(&format!("[[ {category} ]]"), 2);
    builder.push_list();
    for article in articles {
        entry(builder, article);
    }
    builder.pop_list();
}

fn entry<B: MarkupBuilder>(builder: &mut B, article: &Article) {
    let label = article
        .name
        .as_deref()
        .or(article.link.as_deref())
        .unwrap_or(UNTITLED);
    let item = match article.link.as_deref() {
        Some(url) => builder.link(label, url),
        None => Inline::from(label),
    };
    builder.list_item(item);
    builder.line(source_line(article));

    if article.is_meeting() {
        if let Some(summary) = article.summary.as_deref().filter(|s| !s.is_empty()) {
            for line in summary.split('\n') {
                builder.line(line);
            }
        }
    }
}

/// `[<type>] Source: <source>`, plus `; Credits:<credit>` when credited.
pub fn source_line(article: &Article) -> String {
    let mut line = format!(
        "[{}] Source: {}",
        article.article_type.as_deref().unwrap_or_default(),
        article.source.as_deref().unwrap_or_default()
    );
    if let Some(credit) = article.credit.as_deref().filter(|c| !c.is_empty()) {
        line.push_str("; Credits:");
        line.push_str(credit);
    }
    line
}
