//! Data models for Notion records and the articles built from them.
//!
//! This module defines the data structures shared across the pipeline:
//! - [`RawRecord`] / [`RawProperty`]: a Notion page as returned by the API
//! - [`QueryResponse`]: one page of results from a database query
//! - [`Article`]: the canonical, read-only digest item
//! - [`RenderedDigest`]: the digest rendered in both markup dialects
//!
//! Raw records keep their property payloads as untyped JSON; turning them
//! into typed values is the job of [`crate::parser`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A Notion object as returned by a database query.
///
/// # JSON Shape
///
/// ```text
/// { "id": "...", "object": "page",
///   "properties": { "Name": { "type": "title", "title": [ ... ] }, ... } }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawRecord {
    /// Notion object id.
    pub id: String,
    /// Notion object type, usually `"page"`.
    pub object: String,
    /// Property bag keyed by property name.
    #[serde(default)]
    pub properties: HashMap<String, RawProperty>,
}

/// One entry of a record's property bag.
///
/// The value lives under a key named after the type tag, next to other
/// bookkeeping keys (such as the property `id`) that the parser ignores.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawProperty {
    /// The declared type tag, e.g. `"rich_text"` or `"select"`.
    #[serde(rename = "type")]
    pub tag: String,
    /// Everything else in the property object.
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

/// One page of a Notion database query.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<RawRecord>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// The Notion object type an article was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ObjectKind {
    Page,
    Database,
    Other(String),
}

impl From<&str> for ObjectKind {
    fn from(value: &str) -> Self {
        match value {
            "page" => ObjectKind::Page,
            "database" => ObjectKind::Database,
            other => ObjectKind::Other(other.to_string()),
        }
    }
}

/// A single digest item.
///
/// Every optional field distinguishes *absent* (`None`) from an empty
/// string; renderers only emit optional content when it is `Some`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    /// Notion page id.
    pub id: String,
    /// Notion object type.
    pub kind: ObjectKind,
    /// Display title (`Name`).
    pub name: Option<String>,
    /// Target hyperlink (`Link`).
    pub link: Option<String>,
    /// Free text (`Summary`); lines are separated by `\n`.
    pub summary: Option<String>,
    /// Article type (`Type`), e.g. `"Meeting"`, `"Article"`, `"Link"`.
    pub article_type: Option<String>,
    /// Attribution source (`Source`).
    pub source: Option<String>,
    /// Grouping key (`Category`). Validated when the digest is grouped.
    pub category: Option<String>,
    /// Tags (`Technical Category`) in source order.
    pub technical_categories: Vec<String>,
    /// Optional credit line (`Credit`).
    pub credit: Option<String>,
    pub created_time: Option<String>,
    pub last_edited_time: Option<String>,
    /// Set once the article has been included in a published digest.
    pub published_time: Option<String>,
}

impl Article {
    /// An article is unpublished until a digest containing it went out.
    pub fn is_published(&self) -> bool {
        self.published_time.is_some()
    }

    /// Whether the summary should be inlined into the digest entry.
    pub fn is_meeting(&self) -> bool {
        self.article_type.as_deref() == Some("Meeting")
    }
}

/// The output of one digest run: the title used to name the published
/// artifact plus the same digest in both markup dialects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDigest {
    pub title: String,
    /// Lightweight dialect, consumed by Medium.
    pub markdown: String,
    /// Structured dialect, consumed by Confluence.
    pub html: String,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Minimal article with only the fields the digest cares about.
    pub fn article(id: &str, category: &str, name: &str) -> Article {
        Article {
            id: id.to_string(),
            kind: ObjectKind::Page,
            name: Some(name.to_string()),
            link: Some(format!("http://{}", name.to_lowercase())),
            summary: None,
            article_type: Some("Link".to_string()),
            source: Some("X".to_string()),
            category: Some(category.to_string()),
            technical_categories: vec![],
            credit: None,
            created_time: None,
            last_edited_time: None,
            published_time: None,
        }
    }
}
