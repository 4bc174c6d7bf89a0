//! Conversion of raw Notion records into [`Article`] values.
//!
//! Parsing happens in two passes:
//!
//! 1. **Extraction**: every property is dispatched on its declared type tag
//!    to a dedicated extractor that yields a typed [`PropertyValue`].
//! 2. **Assembly**: the fixed article properties (see [`props`]) are read
//!    back out of the extracted values and checked against the kind of
//!    value each article field expects.
//!
//! # Absent vs Empty
//!
//! Empty rich text, empty titles, and unset selects resolve to `None`,
//! never to `""`. Multi-selects always resolve to a (possibly empty) list.

use crate::error::SchemaError;
use crate::models::{Article, ObjectKind, RawProperty, RawRecord};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// Names of the Notion properties an article is assembled from.
pub mod props {
    pub const NAME: &str = "Name";
    pub const LINK: &str = "Link";
    pub const TYPE: &str = "Type";
    pub const SOURCE: &str = "Source";
    pub const SUMMARY: &str = "Summary";
    pub const CREDIT: &str = "Credit";
    pub const CATEGORY: &str = "Category";
    pub const TECHNICAL_CATEGORY: &str = "Technical Category";
    pub const CREATED_TIME: &str = "Created time";
    pub const LAST_EDITED_TIME: &str = "Last edited time";
    pub const PUBLISHED_TIME: &str = "Published time";
}

/// Property type tags the parser knows how to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyTag {
    RichText,
    Select,
    MultiSelect,
    Date,
    CreatedTime,
    LastEditedTime,
    Url,
    Title,
}

impl PropertyTag {
    /// The tag as it appears in the `type` field and as the payload key.
    pub const fn as_str(self) -> &'static str {
        match self {
            PropertyTag::RichText => "rich_text",
            PropertyTag::Select => "select",
            PropertyTag::MultiSelect => "multi_select",
            PropertyTag::Date => "date",
            PropertyTag::CreatedTime => "created_time",
            PropertyTag::LastEditedTime => "last_edited_time",
            PropertyTag::Url => "url",
            PropertyTag::Title => "title",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Some(match tag {
            "rich_text" => PropertyTag::RichText,
            "select" => PropertyTag::Select,
            "multi_select" => PropertyTag::MultiSelect,
            "date" => PropertyTag::Date,
            "created_time" => PropertyTag::CreatedTime,
            "last_edited_time" => PropertyTag::LastEditedTime,
            "url" => PropertyTag::Url,
            "title" => PropertyTag::Title,
            _ => return None,
        })
    }
}

/// A typed property value produced by one extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// From `title`, `rich_text`, or `select`.
    Text(Option<String>),
    /// From `multi_select`.
    Options(Vec<String>),
    /// From `date`, `created_time`, or `last_edited_time`.
    Timestamp(Option<String>),
    /// From `url`.
    Url(Option<String>),
}

impl PropertyValue {
    fn shape(&self) -> &'static str {
        match self {
            PropertyValue::Text(_) => "text",
            PropertyValue::Options(_) => "options",
            PropertyValue::Timestamp(_) => "timestamp",
            PropertyValue::Url(_) => "url",
        }
    }
}

#[derive(Deserialize)]
struct TextRun {
    plain_text: String,
}

#[derive(Deserialize)]
struct SelectOption {
    name: String,
}

/// Notion dates are objects with a `start`; a bare string is accepted too.
#[derive(Deserialize)]
#[serde(untagged)]
enum DateValue {
    Instant(String),
    Range { start: String },
}

/// Parses raw records into articles.
///
/// Properties whose names are on the ignore list are skipped before their
/// type tag is looked at, which lets a database carry extra columns of
/// types the parser does not support.
#[derive(Debug, Clone, Default)]
pub struct ArticleParser {
    ignored: HashSet<String>,
}

impl ArticleParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a parser that skips the given property names entirely.
    pub fn ignoring<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignored: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse one record into an [`Article`].
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if a property has an unsupported type tag,
    /// a malformed payload, a type that does not fit the article field it
    /// feeds, or if one of the fixed article properties is missing.
    pub fn parse(&self, record: &RawRecord) -> Result<Article, SchemaError> {
        let mut values = HashMap::with_capacity(record.properties.len());
        for (name, property) in &record.properties {
            if self.ignored.contains(name) {
                debug!(record = %record.id, property = %name, "Skipping ignored property");
                continue;
            }
            let value = extract(&record.id, name, property)?;
            values.insert(name.as_str(), value);
        }

        let mut fields = Fields {
            record: &record.id,
            values,
        };

        Ok(Article {
            id: record.id.clone(),
            kind: ObjectKind::from(record.object.as_str()),
            name: fields.text(props::NAME)?,
            link: fields.link(props::LINK)?,
            article_type: fields.text(props::TYPE)?,
            source: fields.text(props::SOURCE)?,
            summary: fields.text(props::SUMMARY)?,
            credit: fields.text(props::CREDIT)?,
            category: fields.text(props::CATEGORY)?,
            technical_categories: fields.options(props::TECHNICAL_CATEGORY)?,
            created_time: fields.timestamp(props::CREATED_TIME)?,
            last_edited_time: fields.timestamp(props::LAST_EDITED_TIME)?,
            published_time: fields.timestamp(props::PUBLISHED_TIME)?,
        })
    }

    /// Parse a whole batch, stopping at the first record that does not fit
    /// the schema.
    #[instrument(level = "info", skip_all, fields(records = records.len()))]
    pub fn parse_all(&self, records: &[RawRecord]) -> Result<Vec<Article>, SchemaError> {
        records.iter().map(|record| self.parse(record)).collect()
    }
}

fn extract(record: &str, name: &str, property: &RawProperty) -> Result<PropertyValue, SchemaError> {
    let tag = PropertyTag::parse(&property.tag).ok_or_else(|| SchemaError::UnknownType {
        record: record.to_string(),
        property: name.to_string(),
        tag: property.tag.clone(),
    })?;

    let value = match tag {
        PropertyTag::RichText | PropertyTag::Title => {
            let runs: Option<Vec<TextRun>> = payload(record, name, tag, property)?;
            PropertyValue::Text(join_runs(runs.unwrap_or_default()))
        }
        PropertyTag::Select => {
            let option: Option<SelectOption> = payload(record, name, tag, property)?;
            PropertyValue::Text(option.map(|o| o.name))
        }
        PropertyTag::MultiSelect => {
            let options: Option<Vec<SelectOption>> = payload(record, name, tag, property)?;
            PropertyValue::Options(
                options
                    .unwrap_or_default()
                    .into_iter()
                    .map(|o| o.name)
                    .collect(),
            )
        }
        PropertyTag::Date => {
            let date: Option<DateValue> = payload(record, name, tag, property)?;
            PropertyValue::Timestamp(date.map(|d| match d {
                DateValue::Instant(start) | DateValue::Range { start } => start,
            }))
        }
        PropertyTag::CreatedTime | PropertyTag::LastEditedTime => {
            PropertyValue::Timestamp(payload(record, name, tag, property)?)
        }
        PropertyTag::Url => PropertyValue::Url(payload(record, name, tag, property)?),
    };
    Ok(value)
}

/// Deserialize the value stored under the property's tag key.
fn payload<T: DeserializeOwned>(
    record: &str,
    name: &str,
    tag: PropertyTag,
    property: &RawProperty,
) -> Result<T, SchemaError> {
    let malformed = |reason: String| SchemaError::Malformed {
        record: record.to_string(),
        property: name.to_string(),
        tag: tag.as_str(),
        reason,
    };
    let value = property
        .payload
        .get(tag.as_str())
        .ok_or_else(|| malformed(format!("no `{}` value", tag.as_str())))?;
    T::deserialize(value).map_err(|e| malformed(e.to_string()))
}

fn join_runs(runs: Vec<TextRun>) -> Option<String> {
    if runs.is_empty() {
        return None;
    }
    let parts: Vec<String> = runs.into_iter().map(|r| r.plain_text).collect();
    Some(parts.join(" "))
}

/// Extracted values of one record, drained field by field during assembly.
struct Fields<'r> {
    record: &'r str,
    values: HashMap<&'r str, PropertyValue>,
}

impl Fields<'_> {
    fn take(&mut self, property: &'static str) -> Result<PropertyValue, SchemaError> {
        self.values
            .remove(property)
            .ok_or_else(|| SchemaError::MissingProperty {
                record: self.record.to_string(),
                property,
            })
    }

    fn mismatch(&self, property: &'static str, expected: &'static str, found: &PropertyValue) -> SchemaError {
        SchemaError::TypeMismatch {
            record: self.record.to_string(),
            property,
            expected,
            found: found.shape(),
        }
    }

    fn text(&mut self, property: &'static str) -> Result<Option<String>, SchemaError> {
        match self.take(property)? {
            PropertyValue::Text(text) => Ok(text),
            other => Err(self.mismatch(property, "text", &other)),
        }
    }

    fn link(&mut self, property: &'static str) -> Result<Option<String>, SchemaError> {
        match self.take(property)? {
            PropertyValue::Url(url) | PropertyValue::Text(url) => Ok(url),
            other => Err(self.mismatch(property, "a url or text", &other)),
        }
    }

    fn options(&mut self, property: &'static str) -> Result<Vec<String>, SchemaError> {
        match self.take(property)? {
            PropertyValue::Options(options) => Ok(options),
            other => Err(self.mismatch(property, "options", &other)),
        }
    }

    fn timestamp(&mut self, property: &'static str) -> Result<Option<String>, SchemaError> {
        match self.take(property)? {
            PropertyValue::Timestamp(ts) => Ok(ts),
            other => Err(self.mismatch(property, "a timestamp", &other)),
        }
    }
}
