//! Error types for parsing, rendering, fetching, and publishing.
//!
//! Each stage of the pipeline has its own error enum so callers can tell a
//! misconfigured Notion database ([`SchemaError`]) apart from missing digest
//! content ([`DataError`]) or a failing remote service ([`SourceError`],
//! [`PublishError`]). The binary collapses all of them into
//! `Box<dyn Error>` at the top level.

use thiserror::Error;

/// A raw Notion record does not match the schema the parser expects.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// One of the fixed article properties is not present on the record.
    #[error("record {record}: missing required property `{property}`")]
    MissingProperty {
        record: String,
        property: &'static str,
    },

    /// The property declares a type tag the parser has no extractor for.
    #[error("record {record}: property `{property}` has unsupported type `{tag}`")]
    UnknownType {
        record: String,
        property: String,
        tag: String,
    },

    /// The property's declared type yields a different kind of value than
    /// the article field it feeds.
    #[error("record {record}: property `{property}` is `{found}` but {expected} was expected")]
    TypeMismatch {
        record: String,
        property: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// The payload under the type tag is missing or has the wrong JSON shape.
    #[error("record {record}: property `{property}` of type `{tag}` is malformed: {reason}")]
    Malformed {
        record: String,
        property: String,
        tag: &'static str,
        reason: String,
    },
}

/// Data required to build a digest is missing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("cannot render a digest without articles")]
    EmptyDigest,

    #[error("article {article} has no category")]
    MissingCategory { article: String },
}

/// Failure while loading articles from the Notion database.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Notion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notion returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("saved Notion response {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid Notion response: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Failure while handing a rendered digest to a destination.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("{destination} request failed: {source}")]
    Http {
        destination: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{destination} returned HTTP {status}: {body}")]
    Status {
        destination: &'static str,
        status: u16,
        body: String,
    },
}

impl PublishError {
    /// Transport failures, rate limiting, and server errors are worth another
    /// attempt; everything else will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            PublishError::Http { .. } => true,
            PublishError::Status { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

/// The YAML configuration could not be loaded or is inconsistent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid URL for {field}: {source}")]
    Url {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let status = |status| PublishError::Status {
            destination: "Medium",
            status,
            body: String::new(),
        };
        assert!(status(429).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(400).is_retryable());
        assert!(!status(401).is_retryable());
    }

    #[test]
    fn test_schema_error_message_names_record_and_property() {
        let err = SchemaError::MissingProperty {
            record: "abc".to_string(),
            property: "Category",
        };
        assert_eq!(
            err.to_string(),
            "record abc: missing required property `Category`"
        );
    }
}
