//! YAML configuration for the Notion source, the publishers, and the digest.
//!
//! # Example
//!
//! ```yaml
//! notion:
//!   database_id: 0123456789abcdef
//!   token: secret_xxx            # or NOTION_TOKEN / --notion-token
//!   ignored_properties: [Votes]
//! confluence:
//!   url: https://wiki.example.com/rest/api
//!   space: DEV
//! medium:
//!   user_id: 1a2b3c
//! digest:
//!   title: Weekly digest
//!   categories: [DEV, OPS, DB, SEC, TOOLS, SOFT, TRIVIA]
//! ```
//!
//! Secrets may be left out of the file and supplied through the CLI or the
//! environment instead.

use crate::category::{CategoryOrder, DEFAULT_CATEGORIES};
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub notion: NotionConfig,
    #[serde(default)]
    pub confluence: Option<ConfluenceConfig>,
    #[serde(default)]
    pub medium: Option<MediumConfig>,
    #[serde(default)]
    pub digest: DigestConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotionConfig {
    #[serde(default = "default_notion_api_url")]
    pub api_url: String,
    /// Value of the `Notion-Version` header.
    #[serde(default = "default_notion_version")]
    pub version: String,
    pub database_id: String,
    #[serde(default)]
    pub token: Option<String>,
    /// Where `--save-response` writes and `--load-saved` reads the query result.
    #[serde(default = "default_saved_response")]
    pub saved_response: String,
    /// Properties skipped by the parser regardless of their type.
    #[serde(default)]
    pub ignored_properties: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfluenceConfig {
    /// REST API root, e.g. `https://wiki.example.com/rest/api`.
    pub url: String,
    #[serde(default = "default_confluence_content_path")]
    pub content_path: String,
    /// Key of the space blog posts are created in.
    pub space: String,
    #[serde(default)]
    pub token: Option<String>,
    /// Insert the table-of-contents macro at the top of the post.
    #[serde(default = "default_true")]
    pub toc: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediumConfig {
    /// Post endpoint; `{}` is replaced with the user id.
    #[serde(default = "default_medium_url")]
    pub url: String,
    pub user_id: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_publish_status")]
    pub publish_status: String,
    #[serde(default = "default_license")]
    pub license: String,
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DigestConfig {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub preface: Option<String>,
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            title: None,
            preface: None,
            categories: default_categories(),
        }
    }
}

impl DigestConfig {
    pub fn category_order(&self) -> CategoryOrder {
        CategoryOrder::new(&self.categories)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

fn default_notion_api_url() -> String {
    "https://api.notion.com/v1".to_string()
}

fn default_notion_version() -> String {
    "2022-06-28".to_string()
}

fn default_saved_response() -> String {
    "notion_saved_data.json".to_string()
}

fn default_confluence_content_path() -> String {
    "/content".to_string()
}

fn default_medium_url() -> String {
    "https://api.medium.com/v1/users/{}/posts".to_string()
}

fn default_publish_status() -> String {
    "draft".to_string()
}

fn default_license() -> String {
    "cc-40-by-nc-nd".to_string()
}

fn default_tags() -> Vec<String> {
    ["Digest", "Web Development", "Newsletter"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.into_iter().map(String::from).collect()
}

fn default_true() -> bool {
    true
}

fn default_max_retries() -> usize {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl Config {
    /// Load and validate a YAML config file.
    #[instrument(level = "info", skip_all)]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: label.clone(),
            source,
        })?;
        let config = Self::from_yaml(&yaml, &label)?;
        info!(
            path = %label,
            confluence = config.confluence.is_some(),
            medium = config.medium.is_some(),
            categories = config.digest.categories.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse and validate YAML; `label` names the source in errors.
    pub fn from_yaml(yaml: &str, label: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml).map_err(|source| ConfigError::Yaml {
            path: label.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_url("notion.api_url", &self.notion.api_url)?;
        if self.notion.database_id.trim().is_empty() {
            return Err(ConfigError::Invalid("notion.database_id is empty".into()));
        }
        if let Some(confluence) = &self.confluence {
            check_url("confluence.url", &confluence.url)?;
        }
        if let Some(medium) = &self.medium {
            check_url("medium.url", &medium.url)?;
        }
        if self.digest.category_order().iter().next().is_none() {
            return Err(ConfigError::Invalid("digest.categories is empty".into()));
        }
        Ok(())
    }
}

fn check_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::Url { field, source })
}

/// Prefer an explicit override (CLI/env) over the value from the file.
pub fn resolve_secret(
    field: &'static str,
    from_cli: Option<&str>,
    from_file: Option<&str>,
) -> Result<String, ConfigError> {
    let present = |s: &&str| !s.trim().is_empty();
    from_cli
        .filter(present)
        .or(from_file.filter(present))
        .map(str::to_string)
        .ok_or_else(|| ConfigError::Invalid(format!("no value for {field}")))
}
