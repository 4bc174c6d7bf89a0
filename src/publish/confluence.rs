//! Confluence blog post publisher.
//!
//! Creates a `blogpost` content entity in the configured space with the
//! HTML digest as its storage-format body.

use super::{Dialect, Publisher, check_status};
use crate::config::ConfluenceConfig;
use crate::error::{ConfigError, PublishError};
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde_json::{Value, json};
use tracing::{debug, instrument};
use url::Url;

const NAME: &str = "Confluence";

#[derive(Debug, Clone)]
pub struct ConfluenceClient {
    http: Client,
    endpoint: Url,
    space: String,
    token: String,
}

impl ConfluenceClient {
    /// Build a client posting to `{url}{content_path}`.
    pub fn new(config: &ConfluenceConfig, token: String) -> Result<Self, ConfigError> {
        let raw = format!(
            "{}/{}",
            config.url.trim_end_matches('/'),
            config.content_path.trim_start_matches('/')
        );
        let endpoint = Url::parse(&raw).map_err(|source| ConfigError::Url {
            field: "confluence.url",
            source,
        })?;
        Ok(Self {
            http: Client::new(),
            endpoint,
            space: config.space.clone(),
            token,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Request body for a new blog post.
    pub fn blogpost_payload(&self, title: &str, content: &str) -> Value {
        json!({
            "type": "blogpost",
            "title": title,
            "space": { "key": self.space },
            "body": {
                "storage": {
                    "value": content,
                    "representation": "storage",
                }
            }
        })
    }
}

impl Publisher for ConfluenceClient {
    fn name(&self) -> &'static str {
        NAME
    }

    fn dialect(&self) -> Dialect {
        Dialect::Html
    }

    #[instrument(level = "info", skip_all, fields(endpoint = %self.endpoint, %title))]
    async fn publish(&self, title: &str, content: &str) -> Result<(), PublishError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .json(&self.blogpost_payload(title, content))
            .send()
            .await
            .map_err(|source| PublishError::Http {
                destination: NAME,
                source,
            })?;
        let response = check_status(NAME, response).await?;
        debug!(status = %response.status(), "Confluence accepted blog post");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str, content_path: &str) -> ConfluenceConfig {
        ConfluenceConfig {
            url: url.to_string(),
            content_path: content_path.to_string(),
            space: "DEV".to_string(),
            token: None,
            toc: true,
        }
    }

    #[test]
    fn test_endpoint_joins_api_and_content_path() {
        let client =
            ConfluenceClient::new(&config("https://wiki.example.com/rest/api/", "/content"), "pat".into())
                .unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://wiki.example.com/rest/api/content"
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(ConfluenceClient::new(&config("wiki", "/content"), "pat".into()).is_err());
    }

    #[test]
    fn test_blogpost_payload() {
        let client =
            ConfluenceClient::new(&config("https://wiki.example.com/rest/api", "content"), "pat".into())
                .unwrap();
        let payload = client.blogpost_payload("Weekly", "<h1>x</h1>");
        assert_eq!(payload["type"], "blogpost");
        assert_eq!(payload["title"], "Weekly");
        assert_eq!(payload["space"]["key"], "DEV");
        assert_eq!(payload["body"]["storage"]["value"], "<h1>x</h1>");
        assert_eq!(payload["body"]["storage"]["representation"], "storage");
        assert_eq!(client.dialect(), Dialect::Html);
    }
}
