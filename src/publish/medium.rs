//! Medium story publisher.
//!
//! Posts the Markdown digest to the user's posts endpoint. Stories are
//! created as drafts unless the config says otherwise.

use super::{Dialect, Publisher, check_status};
use crate::config::MediumConfig;
use crate::error::{ConfigError, PublishError};
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

const NAME: &str = "Medium";

/// Request body of `POST /users/{id}/posts`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediumPost<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub content_format: &'static str,
    pub publish_status: &'a str,
    pub license: &'a str,
    pub tags: &'a [String],
}

#[derive(Debug, Clone)]
pub struct MediumClient {
    http: Client,
    endpoint: Url,
    token: String,
    publish_status: String,
    license: String,
    tags: Vec<String>,
}

impl MediumClient {
    pub fn new(config: &MediumConfig, token: String) -> Result<Self, ConfigError> {
        let endpoint = Url::parse(&config.url.replace("{}", &config.user_id)).map_err(|source| {
            ConfigError::Url {
                field: "medium.url",
                source,
            }
        })?;
        Ok(Self {
            http: Client::new(),
            endpoint,
            token,
            publish_status: config.publish_status.clone(),
            license: config.license.clone(),
            tags: config.tags.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn post<'a>(&'a self, title: &'a str, content: &'a str) -> MediumPost<'a> {
        MediumPost {
            title,
            content,
            content_format: "markdown",
            publish_status: &self.publish_status,
            license: &self.license,
            tags: &self.tags,
        }
    }
}

impl Publisher for MediumClient {
    fn name(&self) -> &'static str {
        NAME
    }

    fn dialect(&self) -> Dialect {
        Dialect::Markdown
    }

    #[instrument(level = "info", skip_all, fields(endpoint = %self.endpoint, %title))]
    async fn publish(&self, title: &str, content: &str) -> Result<(), PublishError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .json(&self.post(title, content))
            .send()
            .await
            .map_err(|source| PublishError::Http {
                destination: NAME,
                source,
            })?;
        let response = check_status(NAME, response).await?;
        debug!(status = %response.status(), "Medium accepted story");
        Ok(())
    }
}
