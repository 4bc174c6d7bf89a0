//! Notion database client.
//!
//! Loads unpublished articles from the configured database and marks them
//! as published once a digest containing them went out.
//!
//! # Query
//!
//! Unpublished pages are those with an empty `Published time`, sorted by
//! `Created time` ascending. Results are paginated; every page of results
//! is fetched and merged before parsing.
//!
//! # Saved Responses
//!
//! The merged query result can be saved to a local JSON file and loaded
//! back later instead of querying the API, which is handy when iterating on
//! the digest layout.

use crate::config::NotionConfig;
use crate::error::SourceError;
use crate::models::{Article, QueryResponse};
use crate::parser::{ArticleParser, props};
use crate::utils::{normalize_line_breaks, truncate_for_log};
use chrono::{DateTime, Local, SecondsFormat, TimeZone};
use futures::stream::{self, StreamExt};
use reqwest::{Client, Response};
use serde_json::{Value, json};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct NotionClient {
    http: Client,
    api_url: String,
    version: String,
    database_id: String,
    token: String,
    saved_response: PathBuf,
    parser: ArticleParser,
}

impl NotionClient {
    pub fn new(config: &NotionConfig, token: String) -> Self {
        Self {
            http: Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            version: config.version.clone(),
            database_id: config.database_id.clone(),
            token,
            saved_response: PathBuf::from(&config.saved_response),
            parser: ArticleParser::ignoring(config.ignored_properties.iter().cloned()),
        }
    }

    pub fn query_url(&self) -> String {
        format!("{}/databases/{}/query", self.api_url, self.database_id)
    }

    pub fn page_url(&self, page_id: &str) -> String {
        format!("{}/pages/{}", self.api_url, page_id)
    }

    /// Load unpublished articles, from the API or from the saved response.
    ///
    /// # Arguments
    ///
    /// * `load_saved` - Read the saved response file instead of querying
    /// * `save_response` - Write the fetched response to the saved response file
    #[instrument(level = "info", skip(self))]
    pub async fn get_unpublished_articles(
        &self,
        load_saved: bool,
        save_response: bool,
    ) -> Result<Vec<Article>, SourceError> {
        let response = if load_saved {
            self.load_saved().await?
        } else {
            let response = self.query_unpublished().await?;
            if save_response {
                self.save(&response).await?;
            }
            response
        };
        self.articles_from(&response)
    }

    /// Run the unpublished-pages query, following pagination to the end.
    #[instrument(level = "info", skip_all, fields(database = %self.database_id))]
    pub async fn query_unpublished(&self) -> Result<QueryResponse, SourceError> {
        let mut merged = QueryResponse::default();
        let mut cursor: Option<String> = None;

        loop {
            let response = self
                .request(self.http.post(self.query_url()))
                .json(&unpublished_query(cursor.as_deref()))
                .send()
                .await?;
            let page: QueryResponse = ensure_success(response).await?.json().await?;
            debug!(results = page.results.len(), has_more = page.has_more, "Fetched query page");

            merged.results.extend(page.results);
            match page.next_cursor.filter(|_| page.has_more) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        info!(count = merged.results.len(), "Queried unpublished pages");
        Ok(merged)
    }

    /// Parse records into articles, keeping only unpublished ones.
    ///
    /// The whole batch fails if any record does not fit the schema.
    pub fn articles_from(&self, response: &QueryResponse) -> Result<Vec<Article>, SourceError> {
        let parsed = self.parser.parse_all(&response.results)?;
        let total = parsed.len();
        let articles: Vec<Article> = parsed
            .into_iter()
            .filter(|article| {
                if article.is_published() {
                    debug!(id = %article.id, "Skipping already published article");
                }
                !article.is_published()
            })
            .map(|article| Article {
                summary: article.summary.as_deref().map(normalize_line_breaks),
                ..article
            })
            .collect();
        if articles.len() < total {
            warn!(
                skipped = total - articles.len(),
                "Response contained already published articles"
            );
        }
        info!(count = articles.len(), "Loaded unpublished articles");
        Ok(articles)
    }

    #[instrument(level = "info", skip_all, fields(path = %self.saved_response.display()))]
    pub async fn load_saved(&self) -> Result<QueryResponse, SourceError> {
        let json = fs::read_to_string(&self.saved_response)
            .await
            .map_err(|source| self.io_error(source))?;
        Ok(serde_json::from_str(&json)?)
    }

    #[instrument(level = "info", skip_all, fields(path = %self.saved_response.display()))]
    pub async fn save(&self, response: &QueryResponse) -> Result<(), SourceError> {
        let json = serde_json::to_string_pretty(response)?;
        fs::write(&self.saved_response, json)
            .await
            .map_err(|source| self.io_error(source))?;
        info!(count = response.results.len(), "Saved Notion response");
        Ok(())
    }

    /// Stamp every article's `Published time` with the current local time.
    ///
    /// Pages are updated one after another; every page is attempted and the
    /// first failure, if any, is returned.
    ///
    /// # Returns
    ///
    /// The number of pages updated.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub async fn mark_published(&self, articles: &[Article]) -> Result<usize, SourceError> {
        if articles.is_empty() {
            debug!("No articles to mark as published");
            return Ok(0);
        }
        let payload = published_payload(&Local::now());
        let payload = &payload;

        let results: Vec<Result<(), SourceError>> = stream::iter(articles)
            .then(|article| async move {
                let result = self.update_page(&article.id, payload).await;
                if let Err(e) = &result {
                    warn!(id = %article.id, error = %e, "Failed to mark article as published");
                }
                result
            })
            .collect()
            .await;

        let updated = results.iter().filter(|r| r.is_ok()).count();
        info!(updated, "Marked articles as published");
        results.into_iter().collect::<Result<Vec<()>, _>>()?;
        Ok(updated)
    }

    async fn update_page(&self, page_id: &str, payload: &Value) -> Result<(), SourceError> {
        let response = self
            .request(self.http.patch(self.page_url(page_id)))
            .json(payload)
            .send()
            .await?;
        ensure_success(response).await?;
        debug!(id = %page_id, "Updated page");
        Ok(())
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.version)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    fn io_error(&self, source: std::io::Error) -> SourceError {
        SourceError::Io {
            path: self.saved_response.display().to_string(),
            source,
        }
    }
}

/// Body of the unpublished-pages database query.
pub fn unpublished_query(start_cursor: Option<&str>) -> Value {
    let mut query = json!({
        "filter": {
            "property": props::PUBLISHED_TIME,
            "date": { "is_empty": true }
        },
        "sorts": [
            { "property": props::CREATED_TIME, "direction": "ascending" }
        ]
    });
    if let Some(cursor) = start_cursor {
        query["start_cursor"] = Value::String(cursor.to_string());
    }
    query
}

/// Body of the page update that sets `Published time`.
pub fn published_payload<Tz: TimeZone>(now: &DateTime<Tz>) -> Value
where
    Tz::Offset: std::fmt::Display,
{
    json!({
        "properties": {
            (props::PUBLISHED_TIME): {
                "date": { "start": now.to_rfc3339_opts(SecondsFormat::Secs, false) }
            }
        }
    })
}

async fn ensure_success(response: Response) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SourceError::Status {
        status: status.as_u16(),
        body: truncate_for_log(&body, 300),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::fixtures::{page_json, record};
    use chrono::FixedOffset;

    fn config(saved: &str) -> NotionConfig {
        NotionConfig {
            api_url: "https://api.notion.com/v1/".to_string(),
            version: "2022-06-28".to_string(),
            database_id: "db-1".to_string(),
            token: None,
            saved_response: saved.to_string(),
            ignored_properties: vec!["Votes".to_string()],
        }
    }

    fn client() -> NotionClient {
        NotionClient::new(&config("unused.json"), "secret".into())
    }

    #[test]
    fn test_urls() {
        let client = client();
        assert_eq!(
            client.query_url(),
            "https://api.notion.com/v1/databases/db-1/query"
        );
        assert_eq!(client.page_url("p-1"), "https://api.notion.com/v1/pages/p-1");
    }

    #[test]
    fn test_unpublished_query() {
        let query = unpublished_query(None);
        assert_eq!(query["filter"]["property"], "Published time");
        assert_eq!(query["filter"]["date"]["is_empty"], true);
        assert_eq!(query["sorts"][0]["property"], "Created time");
        assert_eq!(query["sorts"][0]["direction"], "ascending");
        assert!(query.get("start_cursor").is_none());

        assert_eq!(unpublished_query(Some("c-2"))["start_cursor"], "c-2");
    }

    #[test]
    fn test_published_payload() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        let now = offset.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();
        let payload = published_payload(&now);
        assert_eq!(
            payload["properties"]["Published time"]["date"]["start"],
            "2024-03-01T10:30:00+01:00"
        );
    }

    #[test]
    fn test_articles_from_normalizes_and_filters() {
        let mut meeting = page_json();
        meeting["properties"]["Summary"]["rich_text"] =
            crate::parser::fixtures::text_runs(&[r"first\nsecond"]);
        meeting["properties"]["Votes"] = json!({ "type": "number", "number": 1 });

        let mut published = page_json();
        published["id"] = json!("page-2");
        published["properties"]["Published time"]["date"] = json!({ "start": "2024-01-01" });

        let response = QueryResponse {
            results: vec![record(meeting), record(published)],
            has_more: false,
            next_cursor: None,
        };
        let articles = client().articles_from(&response).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, "page-1");
        assert_eq!(articles[0].summary.as_deref(), Some("first\nsecond"));
    }

    #[test]
    fn test_articles_from_propagates_schema_errors() {
        let mut broken = page_json();
        broken["properties"].as_object_mut().unwrap().remove("Link");
        let response = QueryResponse {
            results: vec![record(broken)],
            ..QueryResponse::default()
        };
        assert!(matches!(
            client().articles_from(&response),
            Err(SourceError::Schema(_))
        ));
    }

    #[tokio::test]
    async fn test_save_and_load_saved_response() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");
        let client = NotionClient::new(&config(path.to_str().unwrap()), "secret".into());

        let response = QueryResponse {
            results: vec![record(page_json())],
            ..QueryResponse::default()
        };
        client.save(&response).await.unwrap();

        let articles = client.get_unpublished_articles(true, false).await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].name.as_deref(), Some("Rust 2024"));
    }

    #[tokio::test]
    async fn test_load_saved_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let client = NotionClient::new(&config(path.to_str().unwrap()), "secret".into());
        assert!(matches!(
            client.load_saved().await,
            Err(SourceError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_mark_published_without_articles() {
        assert_eq!(client().mark_published(&[]).await.unwrap(), 0);
    }
}
