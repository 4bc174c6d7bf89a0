//! Publishing rendered digests to remote destinations.
//!
//! Each destination implements [`Publisher`] and consumes the dialect it
//! understands:
//!
//! | Destination | Module | Dialect |
//! |-------------|--------|---------|
//! | Confluence blog post | [`confluence`] | HTML (storage format) |
//! | Medium story | [`medium`] | Markdown |
//!
//! [`dispatch`] hands one [`RenderedDigest`] to every selected destination
//! in turn and reports one [`Outcome`] per destination. A failing
//! destination does not stop the others.

pub mod confluence;
pub mod medium;
pub mod retry;

use crate::error::PublishError;
use crate::models::RenderedDigest;
use crate::utils::truncate_for_log;
use confluence::ConfluenceClient;
use medium::MediumClient;
use retry::Retry;
use tracing::{error, info, instrument};

/// The markup dialect a destination consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Html,
    Markdown,
}

impl Dialect {
    /// Pick this dialect's rendition out of a digest.
    pub fn select(self, digest: &RenderedDigest) -> &str {
        match self {
            Dialect::Html => &digest.html,
            Dialect::Markdown => &digest.markdown,
        }
    }
}

pub trait Publisher {
    /// Human readable destination name used in logs and errors.
    fn name(&self) -> &'static str;

    fn dialect(&self) -> Dialect;

    /// Publish `content` under `title`.
    async fn publish(&self, title: &str, content: &str) -> Result<(), PublishError>;
}

/// A destination selected on the command line.
pub enum Destination {
    Confluence(Retry<ConfluenceClient>),
    Medium(Retry<MediumClient>),
}

impl Publisher for Destination {
    fn name(&self) -> &'static str {
        match self {
            Destination::Confluence(p) => p.name(),
            Destination::Medium(p) => p.name(),
        }
    }

    fn dialect(&self) -> Dialect {
        match self {
            Destination::Confluence(p) => p.dialect(),
            Destination::Medium(p) => p.dialect(),
        }
    }

    async fn publish(&self, title: &str, content: &str) -> Result<(), PublishError> {
        match self {
            Destination::Confluence(p) => p.publish(title, content).await,
            Destination::Medium(p) => p.publish(title, content).await,
        }
    }
}

/// Result of handing the digest to one destination.
#[derive(Debug)]
pub struct Outcome {
    pub destination: &'static str,
    pub result: Result<(), PublishError>,
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Publish `digest` to every destination, sequentially.
#[instrument(level = "info", skip_all, fields(title = %digest.title, destinations = publishers.len()))]
pub async fn dispatch<P: Publisher>(digest: &RenderedDigest, publishers: &[P]) -> Vec<Outcome> {
    let mut outcomes = Vec::with_capacity(publishers.len());
    for publisher in publishers {
        let content = publisher.dialect().select(digest);
        info!(destination = publisher.name(), bytes = content.len(), "Publishing digest");
        let result = publisher.publish(&digest.title, content).await;
        match &result {
            Ok(()) => info!(destination = publisher.name(), "Published digest"),
            Err(e) => error!(destination = publisher.name(), error = %e, "Failed to publish digest"),
        }
        outcomes.push(Outcome {
            destination: publisher.name(),
            result,
        });
    }
    outcomes
}

/// Turn a non-success response into [`PublishError::Status`].
pub(crate) async fn check_status(
    destination: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, PublishError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PublishError::Status {
        destination,
        status: status.as_u16(),
        body: truncate_for_log(&body, 300),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recorder {
        name: &'static str,
        dialect: Dialect,
        fail: bool,
        received: RefCell<Vec<(String, String)>>,
    }

    impl Recorder {
        fn new(name: &'static str, dialect: Dialect, fail: bool) -> Self {
            Self {
                name,
                dialect,
                fail,
                received: RefCell::new(vec![]),
            }
        }
    }

    impl Publisher for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn dialect(&self) -> Dialect {
            self.dialect
        }

        async fn publish(&self, title: &str, content: &str) -> Result<(), PublishError> {
            self.received
                .borrow_mut()
                .push((title.to_string(), content.to_string()));
            if self.fail {
                return Err(PublishError::Status {
                    destination: self.name,
                    status: 400,
                    body: "bad".to_string(),
                });
            }
            Ok(())
        }
    }

    fn digest() -> RenderedDigest {
        RenderedDigest {
            title: "Weekly".to_string(),
            markdown: "# md".to_string(),
            html: "<h1>html</h1>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_dialect() {
        let publishers = vec![
            Recorder::new("wiki", Dialect::Html, false),
            Recorder::new("blog", Dialect::Markdown, false),
        ];
        let outcomes = dispatch(&digest(), &publishers).await;

        assert!(outcomes.iter().all(Outcome::is_ok));
        assert_eq!(
            publishers[0].received.borrow().as_slice(),
            &[("Weekly".to_string(), "<h1>html</h1>".to_string())]
        );
        assert_eq!(
            publishers[1].received.borrow().as_slice(),
            &[("Weekly".to_string(), "# md".to_string())]
        );
    }

    #[tokio::test]
    async fn test_dispatch_continues_after_failure() {
        let publishers = vec![
            Recorder::new("wiki", Dialect::Html, true),
            Recorder::new("blog", Dialect::Markdown, false),
        ];
        let outcomes = dispatch(&digest(), &publishers).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].destination, "wiki");
        assert!(!outcomes[0].is_ok());
        assert!(outcomes[1].is_ok());
        assert_eq!(publishers[1].received.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_without_destinations() {
        let publishers: Vec<Recorder> = vec![];
        assert!(dispatch(&digest(), &publishers).await.is_empty());
    }
}
