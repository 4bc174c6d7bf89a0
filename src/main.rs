//! # News Publisher
//!
//! Collects unpublished articles from a Notion database, renders them into
//! a digest grouped by category and publishes the digest to Confluence (as
//! HTML) and Medium (as Markdown).
//!
//! ## Features
//!
//! - Queries a Notion database for pages without a `Published time`
//! - Strictly validates the page property schema before rendering anything
//! - Renders one document traversal into both Markdown and HTML
//! - Publishes to any combination of Confluence and Medium, with retries
//! - Optionally marks the included pages as published
//!
//! ## Usage
//!
//! ```sh
//! news_publisher -c config.yaml --confluence --medium --mark-published
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Fetching**: Query Notion (or replay a saved response)
//! 2. **Parsing**: Turn property bags into typed articles
//! 3. **Rendering**: Group by category and render both dialects
//! 4. **Publishing**: Hand each destination its dialect
//! 5. **Bookkeeping**: Stamp `Published time` on the included pages

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod category;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod parser;
mod publish;
mod sources;
mod utils;

use cli::Cli;
use config::{Config, resolve_secret};
use error::ConfigError;
use outputs::{digest::DigestRenderer, files};
use publish::confluence::ConfluenceClient;
use publish::medium::MediumClient;
use publish::retry::Retry;
use publish::{Destination, dispatch};
use sources::notion::NotionClient;
use utils::{default_title, normalize_line_breaks};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_publisher starting up");

    let args = Cli::parse();
    debug!(
        config = %args.config,
        confluence = args.confluence,
        medium = args.medium,
        load_saved = args.load_saved,
        mark_published = args.mark_published,
        "Parsed CLI arguments"
    );

    let config = Config::load(&args.config)?;

    // Resolve every secret up front so a missing token fails before any I/O.
    let notion_token = notion_token(&args, &config)?;
    let destinations = build_destinations(&args, &config)?;
    if destinations.is_empty() && args.output_dir.is_none() {
        warn!("No destination selected and no output directory given; the digest is only rendered");
    }

    // ---- Fetch articles ----
    let notion = NotionClient::new(&config.notion, notion_token);
    let articles = notion
        .get_unpublished_articles(args.load_saved, args.save_response)
        .await?;
    if articles.is_empty() {
        warn!("No unpublished articles found; nothing to publish");
        return Ok(());
    }

    // ---- Render ----
    let title = args
        .title
        .clone()
        .or_else(|| config.digest.title.clone())
        .unwrap_or_else(|| default_title(Local::now().date_naive()));
    let preface = args
        .preface
        .as_deref()
        .or(config.digest.preface.as_deref())
        .map(normalize_line_breaks);

    let toc = config.confluence.as_ref().is_some_and(|c| c.toc);
    let renderer = DigestRenderer::new(config.digest.category_order()).with_toc(toc);
    let digest = renderer.render_digest(&articles, &title, preface.as_deref())?;
    info!(
        title = %digest.title,
        markdown_bytes = digest.markdown.len(),
        html_bytes = digest.html.len(),
        "Rendered digest"
    );

    if let Some(output_dir) = &args.output_dir {
        let (markdown_path, html_path) = files::write_digest(&digest, output_dir).await?;
        info!(
            markdown = %markdown_path.display(),
            html = %html_path.display(),
            "Wrote digest files"
        );
    }

    // ---- Publish ----
    let outcomes = dispatch(&digest, &destinations).await;
    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|o| !o.is_ok())
        .map(|o| o.destination)
        .collect();
    if !failed.is_empty() {
        error!(?failed, "Digest was not published everywhere; articles stay unpublished");
        return Err(format!("publishing failed for: {}", failed.join(", ")).into());
    }

    // ---- Bookkeeping ----
    if args.mark_published {
        if destinations.is_empty() {
            warn!("--mark-published given without a destination; marking anyway");
        }
        let updated = notion.mark_published(&articles).await?;
        info!(updated, "Marked articles as published");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        articles = articles.len(),
        destinations = outcomes.len(),
        "Execution complete"
    );

    Ok(())
}

/// A saved response can be replayed without a token, unless pages are to
/// be updated afterwards.
fn notion_token(args: &Cli, config: &Config) -> Result<String, ConfigError> {
    match resolve_secret(
        "notion token",
        args.notion_token.as_deref(),
        config.notion.token.as_deref(),
    ) {
        Ok(token) => Ok(token),
        Err(e) if args.load_saved && !args.mark_published => {
            debug!(error = %e, "No Notion token; replaying saved response only");
            Ok(String::new())
        }
        Err(e) => Err(e),
    }
}

fn build_destinations(args: &Cli, config: &Config) -> Result<Vec<Destination>, ConfigError> {
    let max_retries = config.retry.max_retries;
    let base_delay = config.retry.base_delay();
    let mut destinations = Vec::new();

    if args.confluence {
        let section = config.confluence.as_ref().ok_or_else(|| {
            ConfigError::Invalid("--confluence needs a `confluence` config section".into())
        })?;
        let token = resolve_secret(
            "confluence token",
            args.confluence_pat.as_deref(),
            section.token.as_deref(),
        )?;
        let client = ConfluenceClient::new(section, token)?;
        destinations.push(Destination::Confluence(Retry::new(client, max_retries, base_delay)));
    }

    if args.medium {
        let section = config.medium.as_ref().ok_or_else(|| {
            ConfigError::Invalid("--medium needs a `medium` config section".into())
        })?;
        let token = resolve_secret(
            "medium token",
            args.medium_token.as_deref(),
            section.token.as_deref(),
        )?;
        let client = MediumClient::new(section, token)?;
        destinations.push(Destination::Medium(Retry::new(client, max_retries, base_delay)));
    }

    Ok(destinations)
}
