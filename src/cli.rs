//! Command-line interface definitions for News Publisher.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Secrets can be provided via flags or environment variables and override
//! the values in the config file.

use clap::Parser;

/// Command-line arguments for the News Publisher application.
///
/// # Examples
///
/// ```sh
/// # Render the digest locally without publishing
/// news_publisher -c config.yaml -o ./out
///
/// # Publish to both destinations and mark the articles as published
/// news_publisher --confluence --medium --mark-published --title "Weekly 42"
///
/// # Iterate on the layout using a saved Notion response
/// news_publisher --load-saved -o ./out
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the config.yaml file
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// Digest title (defaults to the config title, then "Digest YYYY-MM-DD")
    #[arg(short, long)]
    pub title: Option<String>,

    /// Text inserted verbatim after the title; `\n` starts a new line
    #[arg(short, long)]
    pub preface: Option<String>,

    /// Publish the HTML digest as a Confluence blog post
    #[arg(long)]
    pub confluence: bool,

    /// Publish the Markdown digest as a Medium story
    #[arg(long)]
    pub medium: bool,

    /// Also write both renditions to this directory
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Read articles from the saved Notion response instead of the API
    #[arg(long, conflicts_with = "save_response")]
    pub load_saved: bool,

    /// Save the Notion response for later `--load-saved` runs
    #[arg(long)]
    pub save_response: bool,

    /// Stamp `Published time` on every article once all destinations succeeded
    #[arg(long)]
    pub mark_published: bool,

    /// Notion integration token
    #[arg(long, env = "NOTION_TOKEN", hide_env_values = true)]
    pub notion_token: Option<String>,

    /// Confluence personal access token
    #[arg(long, env = "CONFLUENCE_PAT", hide_env_values = true)]
    pub confluence_pat: Option<String>,

    /// Medium integration token
    #[arg(long, env = "MEDIUM_TOKEN", hide_env_values = true)]
    pub medium_token: Option<String>,
}
