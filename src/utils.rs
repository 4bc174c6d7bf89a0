//! Utility functions for string handling, titles, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Line-break normalization for operator and Notion supplied text
//! - String truncation for logging response bodies
//! - Slugification for output file names
//! - Default digest titles
//! - File system validation for output directories

use chrono::NaiveDate;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Replace the literal two-character `\n` sequence with a real newline.
///
/// Text typed into Notion or passed on the command line often carries the
/// escaped form; the renderers only split on real newlines.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_line_breaks(r"one\ntwo"), "one\ntwo");
/// ```
pub fn normalize_line_breaks(text: &str) -> String {
    text.replace("\\n", "\n")
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Convert a title to a file-name friendly slug.
///
/// Lowercases the text, removes special characters, and replaces spaces
/// with hyphens.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify_title("Hello World"), "hello-world");
/// assert_eq!(slugify_title("Test-Article!"), "test-article");
/// ```
pub fn slugify_title(title: &str) -> String {
    title
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ' && c != '-', "")
        .trim()
        .replace(' ', "-")
}

/// Title used when neither the CLI nor the config supplies one.
pub fn default_title(date: NaiveDate) -> String {
    format!("Digest {}", date.format("%Y-%m-%d"))
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
