//! Local file output of rendered digests.
//!
//! Both renditions are written next to each other, named after the slug of
//! the digest title:
//! ```text
//! output_dir/
//! ├── {slug}.md
//! └── {slug}.html
//! ```

use crate::models::RenderedDigest;
use crate::utils::{ensure_writable_dir, slugify_title};
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument};

/// Write a [`RenderedDigest`] to `{output_dir}/{slug}.md` and `.html`.
///
/// # Returns
///
/// The paths of the Markdown and HTML files, in that order.
#[instrument(level = "info", skip_all, fields(%output_dir, title = %digest.title))]
pub async fn write_digest(
    digest: &RenderedDigest,
    output_dir: &str,
) -> Result<(PathBuf, PathBuf), Box<dyn Error>> {
    ensure_writable_dir(output_dir).await?;

    let mut stem = slugify_title(&digest.title);
    if stem.is_empty() {
        stem.push_str("digest");
    }
    let dir = PathBuf::from(output_dir);
    let markdown_path = dir.join(format!("{stem}.md"));
    let html_path = dir.join(format!("{stem}.html"));

    fs::write(&markdown_path, &digest.markdown).await?;
    info!(path = %markdown_path.display(), bytes = digest.markdown.len(), "Wrote Markdown digest");
    fs::write(&html_path, &digest.html).await?;
    info!(path = %html_path.display(), bytes = digest.html.len(), "Wrote HTML digest");

    Ok((markdown_path, html_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(title: &str) -> RenderedDigest {
        RenderedDigest {
            title: title.to_string(),
            markdown: "# md".to_string(),
            html: "<h1>html</h1>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_write_digest_uses_title_slug() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let out = out.to_str().unwrap();

        let (md, html) = write_digest(&digest("Weekly Digest #42"), out).await.unwrap();
        assert!(md.ends_with("weekly-digest-42.md"));
        assert!(html.ends_with("weekly-digest-42.html"));
        assert_eq!(std::fs::read_to_string(md).unwrap(), "# md");
        assert_eq!(std::fs::read_to_string(html).unwrap(), "<h1>html</h1>");
    }

    #[tokio::test]
    async fn test_write_digest_without_title() {
        let dir = tempfile::tempdir().unwrap();
        let (md, _) = write_digest(&digest("!!!"), dir.path().to_str().unwrap())
            .await
            .unwrap();
        assert!(md.ends_with("digest.md"));
    }
}
