//! Digest rendering and local output.
//!
//! # Submodules
//!
//! - [`markup`]: The builder contract shared by both dialects
//! - [`html`]: Confluence storage-format HTML builder (escaping)
//! - [`markdown`]: Markdown builder (pass-through)
//! - [`digest`]: Groups articles and drives a builder to produce the digest
//! - [`files`]: Writes rendered digests to a local directory
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── weekly-digest-42.md
//! └── weekly-digest-42.html
//! ```

pub mod digest;
pub mod files;
pub mod html;
pub mod markdown;
pub mod markup;
