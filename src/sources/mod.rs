//! Article sources.
//!
//! A source yields the unpublished [`Article`](crate::models::Article)s that
//! go into the next digest and records which of them went out.
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Notion | [`notion`] | Database query API | Paginated; can replay a saved response |

pub mod notion;
