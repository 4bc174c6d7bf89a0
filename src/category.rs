//! Category grouping and chapter ordering.
//!
//! Articles are bucketed by their upper-cased category. Chapters are then
//! emitted in the order given by a [`CategoryOrder`], never alphabetically
//! and never in input order.

use crate::error::DataError;
use crate::models::Article;
use std::collections::BTreeMap;

/// The standard chapter order of the digest.
pub const DEFAULT_CATEGORIES: [&str; 7] = ["DEV", "OPS", "DB", "SEC", "TOOLS", "SOFT", "TRIVIA"];

/// Articles grouped by normalized category, each bucket in input order.
pub type CategoryBuckets<'a> = BTreeMap<String, Vec<&'a Article>>;

/// Canonical grouping key for a category name.
pub fn normalize(category: &str) -> String {
    category.trim().to_uppercase()
}

/// Partition articles into category buckets.
///
/// # Errors
///
/// Returns [`DataError::MissingCategory`] for the first article whose
/// category is absent or blank.
pub fn group(articles: &[Article]) -> Result<CategoryBuckets<'_>, DataError> {
    let mut buckets: CategoryBuckets<'_> = BTreeMap::new();
    for article in articles {
        let key = article
            .category
            .as_deref()
            .map(normalize)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| DataError::MissingCategory {
                article: article.id.clone(),
            })?;
        buckets.entry(key).or_default().push(article);
    }
    Ok(buckets)
}

/// Ordered list of the categories that get a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOrder(Vec<String>);

impl CategoryOrder {
    /// Build an order from category names; names are normalized and
    /// repeated names keep their first position.
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut order: Vec<String> = Vec::new();
        for category in categories {
            let key = normalize(category.as_ref());
            if !key.is_empty() && !order.contains(&key) {
                order.push(key);
            }
        }
        Self(order)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.0.iter().any(|c| c == category)
    }
}

impl Default for CategoryOrder {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::article;

    fn ids(bucket: &[&Article]) -> Vec<String> {
        bucket.iter().map(|a| a.id.clone()).collect()
    }

    #[test]
    fn test_group_is_case_insensitive_and_stable() {
        let articles = vec![
            article("1", "Dev", "A"),
            article("2", "sec", "B"),
            article("3", "DEV", "C"),
            article("4", " dev ", "D"),
            article("5", "Sec", "E"),
        ];

        let buckets = group(&articles).unwrap();
        assert_eq!(buckets.len(), 2);
        assert_eq!(ids(&buckets["DEV"]), vec!["1", "3", "4"]);
        assert_eq!(ids(&buckets["SEC"]), vec!["2", "5"]);
    }

    #[test]
    fn test_group_follows_input_order_for_any_permutation() {
        let articles = vec![
            article("1", "ops", "A"),
            article("2", "Dev", "B"),
            article("3", "OPS", "C"),
            article("4", "dev", "D"),
        ];
        let reversed: Vec<Article> = articles.iter().rev().cloned().collect();

        let forward = group(&articles).unwrap();
        let backward = group(&reversed).unwrap();
        assert_eq!(ids(&forward["OPS"]), vec!["1", "3"]);
        assert_eq!(ids(&backward["OPS"]), vec!["3", "1"]);
        assert_eq!(ids(&backward["DEV"]), vec!["4", "2"]);
    }

    #[test]
    fn test_group_rejects_missing_category() {
        let mut blank = article("2", "", "B");
        let articles = vec![article("1", "Dev", "A"), blank.clone()];
        assert_eq!(
            group(&articles).unwrap_err(),
            DataError::MissingCategory {
                article: "2".to_string()
            }
        );

        blank.category = None;
        assert!(group(&[blank]).is_err());
    }

    #[test]
    fn test_category_order_normalizes_and_dedupes() {
        let order = CategoryOrder::new(["dev", "Sec", "DEV", " "]);
        assert_eq!(order.iter().collect::<Vec<_>>(), vec!["DEV", "SEC"]);
        assert!(order.contains("SEC"));
        assert!(!order.contains("OPS"));
    }

    #[test]
    fn test_default_order() {
        let order = CategoryOrder::default();
        assert_eq!(order.iter().collect::<Vec<_>>(), DEFAULT_CATEGORIES.to_vec());
    }
}
