//! Post search index, the data behind the command palette.

use serde::Serialize;

use crate::content::loader::ContentIndex;
use crate::content::models::{Confidence, ContentItem, Status};

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub preview: String,
    pub date: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    pub category: String,
    pub tags: Vec<String>,
    pub path: String,
}

impl From<&ContentItem> for SearchResult {
    fn from(post: &ContentItem) -> Self {
        SearchResult {
            slug: post.slug.clone(),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            preview: post.preview.clone(),
            date: post.effective_date().to_string(),
            status: post.parsed_status().unwrap_or(Status::Draft),
            confidence: post.parsed_confidence(),
            category: post.category.clone(),
            tags: post.tags.clone(),
            path: format!("/{}/{}/{}", post.collection.as_str(), post.year(), post.slug),
        }
    }
}

/// Case-insensitive substring search over title, subtitle, preview, category
/// and tags of active posts. A blank query returns the whole active index.
pub fn search_posts(index: &ContentIndex, query: &str, limit: Option<usize>) -> Vec<SearchResult> {
    let needle = query.trim().to_lowercase();
    let matches = |post: &ContentItem| {
        needle.is_empty()
            || post.title.to_lowercase().contains(&needle)
            || post
                .subtitle
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(&needle))
            || post.preview.to_lowercase().contains(&needle)
            || post.category.to_lowercase().contains(&needle)
            || post.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    };

    index
        .active_posts()
        .into_iter()
        .filter(|p| matches(*p))
        .take(limit.unwrap_or(usize::MAX))
        .map(SearchResult::from)
        .collect()
}
