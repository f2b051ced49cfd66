//! Series (sequences) with their posts in reading order and resolved URLs.

use serde::Serialize;

use crate::content::loader::ContentIndex;
use crate::content::models::{SeriesEntry, SeriesPost};
use crate::content::slug::category_slug;

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSeriesPost {
    pub slug: String,
    pub order: i64,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSection {
    pub title: String,
    pub posts: Vec<ResolvedSeriesPost>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSeries {
    pub slug: String,
    pub title: String,
    pub preview: String,
    pub tags: Vec<String>,
    pub posts: Vec<ResolvedSeriesPost>,
    pub sections: Vec<ResolvedSection>,
}

/// Sorts by `order` ascending. The sort is stable, so equal orders keep their
/// position in the source array.
pub fn ordered(posts: &[SeriesPost]) -> Vec<&SeriesPost> {
    let mut sorted: Vec<&SeriesPost> = posts.iter().collect();
    sorted.sort_by_key(|p| p.order);
    sorted
}

/// `/{type-prefix}/{category-slug}/{slug}`, with `unknown` standing in for a
/// post that is missing or hidden in the index.
pub fn post_url(index: &ContentIndex, post: &SeriesPost) -> String {
    let category = index
        .post_by_slug(&post.slug)
        .map(|p| category_slug(&p.category))
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    format!("/{}/{}/{}", post.post_type.route_prefix(), category, post.slug)
}

fn resolve_posts(index: &ContentIndex, posts: &[SeriesPost]) -> Vec<ResolvedSeriesPost> {
    ordered(posts)
        .into_iter()
        .map(|p| ResolvedSeriesPost {
            slug: p.slug.clone(),
            order: p.order,
            url: post_url(index, p),
        })
        .collect()
}

fn resolve(index: &ContentIndex, series: &SeriesEntry) -> ResolvedSeries {
    ResolvedSeries {
        slug: series.slug.clone(),
        title: series.title.clone(),
        preview: series.preview.clone(),
        tags: series.tags.clone(),
        posts: resolve_posts(index, &series.posts),
        sections: series
            .sections
            .iter()
            .map(|s| ResolvedSection {
                title: s.title.clone(),
                posts: resolve_posts(index, &s.posts),
            })
            .collect(),
    }
}

/// Active series with `slug`, resolved; hidden series are not found.
pub fn series_by_slug(index: &ContentIndex, slug: &str) -> Option<ResolvedSeries> {
    index
        .series()
        .iter()
        .find(|s| s.slug == slug && s.state.is_active())
        .map(|s| resolve(index, s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::loader::test_support::post;
    use crate::content::models::{ContentState, PostType, SeriesSection};

    fn sp(slug: &str, order: i64, post_type: PostType) -> SeriesPost {
        SeriesPost {
            slug: slug.to_string(),
            order,
            post_type,
        }
    }

    fn index_with(series: Vec<SeriesEntry>) -> ContentIndex {
        let mut a = post("intro", "2024-01-01", ContentState::Active);
        a.category = "Deep Dives".into();
        let b = post("secret", "2024-01-01", ContentState::Hidden);
        ContentIndex::from_parts(vec![a, b], vec![], vec![], series, vec![])
    }

    fn entry(slug: &str, state: ContentState, posts: Vec<SeriesPost>) -> SeriesEntry {
        SeriesEntry {
            slug: slug.into(),
            title: "Series".into(),
            preview: String::new(),
            state,
            tags: vec![],
            posts,
            sections: vec![],
        }
    }

    #[test]
    fn test_order_ties_keep_array_order() {
        let posts = vec![
            sp("c", 2, PostType::Essay),
            sp("a", 1, PostType::Essay),
            sp("b", 1, PostType::Essay),
        ];
        let slugs: Vec<&str> = ordered(&posts).iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_urls_use_category_or_unknown() {
        let index = index_with(vec![]);
        assert_eq!(
            post_url(&index, &sp("intro", 1, PostType::Essay)),
            "/essays/deep-dives/intro"
        );
        assert_eq!(
            post_url(&index, &sp("secret", 1, PostType::Note)),
            "/notes/unknown/secret"
        );
    }

    #[test]
    fn test_hidden_series_not_found() {
        let index = index_with(vec![
            entry("open", ContentState::Active, vec![sp("intro", 1, PostType::Essay)]),
            entry("closed", ContentState::Hidden, vec![]),
        ]);
        assert!(series_by_slug(&index, "closed").is_none());
        let open = series_by_slug(&index, "open").unwrap();
        assert_eq!(open.posts[0].url, "/essays/deep-dives/intro");
    }

    #[test]
    fn test_sections_resolved_in_order() {
        let mut series = entry("s", ContentState::Active, vec![]);
        series.sections = vec![SeriesSection {
            title: "Part I".into(),
            posts: vec![sp("two", 2, PostType::Paper), sp("one", 1, PostType::Paper)],
        }];
        let index = index_with(vec![series]);
        let resolved = series_by_slug(&index, "s").unwrap();
        let slugs: Vec<&str> = resolved.sections[0]
            .posts
            .iter()
            .map(|p| p.slug.as_str())
            .collect();
        assert_eq!(slugs, vec!["one", "two"]);
    }
}
