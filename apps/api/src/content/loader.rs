//! Content Index Loader: reads the JSON content collections from `DATA_DIR`
//! and exposes filtered, sorted views over them.
//!
//! Loading never fails outward: a missing or malformed file becomes an empty
//! collection and an `error!` diagnostic, so a broken feed degrades a page
//! instead of taking the service down.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::content::models::{
    CategoriesData, CategoryData, CategorySummary, Collection, ContentItem, DirectoryData,
    DirectoryPage, FeedFile, PostsData, SeriesData, SeriesEntry, ShowStatus, TagData,
};
use crate::content::slug::{category_slug, display_name};

const ESSAYS_FEED: &str = "essays/feed.json";
const BLOG_FEED: &str = "blog/feed.json";
const CATEGORY_DATA: &str = "essays/category-data.json";
const SERIES_DATA: &str = "essays/series.json";
const PAGE_DIRECTORY: &str = "page-directory.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentStats {
    pub posts: usize,
    pub essays: usize,
    pub blog: usize,
    pub tags: usize,
    pub categories: usize,
    pub series: usize,
    pub pages: usize,
}

/// Immutable snapshot of every content collection.
#[derive(Debug, Default)]
pub struct ContentIndex {
    /// All posts, newest first. Includes hidden ones; every public view filters.
    posts: Vec<ContentItem>,
    category_meta: Vec<CategoryData>,
    series: Vec<SeriesEntry>,
    pages: Vec<DirectoryPage>,
}

impl ContentIndex {
    /// Loads every collection under `data_dir`. Never fails.
    pub async fn load(data_dir: &Path) -> Self {
        let essays = read_json::<PostsData>(&data_dir.join(ESSAYS_FEED))
            .await
            .map(|d| d.posts)
            .unwrap_or_default();
        let blog = read_json::<FeedFile>(&data_dir.join(BLOG_FEED))
            .await
            .map(FeedFile::into_posts)
            .unwrap_or_default();
        let category_meta = read_json::<CategoriesData>(&data_dir.join(CATEGORY_DATA))
            .await
            .map(|d| d.categories)
            .unwrap_or_default();
        let series = read_json::<SeriesData>(&data_dir.join(SERIES_DATA))
            .await
            .map(|d| d.series)
            .unwrap_or_default();
        let pages = read_json::<DirectoryData>(&data_dir.join(PAGE_DIRECTORY))
            .await
            .map(|d| d.pages)
            .unwrap_or_default();

        let index = Self::from_parts(essays, blog, category_meta, series, pages);
        info!(
            "Content index loaded from {}: {} posts, {} series, {} pages",
            data_dir.display(),
            index.posts.len(),
            index.series.len(),
            index.pages.len()
        );
        index
    }

    /// Builds an index from already-parsed collections.
    ///
    /// Essays come before blog posts; the first occurrence of a slug wins and
    /// later duplicates are dropped. The merged list is then stably sorted by
    /// effective date, newest first.
    pub fn from_parts(
        essays: Vec<ContentItem>,
        blog: Vec<ContentItem>,
        category_meta: Vec<CategoryData>,
        series: Vec<SeriesEntry>,
        pages: Vec<DirectoryPage>,
    ) -> Self {
        let tagged = essays
            .into_iter()
            .map(|p| (p, Collection::Essays))
            .chain(blog.into_iter().map(|p| (p, Collection::Blog)));

        let mut seen = HashSet::new();
        let mut posts = Vec::new();
        for (mut post, collection) in tagged {
            if !seen.insert(post.slug.clone()) {
                warn!(
                    "Duplicate slug '{}' in {} feed; keeping the first occurrence",
                    post.slug,
                    collection.as_str()
                );
                continue;
            }
            post.collection = collection;
            posts.push(post);
        }

        warn_on_category_collisions(&posts);

        // Dates are YYYY-MM-DD, so lexical order is chronological.
        posts.sort_by(|a, b| b.effective_date().cmp(a.effective_date()));

        Self {
            posts,
            category_meta,
            series,
            pages,
        }
    }

    /// Every post, hidden included, newest first.
    pub fn all_posts(&self) -> &[ContentItem] {
        &self.posts
    }

    /// Active posts only, in `all_posts` order.
    pub fn active_posts(&self) -> Vec<&ContentItem> {
        self.posts.iter().filter(|p| p.is_active()).collect()
    }

    pub fn post_by_slug(&self, slug: &str) -> Option<&ContentItem> {
        self.posts.iter().find(|p| p.is_active() && p.slug == slug)
    }

    pub fn posts_by_category(&self, slug: &str) -> Vec<&ContentItem> {
        self.posts
            .iter()
            .filter(|p| p.is_active() && category_slug(&p.category) == slug)
            .collect()
    }

    pub fn posts_by_tag(&self, tag: &str) -> Vec<&ContentItem> {
        self.posts
            .iter()
            .filter(|p| p.is_active() && p.tags.iter().any(|t| t == tag))
            .collect()
    }

    pub fn posts_in(&self, collection: Collection) -> Vec<&ContentItem> {
        self.posts
            .iter()
            .filter(|p| p.is_active() && p.collection == collection)
            .collect()
    }

    /// Tag counts over active posts, sorted by name.
    pub fn tags(&self) -> Vec<TagData> {
        tag_counts(self.posts.iter().filter(|p| p.is_active()))
    }

    /// Tag counts over the active posts of one feed.
    pub fn tags_in(&self, collection: Collection) -> Vec<TagData> {
        tag_counts(self.posts_in(collection).into_iter())
    }

    /// Category summaries over active posts. Categories whose metadata is
    /// hidden are skipped; names come from metadata or the title-cased slug.
    pub fn categories(&self) -> Vec<CategorySummary> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for post in self.posts.iter().filter(|p| p.is_active()) {
            *counts.entry(category_slug(&post.category)).or_insert(0) += 1;
        }

        let mut summaries: Vec<CategorySummary> = counts
            .into_iter()
            .filter_map(|(slug, count)| {
                let meta = self.category_meta.iter().find(|c| c.slug == slug);
                if meta.is_some_and(|m| m.show_status == ShowStatus::Hidden) {
                    return None;
                }
                let name = meta
                    .map(|m| m.title.clone())
                    .unwrap_or_else(|| display_name(&slug));
                Some(CategorySummary { slug, name, count })
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.slug.cmp(&b.slug)));
        summaries
    }

    pub fn category_meta(&self, slug: &str) -> Option<&CategoryData> {
        self.category_meta.iter().find(|c| c.slug == slug)
    }

    pub fn series(&self) -> &[SeriesEntry] {
        &self.series
    }

    pub fn directory_pages(&self) -> Vec<&DirectoryPage> {
        self.pages
            .iter()
            .filter(|p| p.show_status == ShowStatus::Active)
            .collect()
    }

    pub fn stats(&self) -> ContentStats {
        ContentStats {
            posts: self.active_posts().len(),
            essays: self.posts_in(Collection::Essays).len(),
            blog: self.posts_in(Collection::Blog).len(),
            tags: self.tags().len(),
            categories: self.categories().len(),
            series: self.series.iter().filter(|s| s.state.is_active()).count(),
            pages: self.directory_pages().len(),
        }
    }
}

fn tag_counts<'a>(posts: impl Iterator<Item = &'a ContentItem>) -> Vec<TagData> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for post in posts {
        // A tag listed twice on one post still counts that post once.
        let unique: HashSet<&str> = post.tags.iter().map(String::as_str).collect();
        for tag in unique {
            *counts.entry(tag).or_insert(0) += 1;
        }
    }

    let mut tags: Vec<TagData> = counts
        .into_iter()
        .map(|(name, count)| TagData {
            name: name.to_string(),
            count,
        })
        .collect();
    tags.sort_by(|a, b| a.name.cmp(&b.name));
    tags
}

/// Logs category strings that differ but share a slug. Accepted behaviour:
/// the posts are listed together under that slug.
fn warn_on_category_collisions(posts: &[ContentItem]) {
    let mut by_slug: HashMap<String, &str> = HashMap::new();
    let mut reported = HashSet::new();
    for post in posts {
        let slug = category_slug(&post.category);
        match by_slug.get(slug.as_str()) {
            Some(existing) if *existing != post.category => {
                if reported.insert(slug.clone()) {
                    warn!(
                        "Categories '{}' and '{}' both map to slug '{}'",
                        existing, post.category, slug
                    );
                }
            }
            Some(_) => {}
            None => {
                by_slug.insert(slug, post.category.as_str());
            }
        }
    }
}

/// Reads and parses a JSON file, logging and returning `None` on any failure.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) => {
            error!("Error loading {}: {e}", path.display());
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(parsed) => {
            debug!("Parsed {}", path.display());
            Some(parsed)
        }
        Err(e) => {
            let sample: String = raw.chars().take(100).collect();
            error!("Error parsing {}: {e} (content sample: {sample:?})", path.display());
            None
        }
    }
}

/// Where handlers get their `ContentIndex` from.
///
/// Without caching every call re-reads `DATA_DIR`, so edits show up without
/// a restart. With caching the first snapshot is kept for the process lifetime.
pub struct ContentSource {
    data_dir: PathBuf,
    cache: Option<RwLock<Option<Arc<ContentIndex>>>>,
}

impl ContentSource {
    pub fn new(data_dir: impl Into<PathBuf>, cache: bool) -> Self {
        Self {
            data_dir: data_dir.into(),
            cache: cache.then(|| RwLock::new(None)),
        }
    }

    /// A source that always serves `index`.
    #[cfg(test)]
    pub fn fixed(index: ContentIndex) -> Self {
        Self {
            data_dir: PathBuf::new(),
            cache: Some(RwLock::new(Some(Arc::new(index)))),
        }
    }

    pub async fn snapshot(&self) -> Arc<ContentIndex> {
        let Some(cache) = &self.cache else {
            return Arc::new(ContentIndex::load(&self.data_dir).await);
        };

        if let Some(index) = cache.read().await.as_ref() {
            return Arc::clone(index);
        }

        let mut slot = cache.write().await;
        // Another request may have filled the slot while we waited.
        if let Some(index) = slot.as_ref() {
            return Arc::clone(index);
        }
        let index = Arc::new(ContentIndex::load(&self.data_dir).await);
        *slot = Some(Arc::clone(&index));
        index
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::content::models::{ContentItem, ContentState};

    pub fn post(slug: &str, date: &str, state: ContentState) -> ContentItem {
        ContentItem {
            slug: slug.to_string(),
            title: format!("Post {slug}"),
            subtitle: None,
            preview: String::new(),
            start_date: date.to_string(),
            end_date: None,
            tags: vec![],
            category: "Misc".to_string(),
            state,
            status: None,
            confidence: None,
            importance: None,
            cover_image: None,
            collection: Default::default(),
        }
    }
}
