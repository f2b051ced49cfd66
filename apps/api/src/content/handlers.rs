use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::content::loader::ContentStats;
use crate::content::models::{
    CategorySummary, Collection, ContentItem, DirectoryPage, ShowStatus, TagData,
};
use crate::content::related::related_posts;
use crate::content::search::{search_posts, SearchResult};
use crate::content::series::{series_by_slug, ResolvedSeries};
use crate::content::slug::display_name;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct RelatedEntry {
    pub score: u32,
    #[serde(flatten)]
    pub post: ContentItem,
}

#[derive(Serialize)]
pub struct CategoryResponse {
    pub slug: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub posts: Vec<ContentItem>,
}

#[derive(Serialize)]
pub struct PostsResponse {
    pub posts: Vec<ContentItem>,
}

#[derive(Serialize)]
pub struct TagPostsResponse {
    pub tag: String,
    pub posts: Vec<ContentItem>,
}

#[derive(Serialize)]
pub struct TagsResponse {
    pub tags: Vec<TagData>,
}

#[derive(Serialize)]
pub struct DirectoryResponse {
    pub pages: Vec<DirectoryPage>,
}

/// GET /api/posts/search?q=&limit=
pub async fn handle_search(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Json<Vec<SearchResult>> {
    let index = state.content.snapshot().await;
    Json(search_posts(&index, q.q.as_deref().unwrap_or_default(), q.limit))
}

/// GET /api/posts/:slug
pub async fn handle_get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ContentItem>, AppError> {
    let index = state.content.snapshot().await;
    index
        .post_by_slug(&slug)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Post '{slug}' not found")))
}

/// GET /api/posts/:slug/related?limit=
///
/// Unknown slugs yield an empty list rather than a 404.
pub async fn handle_related(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(q): Query<LimitQuery>,
) -> Json<Vec<RelatedEntry>> {
    let index = state.content.snapshot().await;
    let pool = index.active_posts();
    let related = related_posts(state.related_scorer.as_ref(), &slug, &pool, q.limit)
        .into_iter()
        .map(|r| RelatedEntry {
            score: r.score,
            post: r.post.clone(),
        })
        .collect();
    Json(related)
}

/// GET /api/category/:slug
pub async fn handle_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryResponse>, AppError> {
    let index = state.content.snapshot().await;
    let meta = index
        .category_meta(&slug)
        .filter(|m| m.show_status == ShowStatus::Active);
    let posts: Vec<ContentItem> = index.posts_by_category(&slug).into_iter().cloned().collect();

    if meta.is_none() && posts.is_empty() {
        return Err(AppError::NotFound(format!("Category '{slug}' not found")));
    }
    Ok(Json(CategoryResponse {
        name: meta
            .map(|m| m.title.clone())
            .unwrap_or_else(|| display_name(&slug)),
        subtitle: meta.and_then(|m| m.subtitle.clone()),
        slug,
        posts,
    }))
}

/// GET /api/categories
pub async fn handle_categories(State(state): State<AppState>) -> Json<Vec<CategorySummary>> {
    Json(state.content.snapshot().await.categories())
}

/// GET /api/directory
pub async fn handle_directory(State(state): State<AppState>) -> Json<DirectoryResponse> {
    let index = state.content.snapshot().await;
    Json(DirectoryResponse {
        pages: index.directory_pages().into_iter().cloned().collect(),
    })
}

/// GET /api/content-stats
pub async fn handle_content_stats(State(state): State<AppState>) -> Json<ContentStats> {
    Json(state.content.snapshot().await.stats())
}

/// GET /api/data/blog/tags
pub async fn handle_blog_tags(State(state): State<AppState>) -> Json<TagsResponse> {
    let index = state.content.snapshot().await;
    Json(TagsResponse {
        tags: index.tags_in(Collection::Blog),
    })
}

/// GET /api/tags/:tag
///
/// Active posts carrying `tag` (exact match), newest first. An unused tag
/// yields an empty list.
pub async fn handle_tag_posts(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Json<TagPostsResponse> {
    let index = state.content.snapshot().await;
    let posts = index.posts_by_tag(&tag).into_iter().cloned().collect();
    Json(TagPostsResponse { tag, posts })
}

/// GET /api/data/essays/feed
pub async fn handle_essays_feed(State(state): State<AppState>) -> Json<PostsResponse> {
    let index = state.content.snapshot().await;
    Json(PostsResponse {
        posts: index
            .posts_in(Collection::Essays)
            .into_iter()
            .cloned()
            .collect(),
    })
}

/// GET /api/sequences/:slug
pub async fn handle_sequence(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ResolvedSeries>, AppError> {
    let index = state.content.snapshot().await;
    series_by_slug(&index, &slug)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Sequence not found".to_string()))
}
