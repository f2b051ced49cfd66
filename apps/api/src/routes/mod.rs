pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::content::handlers as content;
use crate::mal::handlers as mal;
use crate::preview::handlers as preview;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Content
        .route("/api/posts/search", get(content::handle_search))
        .route("/api/posts/:slug", get(content::handle_get_post))
        .route("/api/posts/:slug/related", get(content::handle_related))
        .route("/api/category/:slug", get(content::handle_category))
        .route("/api/categories", get(content::handle_categories))
        .route("/api/directory", get(content::handle_directory))
        .route("/api/content-stats", get(content::handle_content_stats))
        .route("/api/data/blog/tags", get(content::handle_blog_tags))
        .route("/api/tags/:tag", get(content::handle_tag_posts))
        .route("/api/data/essays/feed", get(content::handle_essays_feed))
        .route("/api/sequences/:slug", get(content::handle_sequence))
        // Link previews
        .route("/api/link-preview", get(preview::handle_link_check))
        .route(
            "/api/settings/link-preview",
            get(preview::handle_get_preferences).put(preview::handle_put_preferences),
        )
        .route("/api/link-icons", post(preview::handle_link_icons))
        // MyAnimeList
        .route("/api/mal/fav-companies", get(mal::handle_fav_companies))
        .with_state(state)
}
