use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::content::loader::ContentSource;
use crate::content::related::RelatedScorer;
use crate::mal::AnimeListSource;
use crate::preview::preferences::PreviewPreferences;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub content: Arc<ContentSource>,
    /// Pluggable related-content scorer. Default: OverlapScorer.
    pub related_scorer: Arc<dyn RelatedScorer>,
    /// Link preview preferences, loaded once at startup and rewritten on PUT.
    pub preview_prefs: Arc<RwLock<PreviewPreferences>>,
    pub anime_lists: Arc<dyn AnimeListSource>,
}
