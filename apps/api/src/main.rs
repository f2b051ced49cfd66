use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use site_api::config::Config;
use site_api::content::loader::ContentSource;
use site_api::content::related::OverlapScorer;
use site_api::mal::MalClient;
use site_api::preview::preferences::PreviewPreferences;
use site_api::routes::build_router;
use site_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting site API v{}", env!("CARGO_PKG_VERSION"));

    let content = Arc::new(ContentSource::new(&config.data_dir, config.cache_content));
    let stats = content.snapshot().await.stats();
    info!(
        "Content from {} (cache: {}): {} posts, {} categories, {} series",
        config.data_dir.display(),
        config.cache_content,
        stats.posts,
        stats.categories,
        stats.series
    );

    let preview_prefs = PreviewPreferences::load(&config.preferences_path).await;
    info!(
        "Link previews: enabled={}, mode={}",
        preview_prefs.enabled,
        preview_prefs.mode.as_str()
    );

    let mal = MalClient::new(
        config.mal_api_base_url.clone(),
        Duration::from_secs(config.mal_timeout_secs),
    )?;
    if config.mal_access_token.is_none() {
        warn!("MAL_ACCESS_TOKEN not set; /api/mal/fav-companies will return 500");
    }

    let state = AppState {
        config: config.clone(),
        content,
        related_scorer: Arc::new(OverlapScorer::default()),
        preview_prefs: Arc::new(RwLock::new(preview_prefs)),
        anime_lists: Arc::new(mal),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
