use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::preview::domains::{domain_of, is_banned, LinkClassifier};
use crate::preview::icons::{assign_icons, IconAssignment, LinkDescriptor};
use crate::preview::preferences::{PreviewMode, PreviewPreferences};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LinkCheckQuery {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LinkCheck {
    pub url: String,
    pub domain: String,
    pub internal: bool,
    pub banned: bool,
    pub previewable: bool,
    pub mode: PreviewMode,
}

/// GET /api/link-preview?url=
///
/// How a hover over `url` would be treated under the saved preferences.
pub async fn handle_link_check(
    State(state): State<AppState>,
    Query(q): Query<LinkCheckQuery>,
) -> Result<Json<LinkCheck>, AppError> {
    let url = q
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::Validation("url is required".to_string()))?
        .to_string();

    let mode = state.preview_prefs.read().await.effective_mode();
    let classifier = LinkClassifier::new(state.config.site_host.as_str());
    Ok(Json(LinkCheck {
        domain: domain_of(&url),
        internal: classifier.is_internal(&url),
        banned: is_banned(&url),
        previewable: classifier.previewable(&url, mode),
        mode,
        url,
    }))
}

/// GET /api/settings/link-preview
pub async fn handle_get_preferences(State(state): State<AppState>) -> Json<PreviewPreferences> {
    Json(*state.preview_prefs.read().await)
}

/// PUT /api/settings/link-preview
pub async fn handle_put_preferences(
    State(state): State<AppState>,
    Json(prefs): Json<PreviewPreferences>,
) -> Result<Json<PreviewPreferences>, AppError> {
    let mut current = state.preview_prefs.write().await;
    prefs.save(&state.config.preferences_path).await?;
    *current = prefs;
    info!(
        "Link preview preferences updated: enabled={}, mode={}",
        prefs.enabled,
        prefs.mode.as_str()
    );
    Ok(Json(prefs))
}

/// POST /api/link-icons
pub async fn handle_link_icons(
    State(state): State<AppState>,
    Json(links): Json<Vec<LinkDescriptor>>,
) -> Json<Vec<IconAssignment>> {
    let classifier = LinkClassifier::new(state.config.site_host.as_str());
    Json(assign_icons(&links, &classifier))
}
