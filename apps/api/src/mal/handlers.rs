use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::mal::{rank_companies, FavoriteCompany, MalError};
use crate::state::AppState;

impl From<MalError> for AppError {
    fn from(e: MalError) -> Self {
        AppError::Upstream(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct FavCompaniesQuery {
    pub username: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct FavCompaniesResponse {
    pub username: String,
    pub companies: Vec<FavoriteCompany>,
}

/// GET /api/mal/fav-companies?username=
pub async fn handle_fav_companies(
    State(state): State<AppState>,
    Query(q): Query<FavCompaniesQuery>,
) -> Result<Json<FavCompaniesResponse>, AppError> {
    let username = q
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::Validation("username is required".to_string()))?;
    let token = state
        .config
        .mal_access_token
        .as_deref()
        .ok_or_else(|| AppError::MissingConfig("MAL_ACCESS_TOKEN is not set".to_string()))?;

    let list = state.anime_lists.anime_list(username, token).await?;
    let companies = rank_companies(&list, q.limit);
    info!(
        "Ranked {} companies from {} anime for {username}",
        companies.len(),
        list.len()
    );

    Ok(Json(FavCompaniesResponse {
        username: username.to_string(),
        companies,
    }))
}
