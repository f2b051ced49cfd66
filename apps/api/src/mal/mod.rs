//! MyAnimeList client: fetches a user's anime list and ranks the studios
//! behind it.
//!
//! Handlers never talk to MAL directly; they go through `AnimeListSource` so
//! tests can substitute a canned list.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod handlers;

const PAGE_SIZE: u32 = 1000;
/// Upper bound on followed `paging.next` links.
const MAX_PAGES: usize = 10;
const PRODUCER_URL: &str = "https://myanimelist.net/anime/producer";

#[derive(Debug, Error)]
pub enum MalError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("MAL API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid MAL base URL: {0}")]
    BaseUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Studio {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnimeNode {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub studios: Vec<Studio>,
}

#[derive(Debug, Deserialize)]
struct AnimeListPage {
    #[serde(default)]
    data: Vec<AnimeListEntry>,
    #[serde(default)]
    paging: Paging,
}

#[derive(Debug, Deserialize)]
struct AnimeListEntry {
    node: AnimeNode,
}

#[derive(Debug, Default, Deserialize)]
struct Paging {
    next: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FavoriteCompany {
    pub id: u64,
    pub name: String,
    /// Number of list entries the studio worked on.
    pub count: usize,
    pub link: String,
}

#[async_trait]
pub trait AnimeListSource: Send + Sync {
    async fn anime_list(&self, username: &str, access_token: &str)
        -> Result<Vec<AnimeNode>, MalError>;
}

#[derive(Clone)]
pub struct MalClient {
    client: Client,
    base_url: String,
}

impl MalClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, MalError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into(),
        })
    }

    fn list_url(&self, username: &str) -> Result<Url, MalError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| MalError::BaseUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| MalError::BaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["users", username, "animelist"]);
        url.query_pairs_mut()
            .append_pair("fields", "studios")
            .append_pair("limit", &PAGE_SIZE.to_string())
            .append_pair("nsfw", "true");
        Ok(url)
    }
}

#[async_trait]
impl AnimeListSource for MalClient {
    async fn anime_list(
        &self,
        username: &str,
        access_token: &str,
    ) -> Result<Vec<AnimeNode>, MalError> {
        let mut next = Some(self.list_url(username)?.to_string());
        let mut entries = Vec::new();

        for _ in 0..MAX_PAGES {
            let Some(url) = next.take() else { break };
            let response = self
                .client
                .get(&url)
                .bearer_auth(access_token)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                warn!("MAL API returned {status} for {username}");
                return Err(MalError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let page: AnimeListPage = response.json().await?;
            entries.extend(page.data.into_iter().map(|e| e.node));
            next = page.paging.next;
        }

        debug!("Fetched {} anime list entries for {username}", entries.len());
        Ok(entries)
    }
}

/// Studios ranked by how many entries of `list` they worked on, then by name.
pub fn rank_companies(list: &[AnimeNode], limit: Option<usize>) -> Vec<FavoriteCompany> {
    let mut counts: HashMap<u64, (&str, usize)> = HashMap::new();
    for anime in list {
        for studio in &anime.studios {
            counts.entry(studio.id).or_insert((studio.name.as_str(), 0)).1 += 1;
        }
    }

    let mut ranked: Vec<FavoriteCompany> = counts
        .into_iter()
        .map(|(id, (name, count))| FavoriteCompany {
            id,
            name: name.to_string(),
            count,
            link: format!("{PRODUCER_URL}/{id}"),
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    if let Some(limit) = limit {
        ranked.truncate(limit);
    }
    ranked
}
