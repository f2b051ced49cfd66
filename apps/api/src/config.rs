use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_MAL_API_BASE_URL: &str = "https://api.myanimelist.net/v2";

/// Application configuration loaded from environment variables.
/// Everything has a default; `MAL_ACCESS_TOKEN` is only checked when the MAL route is hit.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub preferences_path: PathBuf,
    /// Keep the first loaded content snapshot instead of re-reading per request.
    pub cache_content: bool,
    /// Host treated as "internal" by the link preview classifier.
    pub site_host: String,
    pub mal_access_token: Option<String>,
    pub mal_api_base_url: String,
    pub mal_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let data_dir = PathBuf::from(optional_env("DATA_DIR").unwrap_or_else(|| "data".to_string()));
        let preferences_path = optional_env("PREFERENCES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("preferences.json"));

        Ok(Config {
            preferences_path,
            cache_content: optional_env("CONTENT_CACHE")
                .map(|v| parse_bool(&v))
                .transpose()
                .context("CONTENT_CACHE must be true or false")?
                .unwrap_or(false),
            site_host: optional_env("SITE_HOST").unwrap_or_else(|| "localhost".to_string()),
            mal_access_token: optional_env("MAL_ACCESS_TOKEN"),
            mal_api_base_url: optional_env("MAL_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_MAL_API_BASE_URL.to_string()),
            mal_timeout_secs: optional_env("MAL_TIMEOUT_SECS")
                .unwrap_or_else(|| "15".to_string())
                .parse::<u64>()
                .context("MAL_TIMEOUT_SECS must be a whole number of seconds")?,
            port: optional_env("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            data_dir,
        })
    }

    /// Config rooted at `data_dir` with every other value at its default.
    #[cfg(test)]
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Config {
            preferences_path: data_dir.join("preferences.json"),
            cache_content: false,
            site_host: "localhost".to_string(),
            mal_access_token: None,
            mal_api_base_url: DEFAULT_MAL_API_BASE_URL.to_string(),
            mal_timeout_secs: 15,
            port: 8080,
            rust_log: "info".to_string(),
            data_dir,
        }
    }
}

/// Unset and blank variables are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("not a boolean: '{other}'"),
    }
}
