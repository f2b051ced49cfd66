//! Persisted link-preview preferences.
//!
//! Stored as a flat JSON object of string values, the same keys the browser
//! kept in `localStorage`. Other keys in the file are preserved on save.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub const ENABLED_KEY: &str = "settings_universalLinkModal";
pub const MODE_KEY: &str = "settings_universalLinkModalMode";

/// Which link classes trigger previews.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMode {
    All,
    #[default]
    External,
    Off,
}

impl PreviewMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(PreviewMode::All),
            "external" => Some(PreviewMode::External),
            "off" => Some(PreviewMode::Off),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PreviewMode::All => "all",
            PreviewMode::External => "external",
            PreviewMode::Off => "off",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewPreferences {
    pub enabled: bool,
    pub mode: PreviewMode,
}

impl Default for PreviewPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: PreviewMode::External,
        }
    }
}

impl PreviewPreferences {
    /// Disabled previews behave exactly like mode `off`.
    pub fn effective_mode(&self) -> PreviewMode {
        if self.enabled {
            self.mode
        } else {
            PreviewMode::Off
        }
    }

    /// Anything but the literal `"false"` counts as enabled; an unknown mode
    /// falls back to the default.
    pub fn from_store(store: &Map<String, Value>) -> Self {
        let enabled = store.get(ENABLED_KEY).and_then(Value::as_str) != Some("false");
        let mode = match store.get(MODE_KEY).and_then(Value::as_str) {
            None => PreviewMode::default(),
            Some(raw) => PreviewMode::parse(raw).unwrap_or_else(|| {
                warn!("Ignoring invalid {MODE_KEY} value '{raw}'");
                PreviewMode::default()
            }),
        };
        Self { enabled, mode }
    }

    /// Reads preferences from `path`; a missing or unreadable file yields defaults.
    pub async fn load(path: &Path) -> Self {
        match read_store(path).await {
            Ok(Some(store)) => Self::from_store(&store),
            Ok(None) => {
                debug!("No preferences at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("Could not read preferences, using defaults: {e:#}");
                Self::default()
            }
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        // A corrupt file is replaced rather than blocking the save.
        let mut store = read_store(path).await.ok().flatten().unwrap_or_default();
        store.insert(ENABLED_KEY.to_string(), Value::String(self.enabled.to_string()));
        store.insert(MODE_KEY.to_string(), Value::String(self.mode.as_str().to_string()));

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let body = serde_json::to_string_pretty(&Value::Object(store))?;
        tokio::fs::write(path, body)
            .await
            .with_context(|| format!("Failed to write preferences to {}", path.display()))?;
        Ok(())
    }
}

async fn read_store(path: &Path) -> Result<Option<Map<String, Value>>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    let store = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON object", path.display()))?;
    Ok(Some(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_defaults_when_keys_missing() {
        let prefs = PreviewPreferences::from_store(&Map::new());
        assert_eq!(prefs, PreviewPreferences::default());
        assert_eq!(prefs.effective_mode(), PreviewMode::External);
    }

    #[test]
    fn test_disabled_means_off() {
        let prefs = PreviewPreferences::from_store(&store(json!({
            ENABLED_KEY: "false",
            MODE_KEY: "all"
        })));
        assert!(!prefs.enabled);
        assert_eq!(prefs.mode, PreviewMode::All);
        assert_eq!(prefs.effective_mode(), PreviewMode::Off);
    }

    #[test]
    fn test_invalid_mode_falls_back() {
        let prefs = PreviewPreferences::from_store(&store(json!({ MODE_KEY: "sometimes" })));
        assert_eq!(prefs.mode, PreviewMode::External);
    }

    #[tokio::test]
    async fn test_save_then_load_preserves_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, r#"{"theme":"dark"}"#).await.unwrap();

        let prefs = PreviewPreferences {
            enabled: true,
            mode: PreviewMode::All,
        };
        prefs.save(&path).await.unwrap();

        assert_eq!(PreviewPreferences::load(&path).await, prefs);
        let raw: Value =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw[MODE_KEY], "all");
        assert_eq!(raw[ENABLED_KEY], "true");
    }

    #[tokio::test]
    async fn test_load_malformed_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        tokio::fs::write(&path, "[1, 2").await.unwrap();
        assert_eq!(
            PreviewPreferences::load(&path).await,
            PreviewPreferences::default()
        );
    }
}
