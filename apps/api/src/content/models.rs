use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Publication visibility. Anything other than "active" is treated as hidden.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentState {
    #[default]
    Active,
    #[serde(other)]
    Hidden,
}

impl ContentState {
    pub fn is_active(&self) -> bool {
        *self == ContentState::Active
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Abandoned,
    Notes,
    Draft,
    #[serde(rename = "In Progress")]
    InProgress,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Impossible,
    Remote,
    #[serde(rename = "highly unlikely")]
    HighlyUnlikely,
    Unlikely,
    Possible,
    Likely,
    #[serde(rename = "highly likely")]
    HighlyLikely,
    Certain,
}

/// Which feed a post was loaded from; also the first URL segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    #[default]
    Essays,
    Blog,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Essays => "essays",
            Collection::Blog => "blog",
        }
    }
}

/// A single publishable unit (post, page or note) with editorial metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub preview: String,
    #[serde(alias = "date")]
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub state: ContentState,
    // Editorial metadata is free-form in the feeds; `Status`/`Confidence`
    // only parse it for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    #[serde(
        default,
        deserialize_with = "importance_from_number_or_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub importance: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub collection: Collection,
}

impl ContentItem {
    /// `end_date` when it is non-blank, otherwise `start_date`.
    pub fn effective_date(&self) -> &str {
        match self.end_date.as_deref().map(str::trim) {
            Some(end) if !end.is_empty() => end,
            _ => self.start_date.trim(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Year used in post URLs. Falls back to the leading digits for partial dates.
    pub fn year(&self) -> String {
        let date = self.effective_date();
        match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            Ok(d) => d.format("%Y").to_string(),
            Err(_) => date.chars().take_while(|c| c.is_ascii_digit()).collect(),
        }
    }

    pub fn parsed_status(&self) -> Option<Status> {
        self.status
            .as_deref()
            .and_then(|s| serde_json::from_value(serde_json::Value::String(s.to_string())).ok())
    }

    pub fn parsed_confidence(&self) -> Option<Confidence> {
        self.confidence
            .as_deref()
            .and_then(|s| serde_json::from_value(serde_json::Value::String(s.to_string())).ok())
    }
}

/// Essays store importance as a number, some older feeds as a string.
/// Values are clamped to the 0–10 scale; anything unparsable is dropped.
fn importance_from_number_or_string<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let value = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(value.map(|v| v.round().clamp(0.0, 10.0) as u8))
}

/// `{ posts: [...] }` envelope used by the essays feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostsData {
    #[serde(default)]
    pub posts: Vec<ContentItem>,
}

/// The blog feed has shipped both as a bare array and wrapped in `{ posts }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FeedFile {
    Bare(Vec<ContentItem>),
    Wrapped(PostsData),
}

impl FeedFile {
    pub fn into_posts(self) -> Vec<ContentItem> {
        match self {
            FeedFile::Bare(posts) => posts,
            FeedFile::Wrapped(data) => data.posts,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowStatus {
    #[default]
    Active,
    #[serde(other)]
    Hidden,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryData {
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(rename = "show-status", default)]
    pub show_status: ShowStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoriesData {
    #[serde(default)]
    pub categories: Vec<CategoryData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagData {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub slug: String,
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PostType {
    Essay,
    Note,
    Paper,
    Review,
    Fiction,
    Verse,
    #[serde(other)]
    Other,
}

impl PostType {
    pub fn route_prefix(&self) -> &'static str {
        match self {
            PostType::Essay => "essays",
            PostType::Note => "notes",
            PostType::Paper => "papers",
            PostType::Review => "reviews",
            PostType::Fiction => "fiction",
            PostType::Verse => "verse",
            PostType::Other => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesPost {
    pub slug: String,
    pub order: i64,
    #[serde(rename = "type", default = "default_post_type")]
    pub post_type: PostType,
}

fn default_post_type() -> PostType {
    PostType::Essay
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesSection {
    pub title: String,
    #[serde(default)]
    pub posts: Vec<SeriesPost>,
}

/// An ordered collection of posts forming one series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesEntry {
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub preview: String,
    #[serde(default)]
    pub state: ContentState,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub posts: Vec<SeriesPost>,
    #[serde(default)]
    pub sections: Vec<SeriesSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesData {
    #[serde(default)]
    pub series: Vec<SeriesEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryPage {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub path: String,
    #[serde(rename = "show-status", default)]
    pub show_status: ShowStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryData {
    #[serde(default)]
    pub pages: Vec<DirectoryPage>,
}
