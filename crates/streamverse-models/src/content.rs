use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of catalog entry. Also used as the browsing category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    Series,
    Sports,
    Music,
}

impl ContentType {
    pub const ALL: [ContentType; 4] = [
        ContentType::Movie,
        ContentType::Series,
        ContentType::Sports,
        ContentType::Music,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Movie => "movie",
            ContentType::Series => "series",
            ContentType::Sports => "sports",
            ContentType::Music => "music",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown content type '{0}' (expected movie, series, sports or music)")]
pub struct ParseContentTypeError(pub String);

impl FromStr for ContentType {
    type Err = ParseContentTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "movie" | "movies" => Ok(ContentType::Movie),
            "series" | "tv" | "show" | "shows" => Ok(ContentType::Series),
            "sports" | "sport" => Ok(ContentType::Sports),
            "music" => Ok(ContentType::Music),
            other => Err(ParseContentTypeError(other.to_string())),
        }
    }
}

/// Namespaced identity of a catalog entry.
///
/// Provider ids are only unique within one source and type, so every merge of
/// result sets from different providers keys on the pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    pub content_type: ContentType,
    pub id: String,
}

impl ItemKey {
    /// Id used for stored documents about this entry. Movies keep the bare
    /// provider id; other types are prefixed so TMDB movie and TV ids with
    /// the same number stay apart.
    pub fn storage_id(&self) -> String {
        match self.content_type {
            ContentType::Movie => self.id.clone(),
            other => format!("{}-{}", other.as_str(), self.id),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.content_type, self.id)
    }
}

/// Normalized catalog entry produced by every content provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub banner_url: Option<String>,
    /// One-decimal score or "NR"
    pub rating: String,
    #[serde(default)]
    pub year: String,
    pub content_type: ContentType,
    pub genre: String,

    // movie / series
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,

    // sports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_badge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_badge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_score: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_score: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_past: Option<bool>,

    // music
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Watch progress (0-100) overlaid from watch history
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

impl ContentItem {
    /// Create an item with the required fields set and every optional field empty.
    pub fn new(id: impl Into<String>, title: impl Into<String>, content_type: ContentType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            thumbnail_url: None,
            banner_url: None,
            rating: "NR".to_string(),
            year: String::new(),
            content_type,
            genre: "Genre".to_string(),
            video_url: None,
            runtime: None,
            popularity: None,
            home_team: None,
            away_team: None,
            home_badge: None,
            away_badge: None,
            home_score: None,
            away_score: None,
            status: None,
            match_date: None,
            is_past: None,
            audio_url: None,
            artist: None,
            image_url: None,
            progress: None,
        }
    }

    pub fn key(&self) -> ItemKey {
        ItemKey {
            content_type: self.content_type,
            id: self.id.clone(),
        }
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress.min(100));
        self
    }
}

/// Format a 0-10 vote average the way catalog cards display it.
pub fn format_rating(vote_average: Option<f64>) -> String {
    match vote_average {
        Some(v) if v > 0.0 => format!("{:.1}", v),
        _ => "NR".to_string(),
    }
}

/// Year component of an ISO `YYYY-MM-DD` date, or empty.
pub fn year_of(date: Option<&str>) -> String {
    date.and_then(|d| d.split('-').next())
        .filter(|y| !y.is_empty())
        .map(str::to_string)
        .unwrap_or_default()
}
