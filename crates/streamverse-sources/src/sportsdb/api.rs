use super::video::youtube_embed_url;
use serde::{Deserialize, Deserializer};
use streamverse_models::{year_of, ContentItem, ContentType};

pub const FALLBACK_THUMBNAIL: &str =
    "https://images.unsplash.com/photo-1461896836934-ffe607ba8211?w=500&q=80";
pub const FALLBACK_BANNER: &str =
    "https://image.tmdb.org/t/p/original/tT1zVbLz4GZ7rX15B4d0i3sI6xW.jpg";

/// `{"events": [...]}`; the API sends `null` instead of an empty list.
#[derive(Debug, Deserialize)]
pub struct EventsEnvelope {
    #[serde(default)]
    pub events: Option<Vec<SportsEvent>>,
}

impl EventsEnvelope {
    pub fn into_events(self) -> Vec<SportsEvent> {
        self.events.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SportsEvent {
    #[serde(deserialize_with = "string_or_number")]
    pub id_event: String,
    pub str_event: Option<String>,
    pub str_league: Option<String>,
    pub date_event: Option<String>,
    pub str_time: Option<String>,
    pub str_thumb: Option<String>,
    pub str_square: Option<String>,
    pub str_sport: Option<String>,
    pub str_home_team: Option<String>,
    pub str_away_team: Option<String>,
    pub str_home_team_badge: Option<String>,
    pub str_away_team_badge: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub int_home_score: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub int_away_score: Option<String>,
    pub str_status: Option<String>,
    pub str_video: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl SportsEvent {
    pub fn into_content_item(self, is_past: bool) -> ContentItem {
        let title = non_empty(&self.str_event).unwrap_or("Untitled event").to_string();
        let mut item = ContentItem::new(self.id_event.clone(), title, ContentType::Sports);

        item.description = format!(
            "League: {} | Date: {} | Time: {}",
            non_empty(&self.str_league).unwrap_or("Unknown"),
            non_empty(&self.date_event).unwrap_or("TBA"),
            non_empty(&self.str_time).unwrap_or("TBA"),
        );
        item.thumbnail_url = Some(
            non_empty(&self.str_thumb)
                .or_else(|| non_empty(&self.str_square))
                .unwrap_or(FALLBACK_THUMBNAIL)
                .to_string(),
        );
        item.banner_url = Some(non_empty(&self.str_thumb).unwrap_or(FALLBACK_BANNER).to_string());
        item.year = year_of(non_empty(&self.date_event));
        item.genre = non_empty(&self.str_sport).unwrap_or("Sports").to_string();
        item.match_date = self.date_event.clone();
        item.video_url = non_empty(&self.str_video).and_then(youtube_embed_url);
        item.is_past = Some(is_past);

        item.home_team = self.str_home_team;
        item.away_team = self.str_away_team;
        item.home_badge = self.str_home_team_badge;
        item.away_badge = self.str_away_team_badge;
        item.home_score = self.int_home_score;
        item.away_score = self.int_away_score;
        item.status = self.str_status;
        item
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Integer(i64),
    Float(f64),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            Self::String(s) => s,
            Self::Integer(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(deserializer).map(StringOrNumber::into_string)
}

fn optional_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(StringOrNumber::into_string))
}
