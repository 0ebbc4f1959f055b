use serde::Deserialize;
use streamverse_models::{ContentItem, ContentType};

const DEFAULT_YEAR: &str = "2024";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub result_count: u32,
    #[serde(default)]
    pub results: Vec<Track>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub track_id: Option<u64>,
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub collection_name: Option<String>,
    pub artwork_url100: Option<String>,
    pub preview_url: Option<String>,
    pub primary_genre_name: Option<String>,
    pub release_date: Option<String>,
}

fn upscale(artwork: &str, size: &str) -> String {
    artwork.replace("100x100bb", size)
}

impl Track {
    /// `None` for results that are not playable tracks (no id).
    pub fn into_content_item(self) -> Option<ContentItem> {
        let id = self.track_id?;
        let title = self.track_name.unwrap_or_else(|| "Unknown track".to_string());
        let mut item = ContentItem::new(id.to_string(), title, ContentType::Music);

        item.description = self.collection_name.unwrap_or_default();
        item.thumbnail_url = self.artwork_url100.as_deref().map(|a| upscale(a, "600x600bb"));
        item.image_url = self.artwork_url100.as_deref().map(|a| upscale(a, "800x800bb"));
        item.audio_url = self.preview_url;
        item.artist = self.artist_name;
        if let Some(genre) = self.primary_genre_name.filter(|g| !g.is_empty()) {
            item.genre = genre;
        }
        item.year = self
            .release_date
            .as_deref()
            .and_then(|d| d.split('-').next())
            .filter(|y| !y.is_empty())
            .unwrap_or(DEFAULT_YEAR)
            .to_string();
        Some(item)
    }
}
