use super::genres::{self, MUSIC_GENRE_ID, NEWS_GENRE_ID, SPORT_KEYWORD_ID, TALK_GENRE_ID};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use streamverse_models::{format_rating, year_of, ContentItem, ContentType, DiscoverRequest, Language, SortField};

/// Vote floor paired with a rating filter; a high average over a handful of votes is noise
pub const RATED_MIN_VOTES: u32 = 100;
/// Vote floor applied to every series listing
pub const SERIES_MIN_VOTES: u32 = 50;
pub const PAGE_SIZE: usize = 20;

#[derive(Debug, Deserialize)]
pub struct TmdbPage {
    #[serde(default)]
    pub results: Vec<TmdbItem>,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Deserialize)]
pub struct TmdbGenre {
    pub id: u32,
}

#[derive(Debug, Deserialize)]
pub struct TmdbVideo {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
}

#[derive(Debug, Deserialize)]
pub struct TmdbVideos {
    #[serde(default)]
    pub results: Vec<TmdbVideo>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbItem {
    pub id: u64,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub name: Option<String>,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: Option<f64>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    pub popularity: Option<f64>,
    pub runtime: Option<u32>,
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
    pub videos: Option<TmdbVideos>,
}

/// Image URL prefixes from configuration.
#[derive(Debug, Clone)]
pub struct ImageBases {
    pub poster: String,
    pub backdrop: String,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl TmdbItem {
    fn display_title(&self) -> String {
        non_empty(&self.title)
            .or_else(|| non_empty(&self.original_title))
            .or_else(|| non_empty(&self.name))
            .or_else(|| non_empty(&self.original_name))
            .unwrap_or_default()
            .to_string()
    }

    fn first_genre_id(&self) -> Option<u32> {
        self.genre_ids
            .first()
            .copied()
            .or_else(|| self.genres.first().map(|g| g.id))
    }

    fn runtime_minutes(&self) -> Option<u32> {
        self.runtime
            .filter(|r| *r > 0)
            .or_else(|| self.episode_run_time.first().copied())
    }

    pub fn into_content_item(self, content_type: ContentType, images: &ImageBases) -> ContentItem {
        let release = non_empty(&self.release_date).or_else(|| non_empty(&self.first_air_date));
        let mut item = ContentItem::new(self.id.to_string(), self.display_title(), content_type);
        item.description = self.overview.clone().unwrap_or_default();
        item.thumbnail_url = non_empty(&self.poster_path).map(|p| format!("{}{}", images.poster, p));
        item.banner_url = non_empty(&self.backdrop_path).map(|p| format!("{}{}", images.backdrop, p));
        item.rating = format_rating(self.vote_average);
        item.year = year_of(release);
        item.genre = self
            .first_genre_id()
            .and_then(genres::genre_name)
            .unwrap_or("Genre")
            .to_string();
        item.popularity = self.popularity;
        item.runtime = self.runtime_minutes().map(format_runtime);
        item.video_url = self.videos.as_ref().and_then(trailer_url);
        item
    }
}

/// `135` → `"2h 15m"`
pub fn format_runtime(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Prefer a YouTube "Trailer", else any YouTube video.
pub fn trailer_url(videos: &TmdbVideos) -> Option<String> {
    let youtube = || videos.results.iter().filter(|v| v.site == "YouTube");
    youtube()
        .find(|v| v.video_type == "Trailer")
        .or_else(|| youtube().next())
        .map(|v| format!("https://www.youtube.com/embed/{}?autoplay=1", v.key))
}

/// Path segment TMDB uses for a category's detail and discover endpoints.
pub fn media_segment(category: ContentType) -> &'static str {
    match category {
        ContentType::Series => "tv",
        _ => "movie",
    }
}

/// Fixed movie rows shown on the home screen, outside paginated discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeRow {
    Trending,
    Popular,
    TopBollywood,
}

impl HomeRow {
    pub const ALL: [HomeRow; 3] = [HomeRow::Trending, HomeRow::Popular, HomeRow::TopBollywood];

    pub fn title(&self) -> &'static str {
        match self {
            HomeRow::Trending => "Trending",
            HomeRow::Popular => "Popular Movies",
            HomeRow::TopBollywood => "Top Bollywood",
        }
    }
}

/// Endpoint and parameters for a home row.
///
/// Without a language the curated TMDB lists are used as-is. With one, the
/// row becomes a popularity-sorted discover query in that original language;
/// trending then also excludes titles not yet released by `today`.
/// Top Bollywood ignores the language.
pub fn home_row_params(row: HomeRow, language: &Language, today: NaiveDate) -> (String, Vec<(&'static str, String)>) {
    let regional = |code: &str, forces_region: bool| {
        let mut params = vec![
            ("with_original_language", code.to_string()),
            ("sort_by", "popularity.desc".to_string()),
        ];
        if forces_region {
            params.push(("region", "IN".to_string()));
        }
        params
    };

    match (row, language.code()) {
        (HomeRow::TopBollywood, _) => {
            let mut params = regional("hi", true);
            params.push(("page", "1".to_string()));
            ("/discover/movie".to_string(), params)
        }
        (HomeRow::Trending, None) => ("/trending/movie/day".to_string(), Vec::new()),
        (HomeRow::Popular, None) => ("/movie/popular".to_string(), Vec::new()),
        (HomeRow::Trending, Some(code)) => {
            let mut params = regional(code, language.forces_indian_region());
            params.push(("primary_release_date.lte", today.format("%Y-%m-%d").to_string()));
            ("/discover/movie".to_string(), params)
        }
        (HomeRow::Popular, Some(code)) => {
            ("/discover/movie".to_string(), regional(code, language.forces_indian_region()))
        }
    }
}

/// Translate a discovery request into the TMDB endpoint and query parameters.
pub fn discover_params(request: &DiscoverRequest) -> (String, Vec<(&'static str, String)>) {
    let category = request.category();
    let is_series = category == ContentType::Series;
    let endpoint = format!("/discover/{}", media_segment(category));

    let mut params: BTreeMap<&'static str, String> = BTreeMap::new();
    params.insert("page", request.page.to_string());
    params.insert("include_adult", "false".to_string());
    params.insert("include_video", "false".to_string());

    let sort = request.sort();
    let direction = sort.direction.as_str();
    let sort_field = match sort.field {
        SortField::Rating => "vote_average",
        SortField::ReleaseYear if is_series => "first_air_date",
        SortField::ReleaseYear => "primary_release_date",
        SortField::Popularity => "popularity",
    };
    params.insert("sort_by", format!("{}.{}", sort_field, direction));

    let language = request.language();
    if let Some(code) = language.code() {
        params.insert("with_original_language", code.to_string());
        if language.forces_indian_region() {
            params.insert("region", "IN".to_string());
        }
    }

    let mut min_votes: Option<u32> = None;
    match category {
        ContentType::Music => {
            params.insert("with_genres", MUSIC_GENRE_ID.to_string());
        }
        ContentType::Sports => {
            params.insert("with_keywords", SPORT_KEYWORD_ID.to_string());
        }
        ContentType::Series => {
            params.insert("without_genres", format!("{},{}", NEWS_GENRE_ID, TALK_GENRE_ID));
            min_votes = Some(SERIES_MIN_VOTES);
        }
        ContentType::Movie => {}
    }

    let filters = request.filters();
    if let Some(id) = filters.genre().and_then(genres::genre_id) {
        let value = match params.get("with_genres") {
            Some(existing) => format!("{},{}", existing, id),
            None => id.to_string(),
        };
        params.insert("with_genres", value);
    }

    if filters.min_rating > 0.0 {
        params.insert("vote_average.gte", filters.min_rating.to_string());
        min_votes = Some(min_votes.map_or(RATED_MIN_VOTES, |v| v.max(RATED_MIN_VOTES)));
    }
    if let Some(votes) = min_votes {
        params.insert("vote_count.gte", votes.to_string());
    }

    if let Some(range) = filters.release_years {
        let (gte, lte) = if is_series {
            ("first_air_date.gte", "first_air_date.lte")
        } else {
            ("primary_release_date.gte", "primary_release_date.lte")
        };
        params.insert(gte, format!("{}-01-01", range.start));
        params.insert(lte, format!("{}-12-31", range.end));
    }

    (endpoint, params.into_iter().collect())
}
