use crate::error::SourceError;
use crate::http::{create_http_client, get_json};
use crate::tmdb::api::{self, HomeRow, ImageBases, TmdbItem, TmdbPage};
use crate::traits::{validate_request, ContentProvider};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use streamverse_config::TmdbConfig;
use streamverse_models::{ContentItem, ContentType, DiscoverRequest, Language, PageResult};
use tracing::{debug, error, warn};

const CATEGORIES: [ContentType; 2] = [ContentType::Movie, ContentType::Series];

/// Movie and series catalog backed by TMDB.
#[derive(Clone)]
pub struct TmdbProvider {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
    images: ImageBases,
}

impl TmdbProvider {
    pub fn new(config: &TmdbConfig) -> Self {
        Self {
            client: Arc::new(create_http_client()),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            images: ImageBases {
                poster: config.image_base_url.clone(),
                backdrop: config.backdrop_base_url.clone(),
            },
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_key(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        params.push(("api_key", self.api_key.clone()));
        params
    }

    /// One curated movie row. Failures are logged and give an empty row.
    pub async fn home_row(&self, row: HomeRow, language: &Language) -> Vec<ContentItem> {
        let (endpoint, params) = api::home_row_params(row, language, Utc::now().date_naive());
        match get_json::<TmdbPage>(&self.client, &self.url(&endpoint), &self.with_key(params)).await {
            Ok(page) => page
                .results
                .into_iter()
                .map(|raw| raw.into_content_item(ContentType::Movie, &self.images))
                .collect(),
            Err(e) => {
                error!("Error fetching {} movies from TMDB: {}", row.title(), e);
                Vec::new()
            }
        }
    }

    /// All home rows, fetched concurrently.
    pub async fn home(&self, language: &Language) -> HomeRows {
        let (trending, popular, top_bollywood) = futures::join!(
            self.home_row(HomeRow::Trending, language),
            self.home_row(HomeRow::Popular, language),
            self.home_row(HomeRow::TopBollywood, language),
        );
        HomeRows {
            trending,
            popular,
            top_bollywood,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HomeRows {
    pub trending: Vec<ContentItem>,
    pub popular: Vec<ContentItem>,
    pub top_bollywood: Vec<ContentItem>,
}

#[async_trait]
impl ContentProvider for TmdbProvider {
    fn provider_name(&self) -> &str {
        "tmdb"
    }

    fn categories(&self) -> &[ContentType] {
        &CATEGORIES
    }

    async fn discover(&self, request: &DiscoverRequest) -> Result<PageResult, SourceError> {
        validate_request(request)?;
        let category = request.category();
        let (endpoint, params) = api::discover_params(request);

        match get_json::<TmdbPage>(&self.client, &self.url(&endpoint), &self.with_key(params)).await {
            Ok(page) => {
                let items: Vec<ContentItem> = page
                    .results
                    .into_iter()
                    .map(|raw| raw.into_content_item(category, &self.images))
                    .collect();
                debug!(
                    "TMDB {} page {}: {} items ({} total, {} pages)",
                    category,
                    request.page,
                    items.len(),
                    page.total_results,
                    page.total_pages
                );
                Ok(PageResult {
                    items,
                    total_count: page.total_results,
                    total_pages: page.total_pages,
                })
            }
            Err(e) => {
                error!("Error discovering {} content from TMDB: {}", category, e);
                Ok(PageResult::empty())
            }
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<ContentItem>, SourceError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let params = self.with_key(vec![("query", query.to_string())]);
        match get_json::<TmdbPage>(&self.client, &self.url("/search/movie"), &params).await {
            Ok(page) => Ok(page
                .results
                .into_iter()
                .map(|raw| raw.into_content_item(ContentType::Movie, &self.images))
                .collect()),
            Err(e) => {
                error!("Error searching TMDB for '{}': {}", query, e);
                Ok(Vec::new())
            }
        }
    }

    async fn details(&self, id: &str, category: ContentType) -> Result<Option<ContentItem>, SourceError> {
        if !self.serves(category) {
            warn!("TMDB has no {} details; ignoring lookup for {}", category, id);
            return Ok(None);
        }
        if id.trim().is_empty() {
            return Err(SourceError::new("content id must not be empty"));
        }

        let path = format!("/{}/{}", api::media_segment(category), id);
        let params = self.with_key(vec![("append_to_response", "videos".to_string())]);
        match get_json::<TmdbItem>(&self.client, &self.url(&path), &params).await {
            Ok(raw) => Ok(Some(raw.into_content_item(category, &self.images))),
            Err(e) => {
                error!("Error fetching details for {} {}: {}", category, id, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamverse_models::{FeedKey, Filters};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> TmdbProvider {
        TmdbProvider::new(&TmdbConfig {
            api_key: "test-key".to_string(),
            base_url: server.uri(),
            ..TmdbConfig::default()
        })
    }

    fn page_body(count: usize, total_pages: u32) -> serde_json::Value {
        let results: Vec<_> = (0..count)
            .map(|i| serde_json::json!({"id": 100 + i, "title": format!("Movie {}", i), "vote_average": 7.0}))
            .collect();
        serde_json::json!({"page": 1, "results": results, "total_results": 20 * total_pages, "total_pages": total_pages})
    }

    #[tokio::test]
    async fn test_discover_maps_request_and_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/discover/movie"))
            .and(query_param("api_key", "test-key"))
            .and(query_param("page", "1"))
            .and(query_param("sort_by", "popularity.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(20, 5)))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider(&server)
            .discover(&FeedKey::new(ContentType::Movie).page(1))
            .await
            .unwrap();
        assert_eq!(result.items.len(), 20);
        assert!(result.items.len() <= api::PAGE_SIZE);
        assert_eq!(result.total_pages, 5);
        assert_eq!(result.total_count, 100);
        assert!(result.items.iter().all(|i| i.content_type == ContentType::Movie));
    }

    #[tokio::test]
    async fn test_discover_series_forces_series_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/discover/tv"))
            .and(query_param("without_genres", "10763,10767"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"id": 1, "name": "Show"}], "total_results": 1, "total_pages": 1
            })))
            .mount(&server)
            .await;

        let result = provider(&server)
            .discover(&FeedKey::new(ContentType::Series).page(1))
            .await
            .unwrap();
        assert_eq!(result.items[0].content_type, ContentType::Series);
        assert_eq!(result.items[0].title, "Show");
    }

    #[tokio::test]
    async fn test_upstream_failure_degrades_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = provider(&server);
        let result = provider.discover(&FeedKey::new(ContentType::Movie).page(1)).await.unwrap();
        assert_eq!(result, PageResult::empty());
        assert!(provider.search("alien").await.unwrap().is_empty());
        assert!(provider.details("550", ContentType::Movie).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_payload_degrades_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = provider(&server)
            .discover(&FeedKey::new(ContentType::Movie).page(1))
            .await
            .unwrap();
        assert_eq!(result.total_pages, 0);
        assert!(result.items.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_filters_are_rejected_before_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1, 1)))
            .expect(0)
            .mount(&server)
            .await;

        let filters = Filters { min_rating: 42.0, ..Filters::default() };
        let result = provider(&server)
            .discover(&FeedKey::new(ContentType::Movie).with_filters(filters).page(1))
            .await;
        assert!(matches!(result, Err(SourceError::InvalidFilters(_))));
    }

    #[tokio::test]
    async fn test_details_with_trailer_and_runtime() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/550"))
            .and(query_param("append_to_response", "videos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 550,
                "title": "Fight Club",
                "runtime": 139,
                "genres": [{"id": 18, "name": "Drama"}],
                "videos": {"results": [{"key": "SUXWAEX2jlg", "site": "YouTube", "type": "Trailer"}]}
            })))
            .mount(&server)
            .await;

        let item = provider(&server)
            .details("550", ContentType::Movie)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.runtime.as_deref(), Some("2h 19m"));
        assert_eq!(item.genre, "Drama");
        assert_eq!(
            item.video_url.as_deref(),
            Some("https://www.youtube.com/embed/SUXWAEX2jlg?autoplay=1")
        );
    }

    #[tokio::test]
    async fn test_home_rows_without_language() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/trending/movie/day"))
            .and(query_param("api_key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(3, 1)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/movie/popular"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(2, 1)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/discover/movie"))
            .and(query_param("with_original_language", "hi"))
            .and(query_param("region", "IN"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1, 1)))
            .expect(1)
            .mount(&server)
            .await;

        let rows = provider(&server).home(&Language::All).await;
        assert_eq!(rows.trending.len(), 3);
        assert_eq!(rows.popular.len(), 2);
        assert_eq!(rows.top_bollywood.len(), 1);
        assert!(rows.trending.iter().all(|i| i.content_type == ContentType::Movie));
    }

    #[tokio::test]
    async fn test_trending_with_language_uses_discover() {
        let server = MockServer::start().await;
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        Mock::given(method("GET"))
            .and(path("/discover/movie"))
            .and(query_param("with_original_language", "bn"))
            .and(query_param("region", "IN"))
            .and(query_param("sort_by", "popularity.desc"))
            .and(query_param("primary_release_date.lte", today.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(4, 1)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/trending/movie/day"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1, 1)))
            .expect(0)
            .mount(&server)
            .await;

        let trending = provider(&server).home_row(HomeRow::Trending, &Language::Bengali).await;
        assert_eq!(trending.len(), 4);
    }

    #[tokio::test]
    async fn test_home_row_failure_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/popular"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let rows = provider(&server).home(&Language::All).await;
        assert!(rows.popular.is_empty());
        assert!(rows.trending.is_empty());
    }

    #[tokio::test]
    async fn test_empty_search_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(1, 1)))
            .expect(0)
            .mount(&server)
            .await;

        assert!(provider(&server).search("   ").await.unwrap().is_empty());
    }
}
