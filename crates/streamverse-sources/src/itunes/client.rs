use crate::error::{FetchError, SourceError};
use crate::http::{create_http_client, get_json};
use crate::itunes::api::SearchResponse;
use crate::itunes::sections::{self, section_query, DEFAULT_SECTION};
use crate::traits::{validate_request, ContentProvider};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use streamverse_config::ItunesConfig;
use streamverse_models::{ContentItem, ContentType, DiscoverRequest, Language, PageResult};
use tracing::{debug, error, warn};

const CATEGORIES: [ContentType; 1] = [ContentType::Music];

/// One page of a curated music section.
#[derive(Debug, Clone, PartialEq)]
pub struct MusicSection {
    pub section_name: String,
    pub tracks: Vec<ContentItem>,
    pub has_more: bool,
}

/// Song search over the iTunes Search API.
#[derive(Clone)]
pub struct ItunesProvider {
    client: Arc<Client>,
    base_url: String,
    page_size: u32,
}

impl ItunesProvider {
    pub fn new(config: &ItunesConfig) -> Self {
        Self {
            client: Arc::new(create_http_client()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    async fn get_tracks(&self, path: &str, params: &[(&str, String)]) -> Result<Vec<ContentItem>, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let response: SearchResponse = get_json(&self.client, &url, params).await?;
        Ok(response
            .results
            .into_iter()
            .filter_map(|track| track.into_content_item())
            .collect())
    }

    /// Fetch `page` of a named section. Failures come back as an empty,
    /// exhausted section.
    pub async fn fetch_section(
        &self,
        section: &str,
        page: u32,
        limit: u32,
        language: &Language,
    ) -> MusicSection {
        let page = page.max(1);
        let limit = limit.max(1);
        let query = section_query(section, page, limit, language);
        debug!(
            "Section '{}' page {}: term='{}' offset={} country={}",
            section, page, query.term, query.offset, query.country
        );

        let params = [
            ("term", query.term),
            ("entity", "song".to_string()),
            ("limit", limit.to_string()),
            ("offset", query.offset.to_string()),
            ("country", query.country.to_string()),
            ("media", "music".to_string()),
            ("lang", "en_us".to_string()),
        ];

        match self.get_tracks("/search", &params).await {
            Ok(tracks) => MusicSection {
                section_name: section.to_string(),
                has_more: tracks.len() == limit as usize,
                tracks,
            },
            Err(e) => {
                error!("Error fetching section {}: {}", section, e);
                MusicSection {
                    section_name: section.to_string(),
                    tracks: Vec::new(),
                    has_more: false,
                }
            }
        }
    }
}

#[async_trait]
impl ContentProvider for ItunesProvider {
    fn provider_name(&self) -> &str {
        "itunes"
    }

    fn categories(&self) -> &[ContentType] {
        &CATEGORIES
    }

    async fn discover(&self, request: &DiscoverRequest) -> Result<PageResult, SourceError> {
        validate_request(request)?;

        let section = request
            .filters()
            .genre()
            .filter(|g| sections::is_section(g))
            .unwrap_or(DEFAULT_SECTION);
        let page = request.page;
        let result = self
            .fetch_section(section, page, self.page_size, request.language())
            .await;

        let returned = result.tracks.len() as u64;
        Ok(PageResult {
            total_count: u64::from(page - 1) * u64::from(self.page_size) + returned,
            total_pages: if result.has_more { page + 1 } else { page },
            items: result.tracks,
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<ContentItem>, SourceError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let params = [
            ("term", query.to_string()),
            ("entity", "song".to_string()),
            ("limit", self.page_size.to_string()),
            ("media", "music".to_string()),
            ("lang", "en_us".to_string()),
        ];
        match self.get_tracks("/search", &params).await {
            Ok(tracks) => Ok(tracks),
            Err(e) => {
                error!("Error searching music for '{}': {}", query, e);
                Ok(Vec::new())
            }
        }
    }

    async fn details(&self, id: &str, category: ContentType) -> Result<Option<ContentItem>, SourceError> {
        if !self.serves(category) {
            warn!("iTunes has no {} details; ignoring lookup for {}", category, id);
            return Ok(None);
        }
        if id.trim().is_empty() {
            return Err(SourceError::new("track id must not be empty"));
        }

        match self.get_tracks("/lookup", &[("id", id.to_string())]).await {
            Ok(tracks) => Ok(tracks.into_iter().next()),
            Err(e) => {
                error!("Error looking up track {}: {}", id, e);
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

    fn provider(server: &MockServer, page_size: u32) -> ItunesProvider {
        ItunesProvider::new(&ItunesConfig {
            base_url: server.uri(),
            page_size,
            ..ItunesConfig::default()
        })
    }

    fn tracks(count: u64) -> serde_json::Value {
        let results: Vec<_> = (0..count)
            .map(|i| serde_json::json!({"trackId": 1000 + i, "trackName": format!("Song {}", i), "artistName": "Artist"}))
            .collect();
        serde_json::json!({"resultCount": count, "results": results})
    }

    #[tokio::test]
    async fn test_fetch_section_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("term", "Bollywood top charts"))
            .and(query_param("entity", "song"))
            .and(query_param("limit", "5"))
            .and(query_param("offset", "0"))
            .and(query_param("country", "IN"))
            .and(query_param("media", "music"))
            .and(query_param("lang", "en_us"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tracks(5)))
            .expect(1)
            .mount(&server)
            .await;

        let section = provider(&server, 20)
            .fetch_section("Trending Now", 2, 5, &Language::Hindi)
            .await;
        assert_eq!(section.section_name, "Trending Now");
        assert_eq!(section.tracks.len(), 5);
        assert!(section.has_more);
    }

    #[tokio::test]
    async fn test_short_page_means_no_more() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tracks(3)))
            .mount(&server)
            .await;

        let result = provider(&server, 20)
            .discover(&FeedKey::new(ContentType::Music).page(2))
            .await
            .unwrap();
        assert_eq!(result.items.len(), 3);
        assert_eq!(result.total_pages, 2);
        assert_eq!(result.total_count, 23);
    }

    #[tokio::test]
    async fn test_full_page_advertises_next_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("term", "party mix"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tracks(4)))
            .mount(&server)
            .await;

        let filters = Filters { genre: "Party Anthems".to_string(), ..Filters::default() };
        let result = provider(&server, 4)
            .discover(&FeedKey::new(ContentType::Music).with_filters(filters).page(1))
            .await
            .unwrap();
        assert_eq!(result.total_pages, 2);
        assert_eq!(result.total_count, 4);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_exhausted_section() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = provider(&server, 20);
        let section = provider.fetch_section("Retro Classics", 1, 20, &Language::All).await;
        assert!(section.tracks.is_empty());
        assert!(!section.has_more);

        let result = provider.discover(&FeedKey::new(ContentType::Music).page(1)).await.unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.total_pages, 1);
    }

    #[tokio::test]
    async fn test_lookup_details() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lookup"))
            .and(query_param("id", "1000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tracks(1)))
            .mount(&server)
            .await;

        let item = provider(&server, 20)
            .details("1000", ContentType::Music)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.title, "Song 0");
    }
}
