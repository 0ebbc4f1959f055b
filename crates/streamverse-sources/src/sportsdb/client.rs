use crate::error::{FetchError, SourceError};
use crate::http::{create_http_client, get_json};
use crate::sportsdb::api::{EventsEnvelope, SportsEvent};
use crate::traits::{validate_request, ContentProvider};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use streamverse_config::SportsDbConfig;
use streamverse_models::{ContentItem, ContentType, DiscoverRequest, PageResult};
use tracing::{debug, error, warn};

const CATEGORIES: [ContentType; 1] = [ContentType::Sports];

/// Past and upcoming fixtures of a single league from TheSportsDB.
///
/// The free tier has no pagination, so the whole league window is served
/// as page 1 and later pages come back empty.
#[derive(Clone)]
pub struct SportsDbProvider {
    client: Arc<Client>,
    base_url: String,
    league_id: String,
}

impl SportsDbProvider {
    pub fn new(config: &SportsDbConfig) -> Self {
        Self {
            client: Arc::new(create_http_client()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            league_id: config.league_id.clone(),
        }
    }

    async fn fetch_events(&self, endpoint: &str, id: &str) -> Result<Vec<SportsEvent>, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let envelope: EventsEnvelope = get_json(&self.client, &url, &[("id", id.to_string())]).await?;
        Ok(envelope.into_events())
    }

    async fn league_events(&self, endpoint: &str, is_past: bool) -> Vec<ContentItem> {
        match self.fetch_events(endpoint, &self.league_id).await {
            Ok(events) => events.into_iter().map(|e| e.into_content_item(is_past)).collect(),
            Err(e) => {
                error!(
                    "Error fetching {} for league {}: {}",
                    endpoint, self.league_id, e
                );
                Vec::new()
            }
        }
    }

    pub async fn past_matches(&self) -> Vec<ContentItem> {
        self.league_events("eventspastleague.php", true).await
    }

    pub async fn next_matches(&self) -> Vec<ContentItem> {
        self.league_events("eventsnextleague.php", false).await
    }
}

#[async_trait]
impl ContentProvider for SportsDbProvider {
    fn provider_name(&self) -> &str {
        "sportsdb"
    }

    fn categories(&self) -> &[ContentType] {
        &CATEGORIES
    }

    async fn discover(&self, request: &DiscoverRequest) -> Result<PageResult, SourceError> {
        validate_request(request)?;

        let (past, next) = futures::join!(self.past_matches(), self.next_matches());
        let mut items = past;
        items.extend(next);

        let total_count = items.len() as u64;
        debug!(
            "League {}: {} events, serving page {}",
            self.league_id, total_count, request.page
        );
        if request.page > 1 {
            items.clear();
        }

        Ok(PageResult {
            items,
            total_count,
            total_pages: 1,
        })
    }

    async fn search(&self, _query: &str) -> Result<Vec<ContentItem>, SourceError> {
        Ok(Vec::new())
    }

    async fn details(&self, id: &str, category: ContentType) -> Result<Option<ContentItem>, SourceError> {
        if !self.serves(category) {
            warn!("TheSportsDB has no {} details; ignoring lookup for {}", category, id);
            return Ok(None);
        }
        if id.trim().is_empty() {
            return Err(SourceError::new("event id must not be empty"));
        }

        match self.fetch_events("lookupevent.php", id).await {
            Ok(events) => Ok(events.into_iter().next().map(|e| e.into_content_item(true))),
            Err(e) => {
                error!("Error fetching sports details for event {}: {}", id, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamverse_models::FeedKey;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> SportsDbProvider {
        SportsDbProvider::new(&SportsDbConfig {
            base_url: server.uri(),
            ..SportsDbConfig::default()
        })
    }

    fn events(ids: &[&str]) -> serde_json::Value {
        let events: Vec<_> = ids
            .iter()
            .map(|id| serde_json::json!({"idEvent": id, "strEvent": format!("Event {}", id), "strLeague": "EPL"}))
            .collect();
        serde_json::json!({ "events": events })
    }

    async fn mount_league(server: &MockServer, past: &[&str], next: &[&str]) {
        Mock::given(method("GET"))
            .and(path("/eventspastleague.php"))
            .and(query_param("id", "4328"))
            .respond_with(ResponseTemplate::new(200).set_body_json(events(past)))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/eventsnextleague.php"))
            .and(query_param("id", "4328"))
            .respond_with(ResponseTemplate::new(200).set_body_json(events(next)))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_page_one_concatenates_past_then_next() {
        let server = MockServer::start().await;
        mount_league(&server, &["1", "2"], &["3"]).await;

        let result = provider(&server)
            .discover(&FeedKey::new(ContentType::Sports).page(1))
            .await
            .unwrap();
        let ids: Vec<_> = result.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(result.items[0].is_past, Some(true));
        assert_eq!(result.items[2].is_past, Some(false));
        assert_eq!(result.total_count, 3);
        assert_eq!(result.total_pages, 1);
    }

    #[tokio::test]
    async fn test_later_pages_are_empty() {
        let server = MockServer::start().await;
        mount_league(&server, &["1"], &["2"]).await;

        let result = provider(&server)
            .discover(&FeedKey::new(ContentType::Sports).page(2))
            .await
            .unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.total_pages, 1);
    }

    #[tokio::test]
    async fn test_one_failing_half_still_serves_the_other() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/eventspastleague.php"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/eventsnextleague.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(events(&["9"])))
            .mount(&server)
            .await;

        let result = provider(&server)
            .discover(&FeedKey::new(ContentType::Sports).page(1))
            .await
            .unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].id, "9");
    }

    #[tokio::test]
    async fn test_details_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lookupevent.php"))
            .and(query_param("id", "42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(events(&["42"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/lookupevent.php"))
            .and(query_param("id", "404"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"events": null})))
            .mount(&server)
            .await;

        let provider = provider(&server);
        let item = provider.details("42", ContentType::Sports).await.unwrap().unwrap();
        assert_eq!(item.title, "Event 42");
        assert!(provider.details("404", ContentType::Sports).await.unwrap().is_none());
        assert!(provider.details("42", ContentType::Movie).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_is_unsupported() {
        let server = MockServer::start().await;
        assert!(provider(&server).search("arsenal").await.unwrap().is_empty());
    }
}
