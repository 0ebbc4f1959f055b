use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use streamverse_models::{ContentItem, ContentType, DiscoverRequest, PageResult};
use streamverse_sources::{ContentProvider, SourceError};
use tracing::{debug, warn};

/// Routes catalog calls to the provider that serves each category.
#[derive(Clone)]
pub struct Catalog {
    providers: Vec<Arc<dyn ContentProvider>>,
}

impl Catalog {
    pub fn new(providers: Vec<Arc<dyn ContentProvider>>) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &[Arc<dyn ContentProvider>] {
        &self.providers
    }

    /// First registered provider serving `category`.
    pub fn provider_for(&self, category: ContentType) -> Option<&Arc<dyn ContentProvider>> {
        self.providers.iter().find(|p| p.serves(category))
    }
}

#[async_trait]
impl ContentProvider for Catalog {
    fn provider_name(&self) -> &str {
        "catalog"
    }

    fn categories(&self) -> &[ContentType] {
        &ContentType::ALL
    }

    fn serves(&self, category: ContentType) -> bool {
        self.provider_for(category).is_some()
    }

    async fn discover(&self, request: &DiscoverRequest) -> Result<PageResult, SourceError> {
        match self.provider_for(request.category()) {
            Some(provider) => {
                debug!("Routing {} page {} to {}", request.category(), request.page, provider.provider_name());
                provider.discover(request).await
            }
            None => {
                warn!("No provider serves {}", request.category());
                Ok(PageResult::empty())
            }
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<ContentItem>, SourceError> {
        let results = join_all(self.providers.iter().map(|p| p.search(query))).await;

        let mut seen = HashSet::new();
        let mut items = Vec::new();
        for (provider, result) in self.providers.iter().zip(results) {
            match result {
                Ok(found) => items.extend(found.into_iter().filter(|item| seen.insert(item.key()))),
                Err(e) => warn!("Search on {} failed: {}", provider.provider_name(), e),
            }
        }
        Ok(items)
    }

    async fn details(&self, id: &str, category: ContentType) -> Result<Option<ContentItem>, SourceError> {
        match self.provider_for(category) {
            Some(provider) => provider.details(id, category).await,
            None => {
                warn!("No provider resolves {} details", category);
                Ok(None)
            }
        }
    }
}
