use crate::error::SourceError;
use async_trait::async_trait;
use streamverse_models::{ContentItem, ContentType, DiscoverRequest, PageResult};

#[async_trait]
pub trait ContentProvider: Send + Sync {
    // Provider metadata
    fn provider_name(&self) -> &str;

    /// Categories this provider can discover and resolve details for
    fn categories(&self) -> &[ContentType];

    fn serves(&self, category: ContentType) -> bool {
        self.categories().contains(&category)
    }

    /// One page of the category feed.
    ///
    /// Upstream failures degrade to `PageResult::empty()`; `Err` is reserved
    /// for requests that can never succeed (bad filters, page 0).
    async fn discover(&self, request: &DiscoverRequest) -> Result<PageResult, SourceError>;

    /// Free-text search. Providers without a search endpoint return nothing.
    async fn search(&self, query: &str) -> Result<Vec<ContentItem>, SourceError>;

    /// Single entry lookup; `None` when unknown or unreachable.
    async fn details(&self, id: &str, category: ContentType) -> Result<Option<ContentItem>, SourceError>;
}

/// Shared validation every adapter applies before touching the network.
pub fn validate_request(request: &DiscoverRequest) -> Result<(), SourceError> {
    if request.page == 0 {
        return Err(SourceError::new("page numbers start at 1"));
    }
    request.filters().validate()?;
    Ok(())
}
