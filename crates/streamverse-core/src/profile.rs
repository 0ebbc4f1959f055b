use crate::catalog::Catalog;
use crate::engagement::{EngagementStore, DEFAULT_HISTORY_LIMIT};
use crate::store::StoreError;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use streamverse_models::{ContentItem, ContentType, FactKind, WatchHistoryEntry, WatchStats};
use streamverse_sources::ContentProvider;
use tracing::{debug, warn};

/// Everything the profile screen shows for one user.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ProfileOverview {
    pub stats: WatchStats,
    pub history: Vec<WatchHistoryEntry>,
    pub my_list: Vec<ContentItem>,
    pub favourites: Vec<ContentItem>,
}

/// Joins a user's engagement facts with catalog details.
pub struct ProfileService {
    catalog: Arc<Catalog>,
    engagement: Arc<EngagementStore>,
}

impl ProfileService {
    pub fn new(catalog: Arc<Catalog>, engagement: Arc<EngagementStore>) -> Self {
        Self { catalog, engagement }
    }

    async fn resolve(&self, id: &str, content_type: ContentType) -> Option<ContentItem> {
        match self.catalog.details(id, content_type).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Failed to resolve {}:{}: {}", content_type, id, e);
                None
            }
        }
    }

    /// Most recent history entries with details attached. Entries the
    /// catalog no longer knows are dropped.
    pub async fn watch_history(&self, user_id: Option<&str>, limit: usize) -> Result<Vec<WatchHistoryEntry>, StoreError> {
        let entries = self.engagement.fetch_watch_history(user_id, limit).await?;

        let resolved = join_all(entries.into_iter().map(|entry| async move {
            let item = self.resolve(&entry.content_id, entry.content_type).await?;
            let progress = entry.progress;
            Some(WatchHistoryEntry {
                content: Some(item.with_progress(progress)),
                ..entry
            })
        }))
        .await;

        let history: Vec<_> = resolved.into_iter().flatten().collect();
        debug!("Resolved {} history entries", history.len());
        Ok(history)
    }

    /// Liked titles or "my list", newest first.
    pub async fn content_list(&self, user_id: Option<&str>, kind: FactKind) -> Result<Vec<ContentItem>, StoreError> {
        let facts = self.engagement.fetch_fact_list(user_id, kind).await?;
        let resolved = join_all(
            facts
                .iter()
                .map(|fact| self.resolve(&fact.content_id, fact.content_type)),
        )
        .await;
        Ok(resolved.into_iter().flatten().collect())
    }

    pub async fn profile(&self, user_id: Option<&str>) -> Result<ProfileOverview, StoreError> {
        let (stats, history, my_list, favourites) = futures::try_join!(
            self.engagement.fetch_watch_stats(user_id),
            self.watch_history(user_id, DEFAULT_HISTORY_LIMIT),
            self.content_list(user_id, FactKind::MyList),
            self.content_list(user_id, FactKind::Like),
        )?;
        Ok(ProfileOverview {
            stats,
            history,
            my_list,
            favourites,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{items, StubProvider};
    use crate::store::MemoryDocumentStore;
    use streamverse_models::ItemKey;

    fn key(content_type: ContentType, id: &str) -> ItemKey {
        ItemKey {
            content_type,
            id: id.to_string(),
        }
    }

    fn service() -> (ProfileService, Arc<EngagementStore>) {
        let mut movies = StubProvider::new("movies", vec![ContentType::Movie, ContentType::Series]);
        movies.details = [items(ContentType::Movie, &["1", "2"]), items(ContentType::Series, &["s1"])].concat();
        let catalog = Arc::new(Catalog::new(vec![Arc::new(movies)]));
        let engagement = Arc::new(EngagementStore::new(Arc::new(MemoryDocumentStore::new())));
        (ProfileService::new(catalog, engagement.clone()), engagement)
    }

    #[tokio::test]
    async fn test_history_overlays_progress_and_skips_unknown() {
        let (profile, engagement) = service();
        engagement
            .upsert_watch_history(Some("u1"), &key(ContentType::Movie, "1"), 42.4, 120)
            .await
            .unwrap();
        engagement
            .upsert_watch_history(Some("u1"), &key(ContentType::Movie, "gone"), 10.0, 90)
            .await
            .unwrap();

        let history = profile.watch_history(Some("u1"), 10).await.unwrap();
        assert_eq!(history.len(), 1);
        let item = history[0].content.as_ref().unwrap();
        assert_eq!(item.id, "1");
        assert_eq!(item.progress, Some(42));
    }

    #[tokio::test]
    async fn test_content_list_resolves_by_type() {
        let (profile, engagement) = service();
        engagement.toggle_my_list(Some("u1"), &key(ContentType::Series, "s1")).await.unwrap();
        engagement.toggle_like(Some("u1"), &key(ContentType::Movie, "2")).await.unwrap();

        let my_list = profile.content_list(Some("u1"), FactKind::MyList).await.unwrap();
        assert_eq!(my_list.len(), 1);
        assert_eq!(my_list[0].content_type, ContentType::Series);

        let liked = profile.content_list(Some("u1"), FactKind::Like).await.unwrap();
        assert_eq!(liked[0].id, "2");
    }

    #[tokio::test]
    async fn test_profile_overview() {
        let (profile, engagement) = service();
        engagement
            .upsert_watch_history(Some("u1"), &key(ContentType::Movie, "1"), 100.0, 120)
            .await
            .unwrap();
        engagement.toggle_like(Some("u1"), &key(ContentType::Movie, "1")).await.unwrap();

        let overview = profile.profile(Some("u1")).await.unwrap();
        assert_eq!(overview.stats.total_watch_time_hours, 2);
        assert_eq!(overview.stats.completed_titles, 1);
        assert_eq!(overview.history.len(), 1);
        assert_eq!(overview.favourites.len(), 1);
        assert!(overview.my_list.is_empty());
    }

    #[tokio::test]
    async fn test_signed_out_profile_is_empty() {
        let (profile, _) = service();
        assert_eq!(profile.profile(None).await.unwrap(), ProfileOverview::default());
    }
}
