//! Per-user likes, "my list" entries and watch history, plus the shared
//! content counters they drive.
//!
//! Fact writes and counter updates are separate operations. A counter
//! failure after the fact write is reported but not compensated.

mod toggle;

pub use toggle::{EngagementToggle, ToggleState};

use crate::store::{fields, Direction, Document, DocumentStore, FieldValue, Query, SetMode, StoreError};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use streamverse_models::{ContentType, EngagementFact, FactKind, ItemKey, WatchHistoryEntry, WatchStats};
use tracing::{debug, error, info};

pub const CONTENT_COLLECTION: &str = "content";
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

const LIKE_POPULARITY: i64 = 3;
const VIEW_POPULARITY: i64 = 2;

pub struct EngagementStore {
    store: Arc<dyn DocumentStore>,
    in_flight: Mutex<HashSet<String>>,
}

/// Holds a toggle key for the duration of one toggle.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    key: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut set = self.set.lock().unwrap_or_else(|e| e.into_inner());
        set.remove(&self.key);
    }
}

fn require_user<'a>(user_id: Option<&'a str>, action: &str) -> Result<&'a str, StoreError> {
    user_id
        .filter(|u| !u.is_empty())
        .ok_or_else(|| StoreError::Unauthenticated(format!("must be signed in to {}", action)))
}

impl EngagementStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    fn begin_toggle(&self, kind: FactKind, user_id: &str, content: &ItemKey) -> Result<InFlight<'_>, StoreError> {
        let key = format!("{}/{}", kind.collection(), kind.document_id(user_id, content));
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(key.clone()) {
            return Err(StoreError::ToggleInFlight(key));
        }
        Ok(InFlight {
            set: &self.in_flight,
            key,
        })
    }

    /// Flip the fact's existence. Returns whether it exists afterwards.
    async fn toggle_fact(&self, kind: FactKind, user_id: &str, content: &ItemKey) -> Result<bool, StoreError> {
        let _guard = self.begin_toggle(kind, user_id, content)?;
        let collection = kind.collection();
        let doc_id = kind.document_id(user_id, content);

        if self.store.get(collection, &doc_id).await?.is_some() {
            self.store.delete(collection, &doc_id).await?;
            debug!("Removed {} {} for {}", kind, content, user_id);
            return Ok(false);
        }

        let record = fields([
            ("userId", FieldValue::from(user_id)),
            ("contentId", FieldValue::from(content.id.as_str())),
            ("contentType", FieldValue::from(content.content_type.as_str())),
            (kind.timestamp_field(), FieldValue::from(Utc::now())),
        ]);
        self.store.set(collection, &doc_id, record, SetMode::Overwrite).await?;
        debug!("Added {} {} for {}", kind, content, user_id);
        Ok(true)
    }

    async fn fact_exists(&self, kind: FactKind, user_id: Option<&str>, content: &ItemKey) -> Result<bool, StoreError> {
        let Some(user_id) = user_id.filter(|u| !u.is_empty()) else {
            return Ok(false);
        };
        let doc_id = kind.document_id(user_id, content);
        Ok(self.store.get(kind.collection(), &doc_id).await?.is_some())
    }

    /// Like or unlike `content`, adjusting `likeCount` by ±1 and `popularity` by ±3.
    pub async fn toggle_like(&self, user_id: Option<&str>, content: &ItemKey) -> Result<bool, StoreError> {
        let user_id = require_user(user_id, "like content")?;
        let liked = self.toggle_fact(FactKind::Like, user_id, content).await?;

        let sign = if liked { 1 } else { -1 };
        self.store
            .increment(
                CONTENT_COLLECTION,
                &content.storage_id(),
                &[("likeCount", sign), ("popularity", sign * LIKE_POPULARITY)],
            )
            .await
            .map_err(|e| {
                error!("Like recorded for {} but counters were not updated: {}", content, e);
                e
            })?;
        Ok(liked)
    }

    pub async fn check_liked(&self, user_id: Option<&str>, content: &ItemKey) -> Result<bool, StoreError> {
        self.fact_exists(FactKind::Like, user_id, content).await
    }

    pub async fn toggle_my_list(&self, user_id: Option<&str>, content: &ItemKey) -> Result<bool, StoreError> {
        let user_id = require_user(user_id, "modify your list")?;
        self.toggle_fact(FactKind::MyList, user_id, content).await
    }

    pub async fn check_in_my_list(&self, user_id: Option<&str>, content: &ItemKey) -> Result<bool, StoreError> {
        self.fact_exists(FactKind::MyList, user_id, content).await
    }

    /// Count a play. Anonymous; failures are logged and swallowed.
    pub async fn track_view(&self, content: &ItemKey) {
        let deltas = [("viewCount", 1), ("popularity", VIEW_POPULARITY)];
        if let Err(e) = self.store.increment(CONTENT_COLLECTION, &content.storage_id(), &deltas).await {
            error!("Failed to track view for {}: {}", content, e);
        }
    }

    /// Merge-write the user's progress on `content`. Last write wins.
    pub async fn upsert_watch_history(
        &self,
        user_id: Option<&str>,
        content: &ItemKey,
        progress: f64,
        duration_minutes: u32,
    ) -> Result<(), StoreError> {
        let user_id = require_user(user_id, "save watch history")?;
        let kind = FactKind::WatchHistory;
        let progress = if progress.is_finite() { progress.clamp(0.0, 100.0).round() as i64 } else { 0 };
        let now = Utc::now();

        let record = fields([
            ("userId", FieldValue::from(user_id)),
            ("contentId", FieldValue::from(content.id.as_str())),
            ("contentType", FieldValue::from(content.content_type.as_str())),
            ("progress", FieldValue::Integer(progress)),
            ("duration", FieldValue::Integer(i64::from(duration_minutes))),
            ("lastWatched", FieldValue::from(now)),
            ("updatedAt", FieldValue::from(now)),
        ]);
        self.store
            .set(kind.collection(), &kind.document_id(user_id, content), record, SetMode::Merge)
            .await?;
        info!("Saved progress {}% on {} for {}", progress, content, user_id);
        Ok(())
    }

    /// Most recent entries first, at most `limit`.
    pub async fn fetch_watch_history(&self, user_id: Option<&str>, limit: usize) -> Result<Vec<WatchHistoryEntry>, StoreError> {
        let Some(user_id) = user_id.filter(|u| !u.is_empty()) else {
            return Ok(Vec::new());
        };
        let kind = FactKind::WatchHistory;
        let query = Query::new()
            .where_eq("userId", user_id)
            .order_by(kind.timestamp_field(), Direction::Descending)
            .limit(limit);
        let docs = self.store.query(kind.collection(), &query).await?;
        Ok(docs.iter().map(history_entry).collect())
    }

    /// Totals over the user's whole history.
    pub async fn fetch_watch_stats(&self, user_id: Option<&str>) -> Result<WatchStats, StoreError> {
        let Some(user_id) = user_id.filter(|u| !u.is_empty()) else {
            return Ok(WatchStats::default());
        };
        let query = Query::new().where_eq("userId", user_id);
        let docs = self.store.query(FactKind::WatchHistory.collection(), &query).await?;
        let entries: Vec<WatchHistoryEntry> = docs.iter().map(history_entry).collect();
        Ok(WatchStats::from_entries(&entries))
    }

    /// Likes or my-list facts, newest first.
    pub async fn fetch_fact_list(&self, user_id: Option<&str>, kind: FactKind) -> Result<Vec<EngagementFact>, StoreError> {
        let Some(user_id) = user_id.filter(|u| !u.is_empty()) else {
            return Ok(Vec::new());
        };
        let query = Query::new()
            .where_eq("userId", user_id)
            .order_by(kind.timestamp_field(), Direction::Descending);
        let docs = self.store.query(kind.collection(), &query).await?;
        Ok(docs.iter().map(|doc| engagement_fact(kind, doc)).collect())
    }
}

/// Facts written before the type was recorded belong to the movie catalog.
fn content_type_of(doc: &Document) -> ContentType {
    doc.get_str("contentType")
        .and_then(|t| t.parse().ok())
        .unwrap_or(ContentType::Movie)
}

fn history_entry(doc: &Document) -> WatchHistoryEntry {
    WatchHistoryEntry {
        user_id: doc.get_str("userId").unwrap_or_default().to_string(),
        content_id: doc.get_str("contentId").unwrap_or_default().to_string(),
        content_type: content_type_of(doc),
        progress: doc.get_i64("progress").unwrap_or(0).clamp(0, 100) as u8,
        duration_minutes: doc.get_i64("duration").unwrap_or(0).max(0) as u32,
        last_watched: doc.get_timestamp("lastWatched"),
        content: None,
    }
}

fn engagement_fact(kind: FactKind, doc: &Document) -> EngagementFact {
    EngagementFact {
        kind,
        user_id: doc.get_str("userId").unwrap_or_default().to_string(),
        content_id: doc.get_str("contentId").unwrap_or_default().to_string(),
        content_type: content_type_of(doc),
        created_at: doc.get_timestamp(kind.timestamp_field()),
    }
}
