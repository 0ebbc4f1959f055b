use crate::content::{ContentItem, ContentType, ItemKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress at or above which a title counts as completed.
pub const COMPLETED_PROGRESS: u8 = 90;

/// Kind of per-user engagement fact. Each kind lives in its own collection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FactKind {
    Like,
    MyList,
    WatchHistory,
}

impl FactKind {
    pub fn collection(&self) -> &'static str {
        match self {
            FactKind::Like => "likes",
            FactKind::MyList => "myList",
            FactKind::WatchHistory => "watchHistory",
        }
    }

    /// Timestamp field the fact is ordered by, newest first.
    pub fn timestamp_field(&self) -> &'static str {
        match self {
            FactKind::Like => "createdAt",
            FactKind::MyList => "addedAt",
            FactKind::WatchHistory => "lastWatched",
        }
    }

    /// Document id for the fact of `user_id` about `content`.
    pub fn document_id(&self, user_id: &str, content: &ItemKey) -> String {
        format!("{}_{}", user_id, content.storage_id())
    }
}

impl fmt::Display for FactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FactKind::Like => "like",
            FactKind::MyList => "my list",
            FactKind::WatchHistory => "watch history",
        };
        f.write_str(name)
    }
}

/// A like or "my list" entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngagementFact {
    pub kind: FactKind,
    pub user_id: String,
    pub content_id: String,
    pub content_type: ContentType,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchHistoryEntry {
    pub user_id: String,
    pub content_id: String,
    pub content_type: ContentType,
    /// 0-100, advanced by playback; not enforced monotonic
    pub progress: u8,
    /// Total runtime in minutes
    pub duration_minutes: u32,
    pub last_watched: Option<DateTime<Utc>>,
    /// Catalog details joined in by the profile service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentItem>,
}

impl WatchHistoryEntry {
    pub fn watched_minutes(&self) -> f64 {
        f64::from(self.duration_minutes) * f64::from(self.progress) / 100.0
    }

    pub fn is_completed(&self) -> bool {
        self.progress >= COMPLETED_PROGRESS
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct WatchStats {
    pub total_watch_time_hours: u64,
    pub completed_titles: u64,
}

impl WatchStats {
    /// Aggregate a user's full watch history.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a WatchHistoryEntry>) -> Self {
        let mut total_minutes = 0.0;
        let mut completed = 0;
        for entry in entries {
            total_minutes += entry.watched_minutes();
            if entry.is_completed() {
                completed += 1;
            }
        }
        Self {
            total_watch_time_hours: (total_minutes / 60.0).round() as u64,
            completed_titles: completed,
        }
    }
}
