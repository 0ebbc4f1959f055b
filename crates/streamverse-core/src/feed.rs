//! Incrementally loaded, filterable catalog feed.
//!
//! A feed is identified by its [`FeedKey`]. Changing the key starts a new
//! session: state resets at once, the first page is fetched after a
//! debounce, and every response carries the session epoch it was issued
//! under. Responses from an older epoch are dropped, so a slow answer for
//! an abandoned key can never overwrite the current one.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use streamverse_config::FeedConfig;
use streamverse_models::{ContentItem, FeedKey, ItemKey, PageResult};
use streamverse_sources::{ContentProvider, SourceError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Observable feed state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedSnapshot {
    pub key: Option<FeedKey>,
    pub items: Vec<ContentItem>,
    pub total_count: u64,
    /// Last page merged into `items`
    pub page: u32,
    pub loading: bool,
    pub loading_more: bool,
    pub has_more: bool,
    pub error: Option<String>,
    /// Bumped on every reset
    pub epoch: u64,
}

impl FeedSnapshot {
    fn reset(&mut self, key: FeedKey) {
        *self = FeedSnapshot {
            key: Some(key),
            page: 1,
            loading: true,
            has_more: true,
            epoch: self.epoch + 1,
            ..FeedSnapshot::default()
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadMoreOutcome {
    /// Page merged; `added` counts items that were not already present
    Appended { page: u32, added: usize },
    /// Nothing to do: exhausted, busy, or no session
    Skipped,
    /// The key changed while the page was in flight; the answer was dropped
    Stale,
    Failed(String),
}

fn dedup_into(items: &mut Vec<ContentItem>, seen: &mut HashSet<ItemKey>, incoming: Vec<ContentItem>) -> usize {
    let before = items.len();
    items.extend(incoming.into_iter().filter(|item| seen.insert(item.key())));
    items.len() - before
}

fn apply_first_page(state: &watch::Sender<FeedSnapshot>, epoch: u64, result: Result<PageResult, SourceError>) {
    let applied = state.send_if_modified(|s| {
        if s.epoch != epoch {
            return false;
        }
        match &result {
            Ok(page) => {
                let mut seen = HashSet::new();
                let mut items = Vec::with_capacity(page.items.len());
                dedup_into(&mut items, &mut seen, page.items.clone());
                s.items = items;
                s.total_count = page.total_count;
                s.has_more = 1 < page.total_pages;
                s.error = None;
            }
            Err(e) => {
                s.error = Some(e.to_string());
                s.has_more = false;
            }
        }
        s.loading = false;
        true
    });

    match (applied, result) {
        (false, _) => debug!("Dropped first page for stale epoch {}", epoch),
        (true, Err(e)) => error!("Feed failed to load: {}", e),
        (true, Ok(page)) => debug!(
            "Feed epoch {} loaded {} items ({} pages)",
            epoch,
            page.items.len(),
            page.total_pages
        ),
    }
}

pub struct PaginatedFeed {
    provider: Arc<dyn ContentProvider>,
    debounce: Duration,
    state: Arc<watch::Sender<FeedSnapshot>>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl PaginatedFeed {
    pub fn new(provider: Arc<dyn ContentProvider>, debounce: Duration) -> Self {
        let (state, _) = watch::channel(FeedSnapshot::default());
        Self {
            provider,
            debounce,
            state: Arc::new(state),
            pending: Mutex::new(None),
        }
    }

    pub fn from_config(provider: Arc<dyn ContentProvider>, config: &FeedConfig) -> Self {
        Self::new(provider, Duration::from_millis(config.debounce_ms))
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.state.subscribe()
    }

    /// Switch to `key`. Setting the current key again does nothing; returns
    /// whether a new session started.
    pub fn set_key(&self, key: FeedKey) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if self.state.borrow().key.as_ref() == Some(&key) {
            return false;
        }
        self.restart(&mut pending, key);
        true
    }

    /// Reset and reload the current key. Returns false when no key is set.
    pub fn refresh(&self) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        let current = self.state.borrow().key.clone();
        let Some(key) = current else {
            return false;
        };
        self.restart(&mut pending, key);
        true
    }

    fn restart(&self, pending: &mut Option<JoinHandle<()>>, key: FeedKey) {
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let mut epoch = 0;
        self.state.send_modify(|s| {
            s.reset(key.clone());
            epoch = s.epoch;
        });
        debug!("Feed reset to {:?} (epoch {})", key, epoch);

        let provider = self.provider.clone();
        let state = self.state.clone();
        let debounce = self.debounce;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let result = provider.discover(&key.page(1)).await;
            apply_first_page(&state, epoch, result);
        }));
    }

    /// Wait until the first page of the current session has been applied.
    pub async fn settled(&self) -> FeedSnapshot {
        let mut rx = self.state.subscribe();
        let result = rx.wait_for(|s| !s.loading).await.map(|s| s.clone());
        result.unwrap_or_else(|_| self.snapshot())
    }

    /// Fetch and append the next page.
    pub async fn load_more(&self) -> LoadMoreOutcome {
        let mut claim = None;
        self.state.send_if_modified(|s| {
            if !s.has_more || s.loading || s.loading_more {
                return false;
            }
            let Some(key) = s.key.clone() else {
                return false;
            };
            s.loading_more = true;
            claim = Some((key, s.page + 1, s.epoch));
            true
        });
        let Some((key, next, epoch)) = claim else {
            return LoadMoreOutcome::Skipped;
        };

        let result = self.provider.discover(&key.page(next)).await;

        let mut outcome = LoadMoreOutcome::Stale;
        self.state.send_if_modified(|s| {
            if s.epoch != epoch {
                return false;
            }
            s.loading_more = false;
            outcome = match &result {
                Ok(page) => {
                    let mut seen: HashSet<ItemKey> = s.items.iter().map(ContentItem::key).collect();
                    let added = dedup_into(&mut s.items, &mut seen, page.items.clone());
                    s.page = next;
                    s.has_more = next < page.total_pages;
                    s.total_count = page.total_count;
                    LoadMoreOutcome::Appended { page: next, added }
                }
                Err(e) => LoadMoreOutcome::Failed(e.to_string()),
            };
            true
        });

        match &outcome {
            LoadMoreOutcome::Stale => debug!("Dropped page {} for stale epoch {}", next, epoch),
            LoadMoreOutcome::Failed(e) => warn!("Loading page {} failed: {}", next, e),
            _ => {}
        }
        outcome
    }
}

impl Drop for PaginatedFeed {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }
}
