use super::EngagementStore;
use crate::store::StoreError;
use std::sync::Arc;
use streamverse_models::{FactKind, ItemKey};
use tokio::sync::watch;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToggleState {
    pub active: bool,
    pub pending: bool,
}

/// Local like / my-list flag for one title, kept in step with the store.
///
/// Toggling flips the flag immediately, then settles on the store's answer
/// or rolls back when the write fails.
pub struct EngagementToggle {
    engagement: Arc<EngagementStore>,
    kind: FactKind,
    content: ItemKey,
    user_id: Option<String>,
    state: watch::Sender<ToggleState>,
}

impl EngagementToggle {
    pub fn like(engagement: Arc<EngagementStore>, content: ItemKey, user_id: Option<String>) -> Self {
        Self::new(engagement, FactKind::Like, content, user_id)
    }

    pub fn my_list(engagement: Arc<EngagementStore>, content: ItemKey, user_id: Option<String>) -> Self {
        Self::new(engagement, FactKind::MyList, content, user_id)
    }

    fn new(engagement: Arc<EngagementStore>, kind: FactKind, content: ItemKey, user_id: Option<String>) -> Self {
        let (state, _) = watch::channel(ToggleState::default());
        Self {
            engagement,
            kind,
            content,
            user_id,
            state,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.borrow().active
    }

    pub fn state(&self) -> ToggleState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ToggleState> {
        self.state.subscribe()
    }

    /// Read the initial flag from the store. Without a user it stays off.
    pub async fn load(&self) -> bool {
        let user = self.user_id.as_deref();
        let result = match self.kind {
            FactKind::Like => self.engagement.check_liked(user, &self.content).await,
            _ => self.engagement.check_in_my_list(user, &self.content).await,
        };
        let active = result.unwrap_or_else(|e| {
            error!("Failed to load {} state for {}: {}", self.kind, self.content, e);
            false
        });
        self.state.send_modify(|s| s.active = active);
        active
    }

    async fn write(&self, user: &str) -> Result<bool, StoreError> {
        match self.kind {
            FactKind::Like => self.engagement.toggle_like(Some(user), &self.content).await,
            _ => self.engagement.toggle_my_list(Some(user), &self.content).await,
        }
    }

    /// Flip the flag. No-op without a signed-in user or while a previous
    /// toggle is still pending. Returns the settled flag.
    pub async fn toggle(&self) -> bool {
        let Some(user) = self.user_id.as_deref() else {
            return self.is_active();
        };
        let mut previous = None;
        self.state.send_if_modified(|s| {
            if s.pending {
                return false;
            }
            previous = Some(s.active);
            s.active = !s.active;
            s.pending = true;
            true
        });
        let Some(previous) = previous else {
            return self.is_active();
        };

        match self.write(user).await {
            Ok(active) => self.state.send_modify(|s| {
                s.active = active;
                s.pending = false;
            }),
            Err(e) => {
                warn!("{} toggle failed for {}, rolling back: {}", self.kind, self.content, e);
                self.state.send_modify(|s| {
                    s.active = previous;
                    s.pending = false;
                });
            }
        }
        self.is_active()
    }
}
