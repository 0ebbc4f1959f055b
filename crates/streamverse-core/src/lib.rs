pub mod catalog;
pub mod engagement;
pub mod feed;
pub mod identity;
pub mod playback;
pub mod profile;
pub mod store;

pub use catalog::Catalog;
pub use engagement::{EngagementStore, EngagementToggle, ToggleState};
pub use feed::{FeedSnapshot, LoadMoreOutcome, PaginatedFeed};
pub use identity::{ensure_profile, fetch_profile, AuthError, AuthService, Session};
pub use playback::{PlaybackSession, DEMO_AUDIO_URL};
pub use profile::{ProfileOverview, ProfileService};
pub use store::{
    fields, Direction, Document, DocumentStore, FieldValue, Fields, FirestoreStore, LocalDocumentStore,
    MemoryDocumentStore, Query, SetMode, StoreError,
};
