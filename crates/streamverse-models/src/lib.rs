pub mod content;
pub mod engagement;
pub mod query;
pub mod user;

pub use content::{format_rating, year_of, ContentItem, ContentType, ItemKey, ParseContentTypeError};
pub use engagement::{EngagementFact, FactKind, WatchHistoryEntry, WatchStats, COMPLETED_PROGRESS};
pub use query::{DiscoverRequest, FeedKey, FilterError, Filters, Language, PageResult, SortDirection, SortField, SortOrder, YearRange};
pub use user::{AuthProvider, UserProfile};
