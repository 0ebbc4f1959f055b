pub mod error;
pub mod factory;
pub mod http;
pub mod itunes;
pub mod sportsdb;
pub mod tmdb;
pub mod traits;

pub use error::{FetchError, SourceError};
pub use factory::{ProviderFactory, ProviderFactoryRegistry};
pub use itunes::{ItunesProvider, MusicSection};
pub use sportsdb::SportsDbProvider;
pub use tmdb::{HomeRow, HomeRows, TmdbProvider};
pub use traits::{validate_request, ContentProvider};
