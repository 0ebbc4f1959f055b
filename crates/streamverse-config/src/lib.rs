pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{Config, FeedConfig, FirebaseConfig, ItunesConfig, LoggingConfig, SportsDbConfig, StoreBackend, StoreConfig, TmdbConfig};
pub use credentials::{CredentialStore, StoredSession};
pub use paths::{PathManager, container_base_path};
