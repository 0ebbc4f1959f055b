use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use streamverse_models::{Language, SortOrder};

const PLACEHOLDER_KEY: &str = "YOUR_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub sportsdb: SportsDbConfig,
    #[serde(default)]
    pub itunes: ItunesConfig,
    #[serde(default)]
    pub firebase: Option<FirebaseConfig>,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_placeholder_key")]
    pub api_key: String,
    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,
    #[serde(default = "default_tmdb_image_base_url")]
    pub image_base_url: String,
    #[serde(default = "default_tmdb_backdrop_base_url")]
    pub backdrop_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SportsDbConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_sportsdb_base_url")]
    pub base_url: String,
    /// League scoped for discovery (4328 = English Premier League)
    #[serde(default = "default_league_id")]
    pub league_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItunesConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_itunes_base_url")]
    pub base_url: String,
    #[serde(default = "default_music_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    #[serde(default = "default_auth_base_url")]
    pub auth_base_url: String,
    #[serde(default = "default_token_base_url")]
    pub token_base_url: String,
    #[serde(default = "default_firestore_base_url")]
    pub firestore_base_url: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Snapshot-persisted store in the data directory
    #[default]
    Local,
    /// Process-lifetime only
    Memory,
    /// Cloud Firestore over REST
    Firestore,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default)]
    pub default_language: Language,
    #[serde(default)]
    pub default_sort: SortOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_placeholder_key() -> String {
    PLACEHOLDER_KEY.to_string()
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_tmdb_backdrop_base_url() -> String {
    "https://image.tmdb.org/t/p/original".to_string()
}

fn default_sportsdb_base_url() -> String {
    "https://www.thesportsdb.com/api/v1/json/3".to_string()
}

fn default_league_id() -> String {
    "4328".to_string()
}

fn default_itunes_base_url() -> String {
    "https://itunes.apple.com".to_string()
}

fn default_music_page_size() -> u32 {
    20
}

fn default_auth_base_url() -> String {
    "https://identitytoolkit.googleapis.com/v1".to_string()
}

fn default_token_base_url() -> String {
    "https://securetoken.googleapis.com/v1".to_string()
}

fn default_firestore_base_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

fn default_debounce_ms() -> u64 {
    300 // collapses rapid filter clicks into one request
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: default_placeholder_key(),
            base_url: default_tmdb_base_url(),
            image_base_url: default_tmdb_image_base_url(),
            backdrop_base_url: default_tmdb_backdrop_base_url(),
        }
    }
}

impl Default for SportsDbConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_sportsdb_base_url(),
            league_id: default_league_id(),
        }
    }
}

impl Default for ItunesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_itunes_base_url(),
            page_size: default_music_page_size(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            default_language: Language::All,
            default_sort: SortOrder::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmdb: TmdbConfig::default(),
            sportsdb: SportsDbConfig::default(),
            itunes: ItunesConfig::default(),
            firebase: None,
            store: StoreConfig::default(),
            feed: FeedConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl FirebaseConfig {
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            project_id: project_id.into(),
            auth_base_url: default_auth_base_url(),
            token_base_url: default_token_base_url(),
            firestore_base_url: default_firestore_base_url(),
        }
    }
}

fn is_placeholder(value: &str) -> bool {
    value.trim().is_empty() || value == PLACEHOLDER_KEY
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file, falling back to defaults when it does not exist yet.
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tmdb.enabled && is_placeholder(&self.tmdb.api_key) {
            return Err(anyhow::anyhow!("TMDB is enabled but api_key is not configured"));
        }

        if self.sportsdb.enabled && self.sportsdb.league_id.trim().is_empty() {
            return Err(anyhow::anyhow!("TheSportsDB is enabled but league_id is empty"));
        }

        if self.itunes.enabled && self.itunes.page_size == 0 {
            return Err(anyhow::anyhow!("itunes.page_size must be greater than zero"));
        }

        if let Some(firebase) = &self.firebase {
            if is_placeholder(&firebase.api_key) {
                return Err(anyhow::anyhow!("Firebase is configured but api_key is empty"));
            }
            if firebase.project_id.trim().is_empty() {
                return Err(anyhow::anyhow!("Firebase is configured but project_id is empty"));
            }
        }

        if self.store.backend == StoreBackend::Firestore && self.firebase.is_none() {
            return Err(anyhow::anyhow!(
                "store.backend is 'firestore' but no [firebase] section is configured"
            ));
        }

        Ok(())
    }

    /// Get list of configured and enabled providers
    pub fn get_configured_providers(&self) -> Vec<String> {
        let mut providers = Vec::new();

        if self.tmdb.enabled && !is_placeholder(&self.tmdb.api_key) {
            providers.push("tmdb".to_string());
        }
        if self.sportsdb.enabled {
            providers.push("sportsdb".to_string());
        }
        if self.itunes.enabled {
            providers.push("itunes".to_string());
        }

        providers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.tmdb.api_key = "tmdb_key".to_string();
        config.sportsdb.league_id = "4387".to_string();
        config.firebase = Some(FirebaseConfig::new("fb_key", "streamverse-dev"));
        config.store.backend = StoreBackend::Firestore;

        let path = file.path().to_path_buf();
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.tmdb.api_key, "tmdb_key");
        assert_eq!(loaded.sportsdb.league_id, "4387");
        assert_eq!(loaded.store.backend, StoreBackend::Firestore);
        assert_eq!(loaded.firebase.unwrap().project_id, "streamverse-dev");
        assert_eq!(loaded.feed.debounce_ms, 300);
    }

    #[test]
    fn test_minimal_file_uses_defaults() {
        let config: Config = toml::from_str("[tmdb]\napi_key = \"abc\"\n").unwrap();
        assert_eq!(config.tmdb.base_url, "https://api.themoviedb.org/3");
        assert_eq!(config.sportsdb.league_id, "4328");
        assert_eq!(config.itunes.page_size, 20);
        assert_eq!(config.store.backend, StoreBackend::Local);
        assert_eq!(config.feed.default_sort.to_string(), "popularity-desc");
        assert_eq!(config.feed.default_language, Language::All);
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.tmdb.api_key = "real_key".to_string();
        assert!(config.validate().is_ok());

        config.store.backend = StoreBackend::Firestore;
        assert!(config.validate().is_err());

        config.firebase = Some(FirebaseConfig::new("key", ""));
        assert!(config.validate().is_err());

        config.firebase = Some(FirebaseConfig::new("key", "project"));
        assert!(config.validate().is_ok());

        config.itunes.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configured_providers() {
        let mut config = Config::default();
        assert_eq!(config.get_configured_providers(), vec!["sportsdb", "itunes"]);

        config.tmdb.api_key = "real_key".to_string();
        config.itunes.enabled = false;
        assert_eq!(config.get_configured_providers(), vec!["tmdb", "sportsdb"]);
    }
}
