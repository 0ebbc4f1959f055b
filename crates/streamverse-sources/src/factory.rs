//! Builds content providers from configuration.

use crate::ContentProvider;
use anyhow::Result;
use std::sync::Arc;
use streamverse_config::Config;

/// Factory trait for creating content providers from configuration
pub trait ProviderFactory: Send + Sync {
    /// The name of the provider this factory creates
    fn provider_name(&self) -> &str;

    /// Create a provider instance from configuration.
    /// Returns None if the provider is disabled.
    fn create_provider(&self, config: &Config) -> Result<Option<Arc<dyn ContentProvider>>>;

    /// Validate the provider's configuration section before anything is built
    fn validate_config(&self, config: &Config) -> Result<()>;
}

/// Registry of provider factories.
///
/// Registration order is routing priority: when two providers serve the
/// same category, the one registered first wins.
pub struct ProviderFactoryRegistry {
    factories: Vec<Box<dyn ProviderFactory>>,
}

impl ProviderFactoryRegistry {
    /// Create a new registry with all built-in factories registered
    pub fn new() -> Self {
        let mut registry = Self { factories: Vec::new() };

        registry.register(Box::new(tmdb::TmdbProviderFactory));
        registry.register(Box::new(sportsdb::SportsDbProviderFactory));
        registry.register(Box::new(itunes::ItunesProviderFactory));

        registry
    }

    /// Register a factory, replacing any earlier one with the same name
    pub fn register(&mut self, factory: Box<dyn ProviderFactory>) {
        self.factories.retain(|f| f.provider_name() != factory.provider_name());
        self.factories.push(factory);
    }

    /// Validate every section, then create all enabled providers
    pub fn create_all(&self, config: &Config) -> Result<Vec<Arc<dyn ContentProvider>>> {
        self.validate_all_configs(config)?;

        let mut providers = Vec::new();
        for factory in &self.factories {
            if let Some(provider) = factory.create_provider(config)? {
                providers.push(provider);
            }
        }
        Ok(providers)
    }

    pub fn create_by_name(&self, name: &str, config: &Config) -> Result<Option<Arc<dyn ContentProvider>>> {
        match self.factories.iter().find(|f| f.provider_name() == name) {
            Some(factory) => {
                factory.validate_config(config)?;
                factory.create_provider(config)
            }
            None => Ok(None),
        }
    }

    pub fn validate_all_configs(&self, config: &Config) -> Result<()> {
        for factory in &self.factories {
            factory.validate_config(config)?;
        }
        Ok(())
    }

    pub fn registered_providers(&self) -> Vec<&str> {
        self.factories.iter().map(|f| f.provider_name()).collect()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.iter().any(|f| f.provider_name() == name)
    }
}

impl Default for ProviderFactoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn require_url(provider: &str, url: &str) -> Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(anyhow::anyhow!("{} base_url must be an http(s) URL, got '{}'", provider, url));
    }
    Ok(())
}

mod tmdb {
    use super::*;
    use crate::tmdb::TmdbProvider;

    pub struct TmdbProviderFactory;

    impl ProviderFactory for TmdbProviderFactory {
        fn provider_name(&self) -> &str {
            "tmdb"
        }

        fn create_provider(&self, config: &Config) -> Result<Option<Arc<dyn ContentProvider>>> {
            if !config.tmdb.enabled {
                return Ok(None);
            }
            Ok(Some(Arc::new(TmdbProvider::new(&config.tmdb))))
        }

        fn validate_config(&self, config: &Config) -> Result<()> {
            let tmdb = &config.tmdb;
            if tmdb.enabled {
                if tmdb.api_key.trim().is_empty() || tmdb.api_key == "YOUR_API_KEY" {
                    return Err(anyhow::anyhow!("TMDB is enabled but api_key is not configured"));
                }
                require_url("TMDB", &tmdb.base_url)?;
            }
            Ok(())
        }
    }
}

mod sportsdb {
    use super::*;
    use crate::sportsdb::SportsDbProvider;

    pub struct SportsDbProviderFactory;

    impl ProviderFactory for SportsDbProviderFactory {
        fn provider_name(&self) -> &str {
            "sportsdb"
        }

        fn create_provider(&self, config: &Config) -> Result<Option<Arc<dyn ContentProvider>>> {
            if !config.sportsdb.enabled {
                return Ok(None);
            }
            Ok(Some(Arc::new(SportsDbProvider::new(&config.sportsdb))))
        }

        fn validate_config(&self, config: &Config) -> Result<()> {
            let sportsdb = &config.sportsdb;
            if sportsdb.enabled {
                if sportsdb.league_id.trim().is_empty() {
                    return Err(anyhow::anyhow!("TheSportsDB is enabled but league_id is empty"));
                }
                require_url("TheSportsDB", &sportsdb.base_url)?;
            }
            Ok(())
        }
    }
}

mod itunes {
    use super::*;
    use crate::itunes::ItunesProvider;

    pub struct ItunesProviderFactory;

    impl ProviderFactory for ItunesProviderFactory {
        fn provider_name(&self) -> &str {
            "itunes"
        }

        fn create_provider(&self, config: &Config) -> Result<Option<Arc<dyn ContentProvider>>> {
            if !config.itunes.enabled {
                return Ok(None);
            }
            Ok(Some(Arc::new(ItunesProvider::new(&config.itunes))))
        }

        fn validate_config(&self, config: &Config) -> Result<()> {
            let itunes = &config.itunes;
            if itunes.enabled {
                if itunes.page_size == 0 || itunes.page_size > 200 {
                    return Err(anyhow::anyhow!(
                        "iTunes page_size must be between 1 and 200, got {}",
                        itunes.page_size
                    ));
                }
                require_url("iTunes", &itunes.base_url)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamverse_models::ContentType;

    fn configured() -> Config {
        let mut config = Config::default();
        config.tmdb.api_key = "abc123".to_string();
        config
    }

    #[test]
    fn test_registry_order() {
        let registry = ProviderFactoryRegistry::new();
        assert_eq!(registry.registered_providers(), vec!["tmdb", "sportsdb", "itunes"]);
        assert!(registry.is_registered("itunes"));
        assert!(!registry.is_registered("plex"));
    }

    #[test]
    fn test_create_all_enabled() {
        let providers = ProviderFactoryRegistry::new().create_all(&configured()).unwrap();
        let names: Vec<_> = providers.iter().map(|p| p.provider_name().to_string()).collect();
        assert_eq!(names, vec!["tmdb", "sportsdb", "itunes"]);
        assert!(providers[0].serves(ContentType::Series));
        assert!(providers[2].serves(ContentType::Music));
    }

    #[test]
    fn test_placeholder_key_fails_validation() {
        let result = ProviderFactoryRegistry::new().create_all(&Config::default());
        assert!(result.is_err());
        assert!(result.err().unwrap().to_string().contains("api_key"));
    }

    #[test]
    fn test_disabled_provider_is_skipped() {
        let mut config = Config::default();
        config.tmdb.enabled = false;
        config.itunes.enabled = false;

        let providers = ProviderFactoryRegistry::new().create_all(&config).unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].provider_name(), "sportsdb");
    }

    #[test]
    fn test_bad_page_size() {
        let mut config = configured();
        config.itunes.page_size = 0;
        assert!(ProviderFactoryRegistry::new().validate_all_configs(&config).is_err());
    }

    #[test]
    fn test_create_by_name() {
        let registry = ProviderFactoryRegistry::new();
        let provider = registry.create_by_name("sportsdb", &configured()).unwrap().unwrap();
        assert_eq!(provider.provider_name(), "sportsdb");
        assert!(registry.create_by_name("unknown", &configured()).unwrap().is_none());
    }
}
