use chrono::Utc;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::sync::Arc;
use streamverse_config::{Config, CredentialStore, PathManager, StoreBackend};
use streamverse_core::identity::{load_session, save_session, sign_out};
use streamverse_core::{
    ensure_profile, AuthService, Catalog, DocumentStore, EngagementStore, FirestoreStore, LocalDocumentStore,
    MemoryDocumentStore, Session,
};
use streamverse_sources::ProviderFactoryRegistry;
use tracing::{debug, warn};

/// Everything a command needs: configuration, the signed-in session and the
/// document store behind it.
pub struct AppContext {
    pub config: Config,
    credentials: CredentialStore,
    session: Option<Session>,
    store: Arc<dyn DocumentStore>,
    firestore: Option<Arc<FirestoreStore>>,
}

impl AppContext {
    pub async fn build(config: Config, paths: PathManager) -> Result<Self> {
        paths
            .ensure_directories()
            .map_err(|e| eyre!("Failed to create data directories: {}", e))?;

        let credentials_file = paths.credentials_file();
        let mut credentials = CredentialStore::new(credentials_file.clone());
        credentials
            .load()
            .map_err(|e| eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;
        let session = load_session(&credentials);

        let (store, firestore): (Arc<dyn DocumentStore>, Option<Arc<FirestoreStore>>) = match config.store.backend {
            StoreBackend::Local => {
                let path = paths.store_file();
                let local = LocalDocumentStore::open(&path)
                    .map_err(|e| eyre!("Failed to open local store at {}: {}", path.display(), e))?;
                (Arc::new(local) as Arc<dyn DocumentStore>, None)
            }
            StoreBackend::Memory => (Arc::new(MemoryDocumentStore::new()) as Arc<dyn DocumentStore>, None),
            StoreBackend::Firestore => {
                let firebase = config
                    .firebase
                    .as_ref()
                    .ok_or_else(|| eyre!("store.backend is 'firestore' but no [firebase] section is configured"))?;
                let remote = Arc::new(FirestoreStore::new(firebase));
                remote.set_id_token(session.as_ref().map(|s| s.id_token.clone()));
                (remote.clone() as Arc<dyn DocumentStore>, Some(remote))
            }
        };
        debug!("Using {:?} document store", config.store.backend);

        let mut context = Self {
            config,
            credentials,
            session,
            store,
            firestore,
        };
        context.refresh_if_expired().await;
        Ok(context)
    }

    /// Swap an expiring token for a fresh one. A failed refresh keeps the
    /// old session; the store will report it as unauthenticated.
    async fn refresh_if_expired(&mut self) {
        let Some(session) = self.session.clone() else {
            return;
        };
        if !session.needs_refresh(Utc::now()) {
            return;
        }
        let Ok(auth) = self.auth() else {
            return;
        };
        match auth.refresh(&session).await {
            Ok(fresh) => {
                if let Err(e) = self.adopt_session(fresh) {
                    warn!("Failed to persist refreshed session: {}", e);
                }
            }
            Err(e) => warn!("Session refresh failed: {}", e),
        }
    }

    pub fn catalog(&self) -> Result<Arc<Catalog>> {
        let registry = ProviderFactoryRegistry::new();
        let providers = registry
            .create_all(&self.config)
            .map_err(|e| eyre!("Configuration validation failed: {}", e))?;
        if providers.is_empty() {
            return Err(eyre!("No content providers are enabled. Run 'streamverse config init'."));
        }
        Ok(Arc::new(Catalog::new(providers)))
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    pub fn engagement(&self) -> Arc<EngagementStore> {
        Arc::new(EngagementStore::new(self.store.clone()))
    }

    pub fn auth(&self) -> Result<AuthService> {
        let firebase = self
            .config
            .firebase
            .clone()
            .ok_or_else(|| eyre!("Firebase is not configured. Add a [firebase] section with api_key and project_id."))?;
        Ok(AuthService::new(firebase))
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user_id.as_str())
    }

    pub fn require_user(&self) -> Result<&str> {
        self.user_id()
            .ok_or_else(|| eyre!("Not signed in. Run 'streamverse auth sign-in' or 'streamverse auth guest'."))
    }

    /// Persist a new session and hand its token to the remote store.
    pub fn adopt_session(&mut self, session: Session) -> Result<()> {
        save_session(&mut self.credentials, &session).map_err(|e| eyre!("Failed to save session: {}", e))?;
        if let Some(remote) = &self.firestore {
            remote.set_id_token(Some(session.id_token.clone()));
        }
        self.session = Some(session);
        Ok(())
    }

    /// Persist the session, then upsert its profile document.
    pub async fn sign_in(&mut self, session: Session) -> Result<()> {
        self.adopt_session(session.clone())?;
        if let Err(e) = ensure_profile(self.store.as_ref(), &session).await {
            warn!("Failed to update profile for {}: {}", session.user_id, e);
        }
        Ok(())
    }

    pub fn sign_out(&mut self) -> Result<()> {
        sign_out(&mut self.credentials).map_err(|e| eyre!("Failed to clear session: {}", e))?;
        if let Some(remote) = &self.firestore {
            remote.set_id_token(None);
        }
        self.session = None;
        Ok(())
    }
}
