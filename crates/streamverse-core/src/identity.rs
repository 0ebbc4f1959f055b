//! Firebase Authentication over REST, plus the profile document every
//! signed-in account keeps in the store.

use crate::store::{fields, DocumentStore, FieldValue, SetMode, StoreError};
use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use streamverse_config::{CredentialStore, FirebaseConfig, StoredSession};
use streamverse_models::{AuthProvider, UserProfile};
use thiserror::Error;
use tracing::{debug, info};

pub const USERS_COLLECTION: &str = "users";
const DEFAULT_DISPLAY_NAME: &str = "Anonymous";
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("sign-in rejected: {0}")]
    Rejected(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected auth response: {0}")]
    Decode(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Human wording for Firebase Auth error codes.
fn describe_auth_error(code: &str) -> String {
    // codes may carry a suffix, e.g. "WEAK_PASSWORD : Password should be ..."
    let head = code.split(" : ").next().unwrap_or(code).trim();
    let message = match head {
        "EMAIL_EXISTS" => "an account already exists for this email",
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => "incorrect email or password",
        "USER_DISABLED" => "this account has been disabled",
        "WEAK_PASSWORD" => "password is too weak",
        "INVALID_EMAIL" => "email address is not valid",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "too many attempts, try again later",
        "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" => "session expired, sign in again",
        "ADMIN_ONLY_OPERATION" | "OPERATION_NOT_ALLOWED" => "this sign-in method is disabled for the project",
        _ => return code.to_string(),
    };
    message.to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub provider: AuthProvider,
}

impl Session {
    /// Expired, or expiring within a minute.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires) => expires - ChronoDuration::seconds(60) <= now,
            None => false,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.provider == AuthProvider::Anonymous
    }

    pub fn to_stored(&self) -> StoredSession {
        StoredSession {
            user_id: self.user_id.clone(),
            id_token: self.id_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_at: self.expires_at,
            email: self.email.clone(),
            provider: self.provider.as_str().to_string(),
        }
    }

    pub fn from_stored(stored: StoredSession) -> Self {
        let provider = match stored.provider.as_str() {
            "anonymous" => AuthProvider::Anonymous,
            _ => AuthProvider::Password,
        };
        Self {
            user_id: stored.user_id,
            id_token: stored.id_token,
            refresh_token: stored.refresh_token,
            expires_at: stored.expires_at,
            email: stored.email,
            display_name: None,
            provider,
        }
    }
}

/// Load the persisted session, if any.
pub fn load_session(credentials: &CredentialStore) -> Option<Session> {
    credentials.get_session().map(Session::from_stored)
}

pub fn save_session(credentials: &mut CredentialStore, session: &Session) -> Result<()> {
    credentials.set_session(&session.to_stored());
    credentials.save()
}

/// Drop the persisted session.
pub fn sign_out(credentials: &mut CredentialStore) -> Result<()> {
    credentials.clear_session();
    credentials.save()?;
    info!("Signed out");
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
    user_id: String,
}

fn expiry(expires_in: Option<&str>) -> Option<DateTime<Utc>> {
    let seconds: i64 = expires_in?.parse().ok()?;
    Some(Utc::now() + ChronoDuration::seconds(seconds))
}

pub struct AuthService {
    client: Client,
    config: FirebaseConfig,
}

impl AuthService {
    pub fn new(config: FirebaseConfig) -> Self {
        let client = Client::builder()
            .user_agent(concat!("streamverse/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, config }
    }

    async fn post(&self, url: String, body: &Value) -> Result<Value, AuthError> {
        let response = self
            .client
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(body)
            .send()
            .await?;
        Self::read(response).await
    }

    async fn read(response: reqwest::Response) -> Result<Value, AuthError> {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if status.is_success() {
            return Ok(body);
        }
        let code = body["error"]["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status));
        Err(AuthError::Rejected(describe_auth_error(&code)))
    }

    fn session_from(value: Value, provider: AuthProvider) -> Result<Session, AuthError> {
        let parsed: SignInResponse =
            serde_json::from_value(value).map_err(|e| AuthError::Decode(e.to_string()))?;
        Ok(Session {
            user_id: parsed.local_id,
            id_token: parsed.id_token,
            refresh_token: parsed.refresh_token,
            expires_at: expiry(parsed.expires_in.as_deref()),
            email: parsed.email.filter(|e| !e.is_empty()),
            display_name: parsed.display_name.filter(|n| !n.is_empty()),
            provider,
        })
    }

    fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
        if !email.contains('@') || email.trim().len() < 3 {
            return Err(AuthError::InvalidInput(format!("'{}' is not a valid email address", email)));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidInput(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        Self::validate_credentials(email, password)?;
        let url = format!("{}/accounts:signUp", self.config.auth_base_url);
        let body = json!({ "email": email.trim(), "password": password, "returnSecureToken": true });
        let session = Self::session_from(self.post(url, &body).await?, AuthProvider::Password)?;
        info!("Created account {}", session.user_id);
        Ok(session)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        Self::validate_credentials(email, password)?;
        let url = format!("{}/accounts:signInWithPassword", self.config.auth_base_url);
        let body = json!({ "email": email.trim(), "password": password, "returnSecureToken": true });
        let session = Self::session_from(self.post(url, &body).await?, AuthProvider::Password)?;
        info!("Signed in as {}", session.user_id);
        Ok(session)
    }

    /// Guest account without credentials.
    pub async fn sign_in_anonymously(&self) -> Result<Session, AuthError> {
        let url = format!("{}/accounts:signUp", self.config.auth_base_url);
        let session = Self::session_from(
            self.post(url, &json!({ "returnSecureToken": true })).await?,
            AuthProvider::Anonymous,
        )?;
        info!("Signed in as guest {}", session.user_id);
        Ok(session)
    }

    /// Exchange the refresh token for a fresh ID token.
    pub async fn refresh(&self, session: &Session) -> Result<Session, AuthError> {
        if session.refresh_token.is_empty() {
            return Err(AuthError::InvalidInput("session has no refresh token".to_string()));
        }
        let response = self
            .client
            .post(format!("{}/token", self.config.token_base_url))
            .query(&[("key", self.config.api_key.as_str())])
            .form(&[("grant_type", "refresh_token"), ("refresh_token", session.refresh_token.as_str())])
            .send()
            .await?;
        let value = Self::read(response).await?;
        let parsed: RefreshResponse =
            serde_json::from_value(value).map_err(|e| AuthError::Decode(e.to_string()))?;
        debug!("Refreshed token for {}", parsed.user_id);

        Ok(Session {
            user_id: parsed.user_id,
            id_token: parsed.id_token,
            refresh_token: parsed.refresh_token,
            expires_at: expiry(parsed.expires_in.as_deref()),
            ..session.clone()
        })
    }
}

/// Upsert `users/{uid}` after a sign-in. `createdAt` is written only when
/// the stored profile does not have one yet.
pub async fn ensure_profile(store: &dyn DocumentStore, session: &Session) -> Result<UserProfile, StoreError> {
    let now = Utc::now();
    let display_name = session
        .display_name
        .clone()
        .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());

    let profile = fields([
        ("uid", FieldValue::from(session.user_id.as_str())),
        ("email", FieldValue::from(session.email.clone())),
        ("displayName", FieldValue::from(display_name)),
        ("photoURL", FieldValue::Null),
        ("provider", FieldValue::from(session.provider.as_str())),
        ("updatedAt", FieldValue::from(now)),
    ]);
    store
        .set(USERS_COLLECTION, &session.user_id, profile, SetMode::Merge)
        .await?;

    let existing = store.get(USERS_COLLECTION, &session.user_id).await?;
    if existing.as_ref().and_then(|d| d.get_timestamp("createdAt")).is_none() {
        store
            .set(
                USERS_COLLECTION,
                &session.user_id,
                fields([("createdAt", FieldValue::from(now))]),
                SetMode::Merge,
            )
            .await?;
    }

    fetch_profile(store, &session.user_id)
        .await?
        .ok_or_else(|| StoreError::Decode(format!("profile {} vanished after upsert", session.user_id)))
}

pub async fn fetch_profile(store: &dyn DocumentStore, uid: &str) -> Result<Option<UserProfile>, StoreError> {
    let Some(doc) = store.get(USERS_COLLECTION, uid).await? else {
        return Ok(None);
    };
    let provider = match doc.get_str("provider") {
        Some("anonymous") => AuthProvider::Anonymous,
        _ => AuthProvider::Password,
    };
    Ok(Some(UserProfile {
        uid: uid.to_string(),
        email: doc.get_str("email").map(str::to_string),
        display_name: doc.get_str("displayName").unwrap_or(DEFAULT_DISPLAY_NAME).to_string(),
        photo_url: doc.get_str("photoURL").map(str::to_string),
        provider,
        created_at: doc.get_timestamp("createdAt"),
        updated_at: doc.get_timestamp("updatedAt"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;
    use tempfile::TempDir;
    use wiremock::matchers::{body_partial_json, body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> AuthService {
        let mut config = FirebaseConfig::new("web-key", "demo");
        config.auth_base_url = server.uri();
        config.token_base_url = server.uri();
        AuthService::new(config)
    }

    fn session(provider: AuthProvider) -> Session {
        Session {
            user_id: "u1".to_string(),
            id_token: "id".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: None,
            email: Some("a@b.co".to_string()),
            display_name: None,
            provider,
        }
    }

    #[tokio::test]
    async fn test_sign_in_with_password() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts:signInWithPassword"))
            .and(query_param("key", "web-key"))
            .and(body_partial_json(json!({"email": "a@b.co", "returnSecureToken": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "idToken": "id-1", "refreshToken": "r-1", "expiresIn": "3600",
                "localId": "uid-1", "email": "a@b.co"
            })))
            .mount(&server)
            .await;

        let session = service(&server).sign_in("a@b.co", "secret1").await.unwrap();
        assert_eq!(session.user_id, "uid-1");
        assert_eq!(session.provider, AuthProvider::Password);
        assert!(session.expires_at.unwrap() > Utc::now());
        assert!(!session.needs_refresh(Utc::now()));
    }

    #[tokio::test]
    async fn test_rejected_sign_in_is_described() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "INVALID_LOGIN_CREDENTIALS"}
            })))
            .mount(&server)
            .await;

        let err = service(&server).sign_in("a@b.co", "wrong-pass").await.unwrap_err();
        assert_eq!(err.to_string(), "sign-in rejected: incorrect email or password");
    }

    #[tokio::test]
    async fn test_input_validated_before_request() {
        let server = MockServer::start().await;
        let auth = service(&server);
        assert!(matches!(auth.sign_up("nope", "secret1").await, Err(AuthError::InvalidInput(_))));
        assert!(matches!(auth.sign_up("a@b.co", "123").await, Err(AuthError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_anonymous_sign_in() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts:signUp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "idToken": "id-g", "refreshToken": "r-g", "expiresIn": "3600", "localId": "guest-1"
            })))
            .mount(&server)
            .await;

        let session = service(&server).sign_in_anonymously().await.unwrap();
        assert!(session.is_anonymous());
        assert_eq!(session.email, None);
    }

    #[tokio::test]
    async fn test_refresh_exchanges_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id_token": "id-2", "refresh_token": "r-2", "expires_in": "3600", "user_id": "u1"
            })))
            .mount(&server)
            .await;

        let refreshed = service(&server).refresh(&session(AuthProvider::Password)).await.unwrap();
        assert_eq!(refreshed.id_token, "id-2");
        assert_eq!(refreshed.email.as_deref(), Some("a@b.co"));
    }

    #[tokio::test]
    async fn test_ensure_profile_sets_created_at_once() {
        let store = MemoryDocumentStore::new();
        let first = ensure_profile(&store, &session(AuthProvider::Anonymous)).await.unwrap();
        assert_eq!(first.display_name, "Anonymous");
        assert_eq!(first.provider, AuthProvider::Anonymous);
        let created = first.created_at.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = ensure_profile(&store, &session(AuthProvider::Anonymous)).await.unwrap();
        assert_eq!(second.created_at, Some(created));
        assert!(second.updated_at.unwrap() > created);
    }

    #[test]
    fn test_session_persistence() {
        let dir = TempDir::new().unwrap();
        let mut credentials = CredentialStore::new(dir.path().join("credentials.toml"));

        save_session(&mut credentials, &session(AuthProvider::Anonymous)).unwrap();
        let loaded = load_session(&credentials).unwrap();
        assert_eq!(loaded.user_id, "u1");
        assert!(loaded.is_anonymous());

        sign_out(&mut credentials).unwrap();
        assert!(load_session(&credentials).is_none());
    }

    #[test]
    fn test_needs_refresh_window() {
        let mut s = session(AuthProvider::Password);
        let now = Utc::now();
        s.expires_at = Some(now + ChronoDuration::seconds(30));
        assert!(s.needs_refresh(now));
        s.expires_at = Some(now + ChronoDuration::seconds(600));
        assert!(!s.needs_refresh(now));
    }
}
