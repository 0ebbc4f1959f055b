use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// Signed-in identity persisted between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSession {
    pub user_id: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub email: Option<String>,
    pub provider: String,
}

pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.credentials.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.credentials.remove(key);
    }

    pub fn get_session(&self) -> Option<StoredSession> {
        let user_id = self.get("session_user_id")?.clone();
        let id_token = self.get("session_id_token")?.clone();
        Some(StoredSession {
            user_id,
            id_token,
            refresh_token: self.get("session_refresh_token").cloned().unwrap_or_default(),
            expires_at: self
                .get("session_expires_at")
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            email: self.get("session_email").cloned(),
            provider: self
                .get("session_provider")
                .cloned()
                .unwrap_or_else(|| "password".to_string()),
        })
    }

    pub fn set_session(&mut self, session: &StoredSession) {
        self.set("session_user_id".to_string(), session.user_id.clone());
        self.set("session_id_token".to_string(), session.id_token.clone());
        self.set("session_refresh_token".to_string(), session.refresh_token.clone());
        self.set("session_provider".to_string(), session.provider.clone());
        match session.expires_at {
            Some(expires) => self.set("session_expires_at".to_string(), expires.to_rfc3339()),
            None => self.remove("session_expires_at"),
        }
        match &session.email {
            Some(email) => self.set("session_email".to_string(), email.clone()),
            None => self.remove("session_email"),
        }
    }

    pub fn clear_session(&mut self) {
        for key in self.get_all_keys() {
            if key.starts_with("session_") {
                self.remove(&key);
            }
        }
    }

    pub fn get_all_keys(&self) -> Vec<String> {
        self.credentials.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn session() -> StoredSession {
        StoredSession {
            user_id: "uid-1".to_string(),
            id_token: "id-token".to_string(),
            refresh_token: "refresh-token".to_string(),
            expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
            email: Some("viewer@example.com".to_string()),
            provider: "password".to_string(),
        }
    }

    #[test]
    fn test_credential_store_session_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut store = CredentialStore::new(path.clone());
        let original = session();
        store.set_session(&original);
        store.save().unwrap();

        let mut loaded_store = CredentialStore::new(path);
        loaded_store.load().unwrap();
        let loaded = loaded_store.get_session().unwrap();
        assert_eq!(loaded.user_id, "uid-1");
        assert_eq!(loaded.email.as_deref(), Some("viewer@example.com"));
        // Allow 1 second difference for serialization
        let diff = loaded.expires_at.unwrap() - original.expires_at.unwrap();
        assert!(diff.num_seconds().abs() < 2);
    }

    #[test]
    fn test_clear_session_keeps_other_keys() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/test"));
        store.set_session(&session());
        store.set("other".to_string(), "value".to_string());

        store.clear_session();
        assert!(store.get_session().is_none());
        assert_eq!(store.get("other"), Some(&"value".to_string()));
    }

    #[test]
    fn test_anonymous_session_without_email() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/test"));
        let mut guest = session();
        guest.email = None;
        guest.provider = "anonymous".to_string();
        store.set_session(&guest);

        let loaded = store.get_session().unwrap();
        assert_eq!(loaded.email, None);
        assert_eq!(loaded.provider, "anonymous");
    }
}
