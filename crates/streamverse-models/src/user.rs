use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the account signed in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Password,
    Anonymous,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Password => "password",
            AuthProvider::Anonymous => "anonymous",
        }
    }
}

/// Profile document kept for every signed-in account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub provider: AuthProvider,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
