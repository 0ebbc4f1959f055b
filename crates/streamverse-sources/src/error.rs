use streamverse_models::FilterError;
use thiserror::Error;

/// Errors a provider lets escape its boundary.
///
/// Upstream trouble never shows up here: adapters degrade it to an empty
/// result. Only requests that cannot be valid are rejected.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid filters: {0}")]
    InvalidFilters(#[from] FilterError),
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

/// Failure talking to an upstream API. Internal to the adapters.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP error {status} for {url}")]
    Http { status: reqwest::StatusCode, url: String },

    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_http() {
        let err = FetchError::Http {
            status: reqwest::StatusCode::NOT_FOUND,
            url: "https://example.com/api".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 404 Not Found for https://example.com/api");
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: FetchError = json_err.into();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn test_filter_error_converts() {
        let err: SourceError = FilterError::BlankGenre.into();
        assert_eq!(err.to_string(), "invalid filters: genre must not be blank");
    }
}
