use crate::error::FetchError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub fn create_http_client() -> Client {
    Client::builder()
        .user_agent(concat!("streamverse/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// GET `url` with `query` and decode a JSON body, failing on non-2xx.
pub async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, FetchError> {
    debug!("GET {} {:?}", url, redact(query));
    let response = client.get(url).query(query).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Http {
            status,
            url: response.url().path().to_string(),
        });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(Into::into)
}

fn redact<'a>(query: &'a [(&'a str, String)]) -> Vec<(&'a str, &'a str)> {
    query
        .iter()
        .map(|(k, v)| if *k == "api_key" { (*k, "***") } else { (*k, v.as_str()) })
        .collect()
}
