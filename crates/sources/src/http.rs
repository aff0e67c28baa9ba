use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::SourceError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin JSON client shared by the *arr-style APIs, all of which authenticate
/// with an `X-Api-Key` header.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "source request");

        let resp = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(params)
            .send()
            .await
            .map_err(|e| SourceError::Fetch {
                endpoint: path.to_string(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(SourceError::Fetch {
                endpoint: path.to_string(),
                reason: format!("returned {}", resp.status()),
            });
        }

        let body: Option<T> = resp.json().await.map_err(|e| SourceError::Fetch {
            endpoint: path.to_string(),
            reason: format!("parse JSON: {e}"),
        })?;

        body.ok_or_else(|| SourceError::MissingData {
            endpoint: path.to_string(),
        })
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
