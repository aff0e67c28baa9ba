use crate::SourceError;
use crate::http::ApiClient;
use crate::payload::{MovieResource, SystemStatus};
use crate::provider::MovieSource;

#[derive(Debug, Clone)]
pub struct RadarrClient {
    api: ApiClient,
}

impl RadarrClient {
    pub fn new(url: &str, api_key: impl Into<String>) -> Self {
        Self {
            api: ApiClient::new(url, api_key),
        }
    }

    pub fn url(&self) -> &str {
        self.api.base_url()
    }

    pub async fn system_status(&self) -> Result<SystemStatus, SourceError> {
        self.api.get_json("/api/v3/system/status", &[]).await
    }
}

#[async_trait::async_trait]
impl MovieSource for RadarrClient {
    async fn movies(&self) -> Result<Vec<MovieResource>, SourceError> {
        self.api.get_json("/api/v3/movie", &[]).await
    }
}
