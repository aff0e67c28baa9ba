use crate::SourceError;
use crate::http::ApiClient;
use crate::payload::{EpisodeResource, SeriesResource, SystemStatus};
use crate::provider::SeriesSource;

#[derive(Debug, Clone)]
pub struct SonarrClient {
    api: ApiClient,
}

impl SonarrClient {
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
impl SeriesSource for SonarrClient {
    async fn series(&self) -> Result<Vec<SeriesResource>, SourceError> {
        self.api.get_json("/api/v3/series", &[]).await
    }

    async fn episodes(&self, series_id: i64) -> Result<Vec<EpisodeResource>, SourceError> {
        let series_id = series_id.to_string();
        self.api
            .get_json(
                "/api/v3/episode",
                &[("seriesId", series_id.as_str()), ("includeEpisodeFile", "true")],
            )
            .await
    }
}
