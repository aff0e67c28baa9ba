use crate::SourceError;
use crate::http::ApiClient;
use crate::payload::{
    MovieDetails, NotificationSettings, ServiceSettings, TvDetails, UserPage, UserSummary,
};
use crate::provider::RequestSource;

/// Page size large enough to list every user in one call.
const USER_PAGE_SIZE: &str = "9999";

#[derive(Debug, Clone)]
pub struct JellyseerrClient {
    api: ApiClient,
}

impl JellyseerrClient {
    pub fn new(url: &str, api_key: impl Into<String>) -> Self {
        Self {
            api: ApiClient::new(format!("{}/api/v1", url.trim_end_matches('/')), api_key),
        }
    }

    /// Series download instances registered in the request manager.
    pub async fn sonarr_settings(&self) -> Result<Vec<ServiceSettings>, SourceError> {
        self.api.get_json("/settings/sonarr", &[]).await
    }

    /// Movie download instances registered in the request manager.
    pub async fn radarr_settings(&self) -> Result<Vec<ServiceSettings>, SourceError> {
        self.api.get_json("/settings/radarr", &[]).await
    }
}

#[async_trait::async_trait]
impl RequestSource for JellyseerrClient {
    async fn movie_details(&self, tmdb_id: i64) -> Result<MovieDetails, SourceError> {
        self.api.get_json(&format!("/movie/{tmdb_id}"), &[]).await
    }

    async fn tv_details(&self, tmdb_id: i64) -> Result<TvDetails, SourceError> {
        self.api.get_json(&format!("/tv/{tmdb_id}"), &[]).await
    }

    async fn users(&self) -> Result<Vec<UserSummary>, SourceError> {
        let page: UserPage = self
            .api
            .get_json("/user", &[("take", USER_PAGE_SIZE)])
            .await?;
        Ok(page.results)
    }

    async fn notification_settings(
        &self,
        user_id: i64,
    ) -> Result<NotificationSettings, SourceError> {
        self.api
            .get_json(&format!("/user/{user_id}/settings/notifications"), &[])
            .await
    }
}
