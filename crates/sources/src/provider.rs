use crate::SourceError;
use crate::payload::{
    EpisodeResource, MovieDetails, MovieResource, NotificationSettings, SeriesResource, TvDetails,
    UserSummary,
};

/// The request-management service: item details, users and their preferences.
#[async_trait::async_trait]
pub trait RequestSource: Send + Sync {
    async fn movie_details(&self, tmdb_id: i64) -> Result<MovieDetails, SourceError>;

    async fn tv_details(&self, tmdb_id: i64) -> Result<TvDetails, SourceError>;

    async fn users(&self) -> Result<Vec<UserSummary>, SourceError>;

    async fn notification_settings(
        &self,
        user_id: i64,
    ) -> Result<NotificationSettings, SourceError>;
}

/// Download automation for series, with per-series episode listings.
#[async_trait::async_trait]
pub trait SeriesSource: Send + Sync {
    async fn series(&self) -> Result<Vec<SeriesResource>, SourceError>;

    /// Episode listing with file-presence flags.
    async fn episodes(&self, series_id: i64) -> Result<Vec<EpisodeResource>, SourceError>;
}

/// Download automation for movies.
#[async_trait::async_trait]
pub trait MovieSource: Send + Sync {
    async fn movies(&self) -> Result<Vec<MovieResource>, SourceError>;
}
