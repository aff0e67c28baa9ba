//! Wire shapes of the three source APIs. Only the fields the normalizer
//! reads are modelled; everything else is ignored on deserialization.

use serde::Deserialize;

// ─── Request manager ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetails {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub media_info: Option<MediaInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TvDetails {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub media_info: Option<MediaInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    pub status: Option<i64>,
    #[serde(default)]
    pub requests: Vec<MediaRequest>,
    #[serde(default)]
    pub download_status: Vec<DownloadingItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRequest {
    pub id: i64,
    pub requested_by: Option<RequestUser>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestUser {
    pub id: i64,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadingItem {
    #[serde(default)]
    pub size: f64,
    #[serde(default)]
    pub size_left: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserPage {
    #[serde(default)]
    pub results: Vec<UserSummary>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub display_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    #[serde(default)]
    pub discord_enabled: bool,
    pub discord_id: Option<String>,
}

/// A download-automation instance as registered in the request manager.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSettings {
    pub hostname: String,
    pub port: u16,
    #[serde(default)]
    pub use_ssl: bool,
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ServiceSettings {
    /// Root URL of the instance, without a trailing slash.
    pub fn url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        let base = self
            .base_url
            .as_deref()
            .map(|b| b.trim_matches('/'))
            .filter(|b| !b.is_empty())
            .map(|b| format!("/{b}"))
            .unwrap_or_default();
        format!("{scheme}://{}:{}{base}", self.hostname, self.port)
    }
}

// ─── Download automation ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesResource {
    pub id: i64,
    pub tmdb_id: Option<i64>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeResource {
    pub season_number: u32,
    pub episode_number: u32,
    #[serde(default)]
    pub has_file: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieResource {
    pub id: i64,
    pub tmdb_id: Option<i64>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub app_name: Option<String>,
    pub version: Option<String>,
}
