pub mod http;
pub mod jellyseerr;
pub mod normalize;
pub mod payload;
pub mod provider;
pub mod radarr;
pub mod sonarr;
pub mod users;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    /// The source was unreachable or answered with a non-success status.
    #[error("fetch {endpoint} failed: {reason}")]
    Fetch { endpoint: String, reason: String },
    /// The source answered, but without a payload.
    #[error("fetch {endpoint} returned no data")]
    MissingData { endpoint: String },
    /// The payload lacks fields a canonical record cannot do without.
    #[error("mapping error: {0}")]
    Mapping(String),
}

impl SourceError {
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }
}
