pub mod aggregate;
pub mod diff;
pub mod orchestrator;
pub mod reconcile;
pub mod sink;

use relayarr_discord::SinkError;
use relayarr_sources::SourceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("db error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("encode state: {0}")]
    Encode(#[from] serde_json::Error),
}
