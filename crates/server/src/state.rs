use std::sync::Arc;

use relayarr_sync::orchestrator::Orchestrator;
use sqlx::SqlitePool;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub orchestrator: Arc<Orchestrator>,
}
