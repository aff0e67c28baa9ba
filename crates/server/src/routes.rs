use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use relayarr_core::error::ApiError;
use relayarr_db::repo::{runs, snapshots};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::error::AppError;
use crate::state::AppState;

const DEFAULT_RUN_LIMIT: i64 = 50;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/sync", post(trigger_sync))
        .route("/sync/runs", get(list_runs))
        .route("/media", get(list_media))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(|e| ApiError::Internal(format!("database check failed: {e}")))?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

#[derive(Serialize)]
struct TriggerResponse {
    status: &'static str,
}

/// Start a run in the background. Refused while another run holds the guard.
async fn trigger_sync(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<TriggerResponse>), AppError> {
    let guard = state
        .orchestrator
        .try_begin()
        .ok_or_else(|| ApiError::Conflict("a sync run is already in progress".into()))?;

    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        if let Err(e) = orchestrator.run_with(guard).await {
            error!(error = %e, "manually triggered sync failed");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(TriggerResponse { status: "started" }),
    ))
}

#[derive(Deserialize)]
struct RunsQuery {
    limit: Option<i64>,
}

#[derive(Serialize)]
struct RunResponse {
    id: String,
    status: String,
    items_total: i64,
    items_failed: i64,
    fetch_failures: i64,
    upserts: i64,
    events_sent: i64,
    error: Option<String>,
    started_ts: i64,
    finished_ts: Option<i64>,
}

impl From<runs::RunRow> for RunResponse {
    fn from(r: runs::RunRow) -> Self {
        Self {
            id: r.id,
            status: r.status,
            items_total: r.items_total,
            items_failed: r.items_failed,
            fetch_failures: r.fetch_failures,
            upserts: r.upserts,
            events_sent: r.events_sent,
            error: r.error,
            started_ts: r.started_ts,
            finished_ts: r.finished_ts,
        }
    }
}

async fn list_runs(
    State(state): State<AppState>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<Vec<RunResponse>>, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RUN_LIMIT)
        .clamp(1, DEFAULT_RUN_LIMIT);
    let rows = runs::list_runs(&state.db, limit).await?;
    Ok(Json(rows.into_iter().map(RunResponse::from).collect()))
}

#[derive(Serialize)]
struct MediaResponse {
    media_type: String,
    source_id: i64,
    sink_object_id: String,
    title: Option<String>,
    status: Option<String>,
    updated_ts: i64,
}

/// Tracked items as remembered by their snapshots. Title and status come from
/// the stored state and are null when an older row lacks them.
async fn list_media(State(state): State<AppState>) -> Result<Json<Vec<MediaResponse>>, AppError> {
    let rows = snapshots::list(&state.db).await?;
    let media = rows
        .into_iter()
        .map(|row| MediaResponse {
            media_type: row.media_type.to_string(),
            source_id: row.source_id,
            title: row.last_state["title"].as_str().map(String::from),
            status: row.last_state["status"].as_str().map(String::from),
            sink_object_id: row.sink_object_id,
            updated_ts: row.updated_ts,
        })
        .collect();
    Ok(Json(media))
}
