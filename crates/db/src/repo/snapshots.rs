use relayarr_core::types::{MediaKey, MediaType};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::warn;

/// Last known state of one tracked item and the sink object representing it.
#[derive(Debug, Clone)]
pub struct SnapshotRow {
    pub media_type: MediaType,
    pub source_id: i64,
    pub sink_object_id: String,
    /// Last rendered record. Rows written by older versions may lack fields,
    /// so this stays an untyped value.
    pub last_state: Value,
    pub created_ts: i64,
    pub updated_ts: i64,
}

impl SnapshotRow {
    pub fn key(&self) -> MediaKey {
        MediaKey {
            media_type: self.media_type,
            source_id: self.source_id,
        }
    }
}

type RawSnapshot = (String, i64, String, String, i64, i64);

const COLUMNS: &str =
    "media_type, source_id, sink_object_id, last_state, created_ts, updated_ts";

/// Point lookup by compound key.
pub async fn get(pool: &SqlitePool, key: MediaKey) -> Result<Option<SnapshotRow>, sqlx::Error> {
    let row: Option<RawSnapshot> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM media_snapshot WHERE media_type = ? AND source_id = ?"
    ))
    .bind(key.media_type.as_str())
    .bind(key.source_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(row_to_snapshot))
}

/// Point lookup by the sink object handle.
pub async fn get_by_sink_object_id(
    pool: &SqlitePool,
    sink_object_id: &str,
) -> Result<Option<SnapshotRow>, sqlx::Error> {
    let row: Option<RawSnapshot> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM media_snapshot WHERE sink_object_id = ?"
    ))
    .bind(sink_object_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(row_to_snapshot))
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<SnapshotRow>, sqlx::Error> {
    let rows: Vec<RawSnapshot> = sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM media_snapshot ORDER BY media_type, source_id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(row_to_snapshot).collect())
}

/// Insert a snapshot for a freshly created sink object.
pub async fn insert(
    pool: &SqlitePool,
    key: MediaKey,
    sink_object_id: &str,
    state: &Value,
) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        "INSERT INTO media_snapshot \
         (media_type, source_id, sink_object_id, last_state, created_ts, updated_ts) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(key.media_type.as_str())
    .bind(key.source_id)
    .bind(sink_object_id)
    .bind(state.to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Replace the stored state wholesale. Returns `false` if no row references the object.
pub async fn update_state(
    pool: &SqlitePool,
    sink_object_id: &str,
    state: &Value,
) -> Result<bool, sqlx::Error> {
    let now = chrono::Utc::now().timestamp();
    let result = sqlx::query(
        "UPDATE media_snapshot SET last_state = ?, updated_ts = ? WHERE sink_object_id = ?",
    )
    .bind(state.to_string())
    .bind(now)
    .bind(sink_object_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Swap a stale snapshot for one pointing at a freshly created sink object.
/// The old row is deleted and the new one inserted in a single transaction.
pub async fn replace(
    pool: &SqlitePool,
    stale_sink_object_id: &str,
    key: MediaKey,
    sink_object_id: &str,
    state: &Value,
) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now().timestamp();
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM media_snapshot WHERE sink_object_id = ?")
        .bind(stale_sink_object_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO media_snapshot \
         (media_type, source_id, sink_object_id, last_state, created_ts, updated_ts) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(key.media_type.as_str())
    .bind(key.source_id)
    .bind(sink_object_id)
    .bind(state.to_string())
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

fn row_to_snapshot(r: RawSnapshot) -> Option<SnapshotRow> {
    let Some(media_type) = MediaType::parse(&r.0) else {
        warn!(media_type = %r.0, source_id = r.1, "ignoring snapshot with unknown media type");
        return None;
    };
    let last_state = serde_json::from_str(&r.3).unwrap_or_else(|e| {
        warn!(
            sink_object_id = %r.2,
            error = %e,
            "stored state is not valid JSON, treating it as empty"
        );
        Value::Null
    });

    Some(SnapshotRow {
        media_type,
        source_id: r.1,
        sink_object_id: r.2,
        last_state,
        created_ts: r.4,
        updated_ts: r.5,
    })
}
