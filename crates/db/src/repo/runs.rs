use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct RunRow {
    pub id: String,
    pub status: String,
    pub items_total: i64,
    pub items_failed: i64,
    pub fetch_failures: i64,
    pub upserts: i64,
    pub events_sent: i64,
    pub error: Option<String>,
    pub started_ts: i64,
    pub finished_ts: Option<i64>,
}

/// Aggregate counts recorded when a run completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub items_total: i64,
    pub items_failed: i64,
    pub fetch_failures: i64,
    pub upserts: i64,
    pub events_sent: i64,
}

type RawRun = (
    String,
    String,
    i64,
    i64,
    i64,
    i64,
    i64,
    Option<String>,
    i64,
    Option<i64>,
);

pub async fn create_run(pool: &SqlitePool) -> Result<RunRow, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();

    sqlx::query("INSERT INTO sync_run (id, status, started_ts) VALUES (?, 'running', ?)")
        .bind(&id)
        .bind(now)
        .execute(pool)
        .await?;

    Ok(RunRow {
        id,
        status: "running".to_string(),
        items_total: 0,
        items_failed: 0,
        fetch_failures: 0,
        upserts: 0,
        events_sent: 0,
        error: None,
        started_ts: now,
        finished_ts: None,
    })
}

pub async fn complete_run(
    pool: &SqlitePool,
    run_id: &str,
    counts: &RunCounts,
) -> Result<bool, sqlx::Error> {
    let now = chrono::Utc::now().timestamp();
    let result = sqlx::query(
        "UPDATE sync_run SET status = 'completed', items_total = ?, items_failed = ?, \
         fetch_failures = ?, upserts = ?, events_sent = ?, finished_ts = ? \
         WHERE id = ? AND status = 'running'",
    )
    .bind(counts.items_total)
    .bind(counts.items_failed)
    .bind(counts.fetch_failures)
    .bind(counts.upserts)
    .bind(counts.events_sent)
    .bind(now)
    .bind(run_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fail_run(pool: &SqlitePool, run_id: &str, error: &str) -> Result<bool, sqlx::Error> {
    let now = chrono::Utc::now().timestamp();
    let result = sqlx::query(
        "UPDATE sync_run SET status = 'failed', error = ?, finished_ts = ? \
         WHERE id = ? AND status = 'running'",
    )
    .bind(error)
    .bind(now)
    .bind(run_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn get_run(pool: &SqlitePool, run_id: &str) -> Result<Option<RunRow>, sqlx::Error> {
    let row: Option<RawRun> = sqlx::query_as(
        "SELECT id, status, items_total, items_failed, fetch_failures, upserts, events_sent, \
         error, started_ts, finished_ts FROM sync_run WHERE id = ?",
    )
    .bind(run_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_to_run))
}

/// Most recent runs first.
pub async fn list_runs(pool: &SqlitePool, limit: i64) -> Result<Vec<RunRow>, sqlx::Error> {
    let rows: Vec<RawRun> = sqlx::query_as(
        "SELECT id, status, items_total, items_failed, fetch_failures, upserts, events_sent, \
         error, started_ts, finished_ts FROM sync_run \
         ORDER BY started_ts DESC, rowid DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_to_run).collect())
}

fn row_to_run(r: RawRun) -> RunRow {
    RunRow {
        id: r.0,
        status: r.1,
        items_total: r.2,
        items_failed: r.3,
        fetch_failures: r.4,
        upserts: r.5,
        events_sent: r.6,
        error: r.7,
        started_ts: r.8,
        finished_ts: r.9,
    }
}
