use relayarr_core::types::MediaRecord;
use relayarr_db::repo::snapshots;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::SyncError;
use crate::diff::{self, PreviousState};
use crate::sink::SinkAdapter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Identical to the stored snapshot; nothing was touched.
    Unchanged,
    /// First observation. The object was created without events.
    Created { sink_object_id: String },
    Updated {
        sink_object_id: String,
        events: usize,
    },
}

impl ReconcileOutcome {
    pub fn upserted(&self) -> bool {
        !matches!(self, ReconcileOutcome::Unchanged)
    }

    pub fn events(&self) -> usize {
        match self {
            ReconcileOutcome::Updated { events, .. } => *events,
            _ => 0,
        }
    }
}

#[derive(Clone)]
pub struct Reconciler {
    pool: SqlitePool,
    sink: SinkAdapter,
}

impl Reconciler {
    pub fn new(pool: SqlitePool, sink: SinkAdapter) -> Self {
        Self { pool, sink }
    }

    pub async fn reconcile(&self, record: &MediaRecord) -> Result<ReconcileOutcome, SyncError> {
        let key = record.key();
        let snapshot = snapshots::get(&self.pool, key).await?;
        let state = serde_json::to_value(record)?;

        if let Some(snapshot) = &snapshot {
            if snapshot.last_state == state {
                debug!(%key, "unchanged");
                return Ok(ReconcileOutcome::Unchanged);
            }
        }

        let existing = snapshot.as_ref().map(|s| s.sink_object_id.as_str());
        let upserted = self.sink.upsert(record, existing).await?;
        let sink_object_id = upserted.message.id.clone();

        match &snapshot {
            None => snapshots::insert(&self.pool, key, &sink_object_id, &state).await?,
            // The old object vanished and was recreated
            Some(stale) if upserted.created => {
                snapshots::replace(&self.pool, &stale.sink_object_id, key, &sink_object_id, &state)
                    .await?
            }
            Some(_) => {
                if !snapshots::update_state(&self.pool, &sink_object_id, &state).await? {
                    snapshots::insert(&self.pool, key, &sink_object_id, &state).await?;
                }
            }
        }

        let Some(snapshot) = snapshot else {
            info!(%key, sink_object_id = %sink_object_id, title = %record.title, "tracking new item");
            return Ok(ReconcileOutcome::Created { sink_object_id });
        };

        let previous = PreviousState::from_value(&snapshot.last_state);
        let transitions = diff::transitions(&previous, record);
        self.sink
            .notify_all(&upserted.message, record, &transitions)
            .await?;

        Ok(ReconcileOutcome::Updated {
            sink_object_id,
            events: transitions.len(),
        })
    }
}
