use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use relayarr_core::types::MediaRecord;
use relayarr_db::repo::runs::{self, RunCounts};
use relayarr_sources::users::load_user_directory;
use sqlx::SqlitePool;
use tracing::{Instrument, error, info, info_span, warn};

use crate::SyncError;
use crate::aggregate::{self, Sources};
use crate::reconcile::{ReconcileOutcome, Reconciler};

/// Above this many items a single run is expected to strain the sink's
/// thread limits.
pub const THREAD_CEILING: usize = 1000;

pub struct Orchestrator {
    pool: SqlitePool,
    sources: Sources,
    reconciler: Reconciler,
    running: Arc<AtomicBool>,
    concurrency: usize,
}

/// Held for the duration of a run; clears the single-flight flag on drop,
/// whether the run finished, failed or panicked.
#[derive(Debug)]
pub struct RunGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: String,
    pub items_total: usize,
    pub items_failed: usize,
    pub fetch_failures: usize,
    pub upserts: usize,
    pub events_sent: usize,
}

impl RunSummary {
    fn counts(&self) -> RunCounts {
        RunCounts {
            items_total: self.items_total as i64,
            items_failed: self.items_failed as i64,
            fetch_failures: self.fetch_failures as i64,
            upserts: self.upserts as i64,
            events_sent: self.events_sent as i64,
        }
    }
}

impl Orchestrator {
    pub fn new(
        pool: SqlitePool,
        sources: Sources,
        reconciler: Reconciler,
        concurrency: usize,
    ) -> Self {
        Self {
            pool,
            sources,
            reconciler,
            running: Arc::new(AtomicBool::new(false)),
            concurrency: concurrency.max(1),
        }
    }

    /// Claim the single-flight flag. `None` if a run is already active.
    pub fn try_begin(&self) -> Option<RunGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard {
                flag: self.running.clone(),
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run once unless a run is already in flight, in which case this
    /// trigger is dropped and `Ok(None)` returned.
    pub async fn run_once(&self) -> Result<Option<RunSummary>, SyncError> {
        let Some(guard) = self.try_begin() else {
            info!("sync already running, skipping trigger");
            return Ok(None);
        };
        self.run_with(guard).await.map(Some)
    }

    pub async fn run_with(&self, guard: RunGuard) -> Result<RunSummary, SyncError> {
        let run = runs::create_run(&self.pool).await?;
        let span = info_span!("sync_run", run_id = %run.id);

        let result = self.execute(&run.id).instrument(span).await;
        match &result {
            Ok(summary) => {
                runs::complete_run(&self.pool, &run.id, &summary.counts()).await?;
            }
            Err(e) => {
                error!(run_id = %run.id, error = %e, "sync run failed");
                runs::fail_run(&self.pool, &run.id, &e.to_string()).await?;
            }
        }

        drop(guard);
        result
    }

    async fn execute(&self, run_id: &str) -> Result<RunSummary, SyncError> {
        info!("sync run started");

        let users = load_user_directory(self.sources.requests.as_ref()).await?;
        let aggregated = aggregate::aggregate(&self.sources, &users).await;
        let records = dedupe(aggregated.records);

        if records.len() > THREAD_CEILING {
            warn!(
                items = records.len(),
                ceiling = THREAD_CEILING,
                "item count exceeds the sink's thread ceiling"
            );
        }

        let mut summary = RunSummary {
            run_id: run_id.to_string(),
            items_total: records.len(),
            fetch_failures: aggregated.failures.len(),
            ..Default::default()
        };

        let outcomes: Vec<_> = futures::stream::iter(records)
            .map(|record| {
                let reconciler = self.reconciler.clone();
                async move {
                    let outcome = reconciler.reconcile(&record).await;
                    (record, outcome)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for (record, outcome) in outcomes {
            match outcome {
                Ok(outcome) => {
                    if outcome.upserted() {
                        summary.upserts += 1;
                    }
                    summary.events_sent += outcome.events();
                    if let ReconcileOutcome::Updated { events, .. } = outcome {
                        if events > 0 {
                            info!(title = %record.title, events, "item changed");
                        }
                    }
                }
                Err(e) => {
                    summary.items_failed += 1;
                    error!(
                        media_type = %record.media_type(),
                        source_id = record.id,
                        title = %record.title,
                        error = %e,
                        "reconcile failed"
                    );
                }
            }
        }

        info!(
            items = summary.items_total,
            failed = summary.items_failed,
            fetch_failures = summary.fetch_failures,
            upserts = summary.upserts,
            events = summary.events_sent,
            "sync run finished"
        );
        Ok(summary)
    }
}

/// Keep the first record per compound key.
fn dedupe(records: Vec<MediaRecord>) -> Vec<MediaRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            let fresh = seen.insert(record.key());
            if !fresh {
                warn!(key = %record.key(), title = %record.title, "duplicate item in batch, ignoring");
            }
            fresh
        })
        .collect()
}
