use std::sync::Arc;
use std::time::Duration;

use relayarr_sync::orchestrator::Orchestrator;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Run once immediately, then every `every`. Ticks that land while a run is
/// in flight are dropped rather than queued.
pub fn spawn(orchestrator: Arc<Orchestrator>, every: Duration) -> JoinHandle<()> {
    info!(interval_secs = every.as_secs(), "scheduler started");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match orchestrator.run_once().await {
                Ok(Some(summary)) => debug!(run_id = %summary.run_id, "scheduled run finished"),
                Ok(None) => {}
                Err(e) => error!(error = %e, "scheduled run failed"),
            }
        }
    })
}
