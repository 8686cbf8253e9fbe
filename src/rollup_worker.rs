// Background scheduler: fires a rollup pass at each cron time (local time).
// Each pass runs in its own task so a slow or hung pass never delays the
// schedule; a single-flight flag skips ticks while a pass is still running,
// so two passes never aggregate the same staged samples concurrently.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, instrument, warn};

use crate::rollup::Rollup;

/// Config for the rollup worker.
#[derive(Debug, Clone)]
pub struct RollupWorkerConfig {
    /// Cron expression, seconds first (e.g. "0 */2 * * * *").
    pub schedule: String,
}

/// Run-in-progress flag shared by every tick of one worker.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight(Arc<AtomicBool>);

/// Held for the duration of a pass; clears the flag on drop (including unwind).
#[derive(Debug)]
pub struct FlightGuard(Arc<AtomicBool>);

impl SingleFlight {
    pub fn try_acquire(&self) -> Option<FlightGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard(self.0.clone()))
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Spawns the rollup worker. Returns a join handle that resolves after
/// `shutdown_rx` fires and any in-flight pass has finished.
pub fn spawn(
    rollup: Arc<Rollup>,
    config: RollupWorkerConfig,
    shutdown_rx: oneshot::Receiver<()>,
) -> anyhow::Result<JoinHandle<()>> {
    let schedule = cron::Schedule::from_str(&config.schedule)
        .map_err(|e| anyhow::anyhow!("rollup schedule {:?}: {}", config.schedule, e))?;
    Ok(tokio::spawn(async move {
        run(rollup, schedule, config, shutdown_rx).await;
    }))
}

#[instrument(skip(rollup, schedule, shutdown_rx), fields(schedule = %config.schedule))]
async fn run(
    rollup: Arc<Rollup>,
    schedule: cron::Schedule,
    config: RollupWorkerConfig,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let flight = SingleFlight::default();
    let mut passes = JoinSet::new();
    let mut last_fired: Option<DateTime<Local>> = None;
    info!("rollup worker started");

    loop {
        let now = Local::now();
        let from = last_fired.map_or(now, |t| t.max(now));
        let Some(next) = schedule.after(&from).next() else {
            warn!("rollup schedule has no upcoming times; worker idle");
            let _ = (&mut shutdown_rx).await;
            break;
        };
        let delay = (next - now).to_std().unwrap_or(Duration::ZERO);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                last_fired = Some(next);
                try_start_pass(&rollup, &flight, &mut passes);
            }
            _ = &mut shutdown_rx => {
                debug!("rollup worker shutting down");
                break;
            }
        }

        while let Some(joined) = passes.try_join_next() {
            log_join(joined);
        }
    }

    while let Some(joined) = passes.join_next().await {
        log_join(joined);
    }
    info!("rollup worker stopped");
}

/// Starts one pass in `passes` unless a pass is already in flight.
/// Returns whether a pass was started.
pub fn try_start_pass(rollup: &Arc<Rollup>, flight: &SingleFlight, passes: &mut JoinSet<()>) -> bool {
    let Some(guard) = flight.try_acquire() else {
        warn!("previous rollup pass still running; skipping tick");
        return false;
    };
    let rollup = rollup.clone();
    passes.spawn(async move {
        let _guard = guard;
        if let Err(e) = rollup.run_pass(Utc::now()).await {
            warn!(error = %e, "rollup pass failed; staged samples kept for next pass");
        }
    });
    true
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        warn!(error = %e, "rollup pass task ended abnormally");
    }
}
