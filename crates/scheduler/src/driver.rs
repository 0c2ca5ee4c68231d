use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use courtportal_registry::Registry;

use crate::error::SchedulerError;
use crate::metrics;
use crate::model::{DriverState, TickReport};
use crate::sync::PortalSync;

/// Fixed-period timer around [`PortalSync`].
///
/// Idle until `start`. Restarting aborts the previous timer first. A tick
/// that arrives while another is still running is skipped and counted.
pub struct SyncDriver<R>
where
    R: Registry + ?Sized + 'static,
{
    sync: Arc<PortalSync<R>>,
    period: Duration,
    in_flight: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<R> SyncDriver<R>
where
    R: Registry + ?Sized + 'static,
{
    pub fn new(sync: Arc<PortalSync<R>>, period: Duration) -> Self {
        Self {
            sync,
            period,
            in_flight: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    pub fn sync(&self) -> &Arc<PortalSync<R>> {
        &self.sync
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub async fn start(&self) -> Result<(), SchedulerError> {
        if self.period.is_zero() {
            return Err(SchedulerError::InvalidInterval);
        }
        let first = Instant::now()
            .checked_add(self.period)
            .ok_or(SchedulerError::InvalidInterval)?;
        let mut guard = self.worker.lock().await;
        if let Some(previous) = guard.take() {
            previous.abort();
            debug!("previous sync timer aborted");
        }

        let sync = Arc::clone(&self.sync);
        let in_flight = Arc::clone(&self.in_flight);
        let period = self.period;
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(err) = run_guarded(&*sync, &in_flight) {
                    debug!("timer tick skipped: {err}");
                }
            }
        });
        *guard = Some(handle);
        info!(period_secs = period.as_secs_f64(), "sync driver started");
        Ok(())
    }

    /// Returns `false` when the driver was already idle.
    pub async fn stop(&self) -> bool {
        match self.worker.lock().await.take() {
            Some(handle) => {
                handle.abort();
                info!("sync driver stopped");
                true
            }
            None => false,
        }
    }

    pub async fn state(&self) -> DriverState {
        match self.worker.lock().await.as_ref() {
            Some(handle) if !handle.is_finished() => DriverState::Active,
            _ => DriverState::Idle,
        }
    }

    /// Runs one tick now, unless one is already running.
    pub fn force_sync(&self) -> Result<TickReport, SchedulerError> {
        run_guarded(&*self.sync, &self.in_flight)
    }

    pub fn is_ticking(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn run_guarded<R>(
    sync: &PortalSync<R>,
    in_flight: &AtomicBool,
) -> Result<TickReport, SchedulerError>
where
    R: Registry + ?Sized,
{
    if in_flight
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        metrics::record_skipped_tick();
        return Err(SchedulerError::TickInFlight);
    }
    let _guard = InFlight(in_flight);
    let report = sync.tick();
    metrics::record_tick();
    Ok(report)
}
