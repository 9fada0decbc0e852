//! Cron side of the sync schedule.
//!
//! The cron job never runs a pass itself. It pushes a tick into the channel
//! read by the schedule loop, so passes stay strictly sequential and a slow
//! pass causes ticks to be dropped rather than queued without bound.

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the scheduler with the sync tick job registered.
///
/// The returned handle must be kept alive for the lifetime of the process.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// `cron` does not parse, or the scheduler fails to start.
pub async fn build_scheduler(
    ticks: mpsc::Sender<()>,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_sync_job(&scheduler, ticks, cron).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_sync_job(
    scheduler: &JobScheduler,
    ticks: mpsc::Sender<()>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let ticks = ticks.clone();
        Box::pin(async move {
            send_tick(&ticks);
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Returns true when the tick was queued.
fn send_tick(ticks: &mpsc::Sender<()>) -> bool {
    match ticks.try_send(()) {
        Ok(()) => {
            tracing::debug!("scheduler: sync tick queued");
            true
        }
        Err(TrySendError::Full(())) => {
            tracing::info!("scheduler: previous tick still pending, dropping this one");
            false
        }
        Err(TrySendError::Closed(())) => {
            tracing::warn!("scheduler: schedule loop has stopped, tick dropped");
            false
        }
    }
}
