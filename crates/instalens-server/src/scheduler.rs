//! Background job scheduler.
//!
//! Registers the recurring profile sweep: each tick refreshes the least
//! recently updated stored profile through the normal cache-aware path.

use instalens_refresh::{run_sweep_tick, Refresher, SweepOutcome};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// `sweep_cron` is not a valid cron expression, or the scheduler fails to
/// start.
pub async fn build_scheduler(
    refresher: Refresher,
    sweep_cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_sweep_job(&scheduler, refresher, sweep_cron).await?;

    scheduler.start().await?;
    tracing::info!(sweep_cron, "scheduler: started");
    Ok(scheduler)
}

async fn register_sweep_job(
    scheduler: &JobScheduler,
    refresher: Refresher,
    sweep_cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(sweep_cron, move |_uuid, _lock| {
        let refresher = refresher.clone();

        Box::pin(async move {
            tracing::debug!("scheduler: starting profile sweep");
            match run_sweep_tick(&refresher).await {
                SweepOutcome::Idle => {}
                SweepOutcome::Completed { handle, origin } => {
                    tracing::info!(
                        handle = %handle,
                        origin = %origin,
                        "scheduler: profile sweep complete"
                    );
                }
                SweepOutcome::Failed { handle, reason } => {
                    tracing::warn!(
                        handle = ?handle,
                        reason = %reason,
                        "scheduler: profile sweep failed"
                    );
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
