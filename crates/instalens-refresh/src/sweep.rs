//! One tick of the background sweep: refresh the least recently updated
//! profile through the normal cache-aware path.

use crate::orchestrator::{Refresher, ServeOrigin};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    /// The store is empty.
    Idle,
    /// The oldest record went through `get_profile`; `origin` tells whether it
    /// was still servable, refreshed, or fell back to the stored copy.
    Completed { handle: String, origin: ServeOrigin },
    /// Selecting or refreshing failed. `handle` is `None` when the oldest
    /// record could not be read.
    Failed {
        handle: Option<String>,
        reason: String,
    },
}

/// Run one sweep tick. Failures are logged and reported, never propagated,
/// so a scheduler can keep ticking.
pub async fn run_sweep_tick(refresher: &Refresher) -> SweepOutcome {
    let oldest = match refresher.store().oldest().await {
        Ok(Some(record)) => record,
        Ok(None) => {
            tracing::debug!("sweep: no stored profiles");
            return SweepOutcome::Idle;
        }
        Err(e) => {
            tracing::error!(error = %e, "sweep: failed to select oldest profile");
            return SweepOutcome::Failed {
                handle: None,
                reason: e.to_string(),
            };
        }
    };

    let handle = oldest.handle;
    tracing::info!(
        handle = %handle,
        last_updated = %oldest.last_updated,
        "sweep: refreshing oldest profile"
    );

    match refresher.get_profile_detailed(&handle, false).await {
        Ok(served) => {
            tracing::info!(handle = %handle, origin = %served.origin, "sweep: tick complete");
            SweepOutcome::Completed {
                handle,
                origin: served.origin,
            }
        }
        Err(e) => {
            tracing::error!(handle = %handle, error = %e, "sweep: refresh failed");
            SweepOutcome::Failed {
                handle: Some(handle),
                reason: e.to_string(),
            }
        }
    }
}
