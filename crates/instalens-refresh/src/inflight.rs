//! Per-handle coalescing of concurrent refreshes.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;

use crate::error::RefreshError;
use crate::orchestrator::Served;

type SharedRefresh = Shared<BoxFuture<'static, Result<Served, RefreshError>>>;

/// Map of handle to the refresh currently running for it.
///
/// The first caller for a handle starts the work; later callers await a clone
/// of the same shared future. The work runs on its own task, so it completes
/// and removes its entry even if every caller is dropped; the next request
/// after completion starts a new run.
#[derive(Clone, Default)]
pub(crate) struct InFlight {
    inner: Arc<Mutex<HashMap<String, SharedRefresh>>>,
}

impl InFlight {
    /// Run `start()` for `handle`, or join the run already in flight.
    ///
    /// Returns the shared outcome and whether this caller joined an existing
    /// run rather than starting one.
    pub(crate) async fn run<F, Fut>(
        &self,
        handle: &str,
        start: F,
    ) -> (Result<Served, RefreshError>, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Served, RefreshError>> + Send + 'static,
    {
        let (shared, joined) = {
            let mut map = self.inner.lock().await;
            if let Some(existing) = map.get(handle) {
                (existing.clone(), true)
            } else {
                let work = start();
                let registry = Arc::clone(&self.inner);
                let key = handle.to_owned();
                let owned = handle.to_owned();
                let shared = tokio::spawn(async move {
                    let outcome = tokio::spawn(work).await;
                    registry.lock().await.remove(&key);
                    outcome.unwrap_or_else(|e| {
                        tracing::error!(handle = %key, error = %e, "refresh task failed");
                        Err(RefreshError::Interrupted { handle: key })
                    })
                })
                .map(move |joined| {
                    joined.unwrap_or_else(|_| Err(RefreshError::Interrupted { handle: owned }))
                })
                .boxed()
                .shared();
                map.insert(handle.to_owned(), shared.clone());
                (shared, false)
            }
        };

        if joined {
            tracing::debug!(handle, "joining in-flight refresh");
        }
        (shared.await, joined)
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use chrono::Utc;
    use instalens_core::{AudienceDemographics, EngagementAnalytics, ProfileRecord};

    use super::*;
    use crate::orchestrator::ServeOrigin;

    fn served(handle: &str) -> Served {
        Served {
            record: ProfileRecord {
                handle: handle.to_owned(),
                full_name: "N/A".to_owned(),
                profile_picture_url: None,
                followers: 0,
                following: 0,
                posts_count: 0,
                recent_posts: Vec::new(),
                recent_reels: Vec::new(),
                engagement_analytics: EngagementAnalytics::empty(),
                audience_demographics: AudienceDemographics::default(),
                last_updated: Utc::now(),
            },
            origin: ServeOrigin::Fresh,
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_run() {
        let inflight = InFlight::default();
        let starts = Arc::new(AtomicUsize::new(0));

        let call = |inflight: InFlight, starts: Arc<AtomicUsize>| async move {
            inflight
                .run("alpha", move || {
                    starts.fetch_add(1, Ordering::SeqCst);
                    async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(served("alpha"))
                    }
                })
                .await
        };

        let (a, b) = tokio::join!(
            call(inflight.clone(), Arc::clone(&starts)),
            call(inflight.clone(), Arc::clone(&starts))
        );

        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(a.0.expect("first").record, b.0.expect("second").record);
        assert!(a.1 != b.1, "exactly one caller joins");
        assert_eq!(inflight.len().await, 0, "entry removed after completion");
    }

    #[tokio::test]
    async fn errors_are_shared_and_entry_is_cleared() {
        let inflight = InFlight::default();
        let (result, joined) = inflight
            .run("ghost", || async {
                Err(RefreshError::NotFound {
                    handle: "ghost".to_owned(),
                })
            })
            .await;
        assert!(!joined);
        assert!(matches!(result, Err(RefreshError::NotFound { .. })));
        assert_eq!(inflight.len().await, 0);

        let (again, joined) = inflight
            .run("ghost", || async { Ok(served("ghost")) })
            .await;
        assert!(!joined, "a finished run is not joined");
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn dropped_caller_does_not_cancel_the_run() {
        let inflight = InFlight::default();
        let finished = Arc::new(AtomicUsize::new(0));
        let done = Arc::clone(&finished);

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            inflight.run("alpha", move || async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                done.fetch_add(1, Ordering::SeqCst);
                Ok(served("alpha"))
            }),
        )
        .await;
        assert!(abandoned.is_err(), "caller gave up before the run finished");

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1, "run completed anyway");
        assert_eq!(inflight.len().await, 0, "entry removed after completion");

        let (again, joined) = inflight
            .run("alpha", || async { Ok(served("alpha")) })
            .await;
        assert!(!joined, "a finished run is not joined");
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn panicked_run_is_reported_and_cleared() {
        let inflight = InFlight::default();
        let (result, _) = inflight
            .run("boom", || async {
                let produced: Option<Served> = None;
                Ok(produced.expect("work panics before producing a record"))
            })
            .await;
        assert!(
            matches!(result, Err(RefreshError::Interrupted { ref handle }) if handle == "boom")
        );
        assert_eq!(inflight.len().await, 0, "entry removed after the panic");
    }

    #[tokio::test]
    async fn different_handles_run_independently() {
        let inflight = InFlight::default();
        let starts = Arc::new(AtomicUsize::new(0));
        let s1 = Arc::clone(&starts);
        let s2 = Arc::clone(&starts);
        let (a, b) = tokio::join!(
            inflight.run("a", move || {
                s1.fetch_add(1, Ordering::SeqCst);
                async { Ok(served("a")) }
            }),
            inflight.run("b", move || {
                s2.fetch_add(1, Ordering::SeqCst);
                async { Ok(served("b")) }
            })
        );
        assert_eq!(starts.load(Ordering::SeqCst), 2);
        assert_eq!(a.0.expect("a").record.handle, "a");
        assert_eq!(b.0.expect("b").record.handle, "b");
    }
}
