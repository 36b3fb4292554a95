//! The refresh orchestrator.
//!
//! `CheckCache -> Served | Acquire`, then either
//! `Enrich -> Analyze -> Persist -> Served` or, when acquisition fails,
//! `ServeStale | NotFound`. A failed or fallback refresh never writes.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use instalens_core::{
    calculate_engagement, evaluate, AppConfig, AudienceDemographics, CacheDecision,
    ProfileRecord, RawProfile, RefreshReason, DEFAULT_FRESHNESS_WINDOW_HOURS, MAX_RECENT_POSTS,
    MAX_RECENT_REELS,
};

use crate::collaborators::{Collaborators, ProfileSnapshot, ProfileStore};
use crate::enrich::enrich_items;
use crate::error::RefreshError;
use crate::inflight::InFlight;

/// Placeholder stored when the source has no display name.
const UNKNOWN_FULL_NAME: &str = "N/A";

/// How the returned record was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeOrigin {
    /// Served from the store without acquisition.
    Cache,
    /// Produced by a successful refresh in this call (or a coalesced one).
    Fresh,
    /// Acquisition failed; the last stored record was returned unchanged.
    Stale,
}

impl ServeOrigin {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Fresh => "fresh",
            Self::Stale => "stale",
        }
    }
}

impl std::fmt::Display for ServeOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Served {
    pub record: ProfileRecord,
    pub origin: ServeOrigin,
}

#[derive(Debug, Clone, Copy)]
pub struct RefreshSettings {
    /// A stored record older than this is refreshed before serving.
    pub freshness_window: Duration,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            freshness_window: Duration::hours(DEFAULT_FRESHNESS_WINDOW_HOURS),
        }
    }
}

impl RefreshSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            freshness_window: config.freshness_window(),
        }
    }
}

struct RefresherInner {
    collaborators: Collaborators,
    settings: RefreshSettings,
    inflight: InFlight,
}

/// Entry point of the pipeline, shared by the HTTP API, the CLI and the sweep.
///
/// Cheap to clone; clones share collaborators and the in-flight map.
#[derive(Clone)]
pub struct Refresher {
    inner: Arc<RefresherInner>,
}

impl Refresher {
    #[must_use]
    pub fn new(collaborators: Collaborators, settings: RefreshSettings) -> Self {
        Self {
            inner: Arc::new(RefresherInner {
                collaborators,
                settings,
                inflight: InFlight::default(),
            }),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn ProfileStore> {
        &self.inner.collaborators.store
    }

    #[must_use]
    pub fn settings(&self) -> RefreshSettings {
        self.inner.settings
    }

    /// Return the profile for `handle`, refreshing it first when the stored
    /// record is missing, stale, unenriched, or `force` is set.
    ///
    /// # Errors
    ///
    /// - [`RefreshError::NotFound`] when acquisition fails and nothing is
    ///   stored for the handle.
    /// - [`RefreshError::Storage`] when the store cannot be read or written.
    pub async fn get_profile(
        &self,
        handle: &str,
        force: bool,
    ) -> Result<ProfileRecord, RefreshError> {
        self.get_profile_detailed(handle, force)
            .await
            .map(|served| served.record)
    }

    /// Like [`Refresher::get_profile`], also reporting whether the record came
    /// from the cache, a fresh refresh, or a stale fallback.
    ///
    /// # Errors
    ///
    /// See [`Refresher::get_profile`].
    pub async fn get_profile_detailed(
        &self,
        handle: &str,
        force: bool,
    ) -> Result<Served, RefreshError> {
        let stored = self
            .store()
            .get(handle)
            .await
            .map_err(|e| RefreshError::storage(handle, e))?;

        let reason = match evaluate(
            stored.as_ref(),
            Utc::now(),
            force,
            self.inner.settings.freshness_window,
        ) {
            CacheDecision::Serve(record) => {
                tracing::debug!(handle, "serving cached profile");
                return Ok(Served {
                    record: record.clone(),
                    origin: ServeOrigin::Cache,
                });
            }
            CacheDecision::Refresh(reason) => reason,
        };

        let previous_updated = stored.map(|r| r.last_updated);
        let this = self.clone();
        let owned_handle = handle.to_owned();
        let (result, joined) = self
            .inner
            .inflight
            .run(handle, move || async move {
                this.refresh(&owned_handle, reason, previous_updated).await
            })
            .await;

        if joined {
            tracing::debug!(handle, %reason, "coalesced onto in-flight refresh");
        }
        result
    }

    async fn refresh(
        &self,
        handle: &str,
        reason: RefreshReason,
        previous_updated: Option<DateTime<Utc>>,
    ) -> Result<Served, RefreshError> {
        tracing::info!(handle, %reason, "refreshing profile");
        let collaborators = &self.inner.collaborators;

        let raw = match collaborators.source.acquire(handle).await {
            Ok(raw) if raw.has_media() => raw,
            Ok(_) => {
                tracing::warn!(handle, "acquisition returned no posts or reels");
                return self.serve_stale(handle).await;
            }
            Err(e) => {
                tracing::warn!(handle, error = %e, "acquisition failed");
                return self.serve_stale(handle).await;
            }
        };

        let record = self.build_record(handle, raw, previous_updated).await;

        let persisted = collaborators
            .store
            .upsert(&record)
            .await
            .map_err(|e| {
                tracing::error!(handle, error = %e, "failed to persist refreshed profile");
                RefreshError::storage(handle, e)
            })?;

        tracing::info!(
            handle,
            posts = persisted.recent_posts.len(),
            reels = persisted.recent_reels.len(),
            engagement_rate = persisted.engagement_analytics.engagement_rate,
            "profile refreshed"
        );
        Ok(Served {
            record: persisted,
            origin: ServeOrigin::Fresh,
        })
    }

    /// Enrich, analyze and infer demographics for a successful acquisition.
    async fn build_record(
        &self,
        handle: &str,
        raw: RawProfile,
        previous_updated: Option<DateTime<Utc>>,
    ) -> ProfileRecord {
        let collaborators = &self.inner.collaborators;
        let RawProfile {
            full_name,
            profile_picture_url,
            followers,
            following,
            posts_count,
            mut posts,
            mut reels,
            ..
        } = raw;
        posts.truncate(MAX_RECENT_POSTS);
        reels.truncate(MAX_RECENT_REELS);

        let enricher = collaborators.enricher.as_ref();
        let ((posts, post_summary), (reels, reel_summary)) = tokio::join!(
            enrich_items(enricher, posts),
            enrich_items(enricher, reels)
        );
        tracing::debug!(
            handle,
            posts_enriched = post_summary.enriched,
            posts_failed = post_summary.failed,
            posts_skipped = post_summary.skipped,
            reels_enriched = reel_summary.enriched,
            reels_failed = reel_summary.failed,
            reels_skipped = reel_summary.skipped,
            "media enrichment finished"
        );

        let engagement_analytics = calculate_engagement(&posts, followers);
        let full_name = full_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_FULL_NAME.to_owned());

        let snapshot = ProfileSnapshot {
            handle,
            full_name: &full_name,
            followers,
            posts_count,
            posts: &posts,
            reels: &reels,
        };
        let audience_demographics = match collaborators.demographics.infer(&snapshot).await {
            Ok(demographics) => demographics,
            Err(e) => {
                tracing::warn!(
                    handle,
                    error = %e,
                    "demographics inference failed; storing empty breakdown"
                );
                AudienceDemographics::default()
            }
        };

        let now = Utc::now();
        let last_updated = previous_updated.map_or(now, |prev| prev.max(now));

        ProfileRecord {
            handle: handle.to_owned(),
            full_name,
            profile_picture_url,
            followers,
            following,
            posts_count,
            recent_posts: posts,
            recent_reels: reels,
            engagement_analytics,
            audience_demographics,
            last_updated,
        }
    }

    async fn serve_stale(&self, handle: &str) -> Result<Served, RefreshError> {
        let stored = self
            .store()
            .get(handle)
            .await
            .map_err(|e| RefreshError::storage(handle, e))?;

        match stored {
            Some(record) => {
                tracing::warn!(
                    handle,
                    last_updated = %record.last_updated,
                    "serving stale profile after acquisition failure"
                );
                Ok(Served {
                    record,
                    origin: ServeOrigin::Stale,
                })
            }
            None => Err(RefreshError::NotFound {
                handle: handle.to_owned(),
            }),
        }
    }
}
