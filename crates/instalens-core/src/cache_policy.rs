//! Whether a stored profile may be served without a live refresh.
//!
//! Freshness alone is not enough: a record persisted before any of its media
//! was enriched is refreshed even when young, so an AI-less snapshot does not
//! get served for a whole freshness window.

use chrono::{DateTime, Duration, Utc};

use crate::profile::ProfileRecord;

pub const DEFAULT_FRESHNESS_WINDOW_HOURS: i64 = 24;

/// Why a refresh is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    Forced,
    Missing,
    Stale,
    Unenriched,
}

impl RefreshReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forced => "forced",
            Self::Missing => "missing",
            Self::Stale => "stale",
            Self::Unenriched => "unenriched",
        }
    }
}

impl std::fmt::Display for RefreshReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheDecision<'a> {
    Serve(&'a ProfileRecord),
    Refresh(RefreshReason),
}

impl CacheDecision<'_> {
    #[must_use]
    pub fn is_servable(&self) -> bool {
        matches!(self, Self::Serve(_))
    }
}

/// Decide whether `stored` can be served at `now`.
///
/// Checks run in order: `force`, absence, age beyond `freshness_window`
/// (strictly greater), then enrichment completeness.
#[must_use]
pub fn evaluate(
    stored: Option<&ProfileRecord>,
    now: DateTime<Utc>,
    force: bool,
    freshness_window: Duration,
) -> CacheDecision<'_> {
    if force {
        return CacheDecision::Refresh(RefreshReason::Forced);
    }

    let Some(record) = stored else {
        return CacheDecision::Refresh(RefreshReason::Missing);
    };

    if now.signed_duration_since(record.last_updated) > freshness_window {
        return CacheDecision::Refresh(RefreshReason::Stale);
    }

    if !record.has_any_enrichment() {
        return CacheDecision::Refresh(RefreshReason::Unenriched);
    }

    CacheDecision::Serve(record)
}
