//! Domain model and pure policy for instalens.
//!
//! Holds the persisted profile record, the engagement analytics calculator,
//! the cache servability policy, and environment-driven application config.
//! Nothing in this crate performs I/O beyond reading env vars.

pub mod analytics;
pub mod app_config;
pub mod cache_policy;
pub mod config;
pub mod profile;

use thiserror::Error;

pub use analytics::{calculate_engagement, EngagementAnalytics, EngagementLevel};
pub use app_config::{AppConfig, Environment};
pub use cache_policy::{evaluate, CacheDecision, RefreshReason, DEFAULT_FRESHNESS_WINDOW_HOURS};
pub use config::{load_app_config, load_app_config_from_env};
pub use profile::{
    AudienceDemographics, Engagement, Enrichable, Enrichment, Post, ProfileRecord, Quality,
    QualityBreakdown, RawProfile, Reel, Share, MAX_RECENT_POSTS, MAX_RECENT_REELS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
