//! Engagement analytics over a profile's recent posts.

use serde::{Deserialize, Serialize};

use crate::profile::Engagement;

/// Rates strictly above this are [`EngagementLevel::High`].
pub const HIGH_ENGAGEMENT_THRESHOLD: f64 = 5.0;

/// Rates strictly above this (and not high) are [`EngagementLevel::Medium`].
pub const MEDIUM_ENGAGEMENT_THRESHOLD: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngagementLevel {
    High,
    Medium,
    Low,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl EngagementLevel {
    /// Step function over an engagement rate expressed in percent.
    #[must_use]
    pub fn from_rate(rate: f64) -> Self {
        if rate > HIGH_ENGAGEMENT_THRESHOLD {
            Self::High
        } else if rate > MEDIUM_ENGAGEMENT_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementAnalytics {
    pub avg_likes: u64,
    pub avg_comments: u64,
    pub engagement_rate: f64,
    pub engagement_level: EngagementLevel,
}

impl EngagementAnalytics {
    /// Analytics for a profile with no posts.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            avg_likes: 0,
            avg_comments: 0,
            engagement_rate: 0.0,
            engagement_level: EngagementLevel::NotApplicable,
        }
    }
}

/// Compute average likes/comments and the engagement rate for `items`.
///
/// The rate is `(mean likes + mean comments) / followers * 100`, rounded to
/// two decimals, and is `0` when `followers` is zero. The level is derived
/// from the rounded rate so it always agrees with the reported number.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_engagement<T: Engagement>(items: &[T], followers: u64) -> EngagementAnalytics {
    if items.is_empty() {
        return EngagementAnalytics::empty();
    }

    let count = items.len() as f64;
    let total_likes: u64 = items.iter().map(Engagement::likes).sum();
    let total_comments: u64 = items.iter().map(Engagement::comments).sum();
    let mean_likes = total_likes as f64 / count;
    let mean_comments = total_comments as f64 / count;

    let engagement_rate = if followers > 0 {
        round2((mean_likes + mean_comments) / followers as f64 * 100.0)
    } else {
        0.0
    };

    EngagementAnalytics {
        avg_likes: round_to_u64(mean_likes),
        avg_comments: round_to_u64(mean_comments),
        engagement_rate,
        engagement_level: EngagementLevel::from_rate(engagement_rate),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_to_u64(value: f64) -> u64 {
    value.round().max(0.0) as u64
}
