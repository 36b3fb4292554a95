//! The persisted profile record and the media items it carries.
//!
//! Field names serialize in camelCase, and a post's enrichment is flattened
//! into the post object (`tags`, `vibe`, `quality`) so an unenriched post
//! simply lacks those keys.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::EngagementAnalytics;

/// Upper bound on posts kept per profile.
pub const MAX_RECENT_POSTS: usize = 10;

/// Upper bound on reels kept per profile.
pub const MAX_RECENT_REELS: usize = 5;

/// AI-derived annotation of a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub tags: BTreeSet<String>,
    pub vibe: String,
    pub quality: Quality,
}

/// Image quality, either broken down by aspect or as a single label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quality {
    Breakdown(QualityBreakdown),
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityBreakdown {
    pub lighting: String,
    pub visual_appeal: String,
    pub consistency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    pub caption: Option<String>,
    pub post_url: Option<String>,
    #[serde(flatten)]
    pub enrichment: Option<Enrichment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reel {
    pub id: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub views: u64,
    pub caption: Option<String>,
    pub post_url: Option<String>,
    #[serde(flatten)]
    pub enrichment: Option<Enrichment>,
}

/// Like and comment counts of a media item.
pub trait Engagement {
    fn likes(&self) -> u64;
    fn comments(&self) -> u64;
}

/// A media item that can carry an [`Enrichment`].
pub trait Enrichable {
    fn id(&self) -> &str;
    fn media_url(&self) -> Option<&str>;
    fn enrichment(&self) -> Option<&Enrichment>;
    fn set_enrichment(&mut self, enrichment: Enrichment);

    fn is_enriched(&self) -> bool {
        self.enrichment().is_some()
    }
}

macro_rules! impl_media_item {
    ($($ty:ty),+) => {$(
        impl Engagement for $ty {
            fn likes(&self) -> u64 {
                self.likes
            }

            fn comments(&self) -> u64 {
                self.comments
            }
        }

        impl Enrichable for $ty {
            fn id(&self) -> &str {
                &self.id
            }

            fn media_url(&self) -> Option<&str> {
                self.image_url.as_deref().filter(|url| !url.is_empty())
            }

            fn enrichment(&self) -> Option<&Enrichment> {
                self.enrichment.as_ref()
            }

            fn set_enrichment(&mut self, enrichment: Enrichment) {
                self.enrichment = Some(enrichment);
            }
        }
    )+};
}

impl_media_item!(Post, Reel);

/// One named slice of an audience breakdown, as a percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub name: String,
    pub value: f64,
}

/// Inferred audience composition. The default value is the empty breakdown
/// used whenever inference is unavailable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudienceDemographics {
    #[serde(default)]
    pub gender_split: Vec<Share>,
    #[serde(default)]
    pub age_groups: Vec<Share>,
    #[serde(default)]
    pub top_geographies: Vec<Share>,
}

impl AudienceDemographics {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gender_split.is_empty() && self.age_groups.is_empty() && self.top_geographies.is_empty()
    }
}

/// A profile as returned by the acquisition source, before enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProfile {
    pub handle: String,
    pub full_name: Option<String>,
    pub profile_picture_url: Option<String>,
    pub followers: u64,
    pub following: u64,
    pub posts_count: u64,
    pub posts: Vec<Post>,
    pub reels: Vec<Reel>,
}

impl RawProfile {
    /// Acquisition is only usable when it yielded at least one post or reel.
    #[must_use]
    pub fn has_media(&self) -> bool {
        !self.posts.is_empty() || !self.reels.is_empty()
    }
}

/// The persisted snapshot of one profile, keyed by `handle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    #[serde(rename = "username")]
    pub handle: String,
    pub full_name: String,
    pub profile_picture_url: Option<String>,
    pub followers: u64,
    pub following: u64,
    pub posts_count: u64,
    pub recent_posts: Vec<Post>,
    pub recent_reels: Vec<Reel>,
    pub engagement_analytics: EngagementAnalytics,
    #[serde(default)]
    pub audience_demographics: AudienceDemographics,
    pub last_updated: DateTime<Utc>,
}

impl ProfileRecord {
    /// True when at least one post or reel carries an enrichment.
    #[must_use]
    pub fn has_any_enrichment(&self) -> bool {
        self.recent_posts.iter().any(Enrichable::is_enriched)
            || self.recent_reels.iter().any(Enrichable::is_enriched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::calculate_engagement;

    fn post(id: &str, enrichment: Option<Enrichment>) -> Post {
        Post {
            id: id.to_string(),
            image_url: Some(format!("https://cdn.example.com/{id}.jpg")),
            likes: 10,
            comments: 2,
            caption: Some("sunset".to_string()),
            post_url: Some(format!("https://www.instagram.com/p/{id}/")),
            enrichment,
        }
    }

    fn enrichment() -> Enrichment {
        Enrichment {
            tags: ["travel", "nature"].iter().map(ToString::to_string).collect(),
            vibe: "calm".to_string(),
            quality: Quality::Breakdown(QualityBreakdown {
                lighting: "Natural".to_string(),
                visual_appeal: "High".to_string(),
                consistency: "Consistent".to_string(),
            }),
        }
    }

    fn record(posts: Vec<Post>) -> ProfileRecord {
        ProfileRecord {
            handle: "alpha".to_string(),
            full_name: "Alpha".to_string(),
            profile_picture_url: None,
            followers: 100,
            following: 5,
            posts_count: 3,
            engagement_analytics: calculate_engagement(&posts, 100),
            recent_posts: posts,
            recent_reels: Vec::new(),
            audience_demographics: AudienceDemographics::default(),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn enrichment_is_flattened_into_post_json() {
        let json = serde_json::to_value(post("p1", Some(enrichment()))).expect("serialize");
        assert_eq!(json["vibe"], "calm");
        assert_eq!(json["quality"]["visualAppeal"], "High");
        assert_eq!(json["imageUrl"], "https://cdn.example.com/p1.jpg");
        assert!(json.get("enrichment").is_none());
    }

    #[test]
    fn unenriched_post_omits_enrichment_keys() {
        let json = serde_json::to_value(post("p1", None)).expect("serialize");
        assert!(json.get("tags").is_none());
        assert!(json.get("vibe").is_none());

        let back: Post = serde_json::from_value(json).expect("deserialize");
        assert!(back.enrichment.is_none());
    }

    #[test]
    fn scalar_quality_deserializes_as_label() {
        let json = serde_json::json!({
            "id": "p9",
            "imageUrl": null,
            "caption": null,
            "postUrl": null,
            "tags": ["food"],
            "vibe": "happy",
            "quality": "High"
        });
        let parsed: Post = serde_json::from_value(json).expect("deserialize");
        let enrichment = parsed.enrichment.expect("enrichment present");
        assert_eq!(enrichment.quality, Quality::Label("High".to_string()));
        assert_eq!(parsed.likes, 0, "missing counts default to zero");
    }

    #[test]
    fn record_serializes_handle_as_username() {
        let json = serde_json::to_value(record(vec![post("p1", None)])).expect("serialize");
        assert_eq!(json["username"], "alpha");
        assert!(json["audienceDemographics"]["genderSplit"].is_array());
        assert_eq!(json["engagementAnalytics"]["engagementLevel"], "High");
    }

    #[test]
    fn has_any_enrichment_checks_posts_and_reels() {
        let mut rec = record(vec![post("p1", None), post("p2", None)]);
        assert!(!rec.has_any_enrichment());

        rec.recent_reels.push(Reel {
            id: "r1".to_string(),
            image_url: None,
            likes: 0,
            comments: 0,
            views: 40,
            caption: None,
            post_url: None,
            enrichment: Some(enrichment()),
        });
        assert!(rec.has_any_enrichment());
    }

    #[test]
    fn empty_image_url_is_not_a_media_reference() {
        let mut p = post("p1", None);
        p.image_url = Some(String::new());
        assert!(p.media_url().is_none());
    }
}
