//! The seams between the refresh pipeline and the outside world.
//!
//! Each trait has one production adapter (see [`crate::adapters`]) and is
//! faked in tests. Adapter errors are flattened into the opaque error types
//! below; the pipeline only needs to know that a call failed.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use instalens_core::{
    AudienceDemographics, Enrichable, Enrichment, Post, ProfileRecord, RawProfile, Reel,
};

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

macro_rules! opaque_error {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name {
            message: String,
            source: Option<BoxedSource>,
        }

        impl $name {
            pub fn new(message: impl Into<String>) -> Self {
                Self {
                    message: message.into(),
                    source: None,
                }
            }

            pub fn from_source<E>(source: E) -> Self
            where
                E: std::error::Error + Send + Sync + 'static,
            {
                Self {
                    message: source.to_string(),
                    source: Some(Box::new(source)),
                }
            }

            #[must_use]
            pub fn message(&self) -> &str {
                &self.message
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}: {}", $prefix, self.message)
            }
        }

        impl std::error::Error for $name {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                self.source
                    .as_deref()
                    .map(|e| e as &(dyn std::error::Error + 'static))
            }
        }
    };
}

opaque_error!(
    /// Raw data acquisition failed.
    AcquireError,
    "acquisition failed"
);
opaque_error!(
    /// An enrichment or demographics call failed.
    EnrichError,
    "enrichment failed"
);
opaque_error!(
    /// The profile store could not be read or written.
    StoreError,
    "profile store error"
);

/// Fetches the raw profile and recent media for a handle.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn acquire(&self, handle: &str) -> Result<RawProfile, AcquireError>;
}

/// Annotates a single image.
#[async_trait]
pub trait MediaEnricher: Send + Sync {
    async fn enrich(&self, media_url: &str) -> Result<Enrichment, EnrichError>;
}

/// Guesses audience composition from an enriched profile.
#[async_trait]
pub trait DemographicsInferrer: Send + Sync {
    async fn infer(
        &self,
        profile: &ProfileSnapshot<'_>,
    ) -> Result<AudienceDemographics, EnrichError>;
}

/// Document store of [`ProfileRecord`]s keyed by exact handle.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, handle: &str) -> Result<Option<ProfileRecord>, StoreError>;

    /// Insert or fully replace the record for `record.handle`, returning it as
    /// persisted.
    async fn upsert(&self, record: &ProfileRecord) -> Result<ProfileRecord, StoreError>;

    /// The record with the oldest `last_updated`, if the store is non-empty.
    async fn oldest(&self) -> Result<Option<ProfileRecord>, StoreError>;

    async fn health(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// The full set of collaborators a [`crate::Refresher`] drives.
#[derive(Clone)]
pub struct Collaborators {
    pub source: Arc<dyn ProfileSource>,
    pub enricher: Arc<dyn MediaEnricher>,
    pub demographics: Arc<dyn DemographicsInferrer>,
    pub store: Arc<dyn ProfileStore>,
}

/// A freshly acquired and enriched profile, as shown to demographics inference.
#[derive(Debug, Clone, Copy)]
pub struct ProfileSnapshot<'a> {
    pub handle: &'a str,
    pub full_name: &'a str,
    pub followers: u64,
    pub posts_count: u64,
    pub posts: &'a [Post],
    pub reels: &'a [Reel],
}

impl<'a> ProfileSnapshot<'a> {
    /// Non-empty post captions, newest first.
    #[must_use]
    pub fn captions(&self) -> Vec<&'a str> {
        self.posts
            .iter()
            .filter_map(|p| p.caption.as_deref())
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Tags across all enriched posts, deduplicated in first-seen order.
    #[must_use]
    pub fn post_tags(&self) -> Vec<&'a str> {
        let mut tags: Vec<&'a str> = Vec::new();
        for tag in self
            .posts
            .iter()
            .filter_map(Enrichable::enrichment)
            .flat_map(|e| e.tags.iter())
        {
            if !tags.contains(&tag.as_str()) {
                tags.push(tag.as_str());
            }
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use instalens_core::Quality;

    use super::*;

    fn post(id: &str, caption: Option<&str>, tags: Option<&[&str]>) -> Post {
        Post {
            id: id.to_owned(),
            image_url: None,
            likes: 0,
            comments: 0,
            caption: caption.map(str::to_owned),
            post_url: None,
            enrichment: tags.map(|t| Enrichment {
                tags: t.iter().map(|s| (*s).to_owned()).collect::<BTreeSet<_>>(),
                vibe: "calm".to_owned(),
                quality: Quality::Label("Good".to_owned()),
            }),
        }
    }

    #[test]
    fn snapshot_collects_captions_and_unique_tags() {
        let posts = vec![
            post("1", Some("beach"), Some(&["travel", "nature"])),
            post("2", None, Some(&["travel", "food"])),
            post("3", Some(""), None),
        ];
        let snapshot = ProfileSnapshot {
            handle: "alpha",
            full_name: "Alpha",
            followers: 10,
            posts_count: 3,
            posts: &posts,
            reels: &[],
        };
        assert_eq!(snapshot.captions(), vec!["beach"]);
        assert_eq!(snapshot.post_tags(), vec!["nature", "travel", "food"]);
    }

    #[test]
    fn opaque_errors_keep_source_message() {
        let io = std::io::Error::other("disk gone");
        let err = StoreError::from_source(io);
        assert_eq!(err.message(), "disk gone");
        assert_eq!(err.to_string(), "profile store error: disk gone");
        assert!(std::error::Error::source(&err).is_some());
    }
}
