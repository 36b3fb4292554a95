//! Production implementations of the collaborator traits.

use std::sync::Arc;

use async_trait::async_trait;
use instalens_core::{AppConfig, AudienceDemographics, Enrichment, ProfileRecord, RawProfile};
use instalens_gemini::{AudienceSignals, GeminiClient, GeminiClientConfig, GeminiError};
use instalens_scraper::{InstagramClient, InstagramClientConfig, ScraperError};
use sqlx::PgPool;
use thiserror::Error;

use crate::collaborators::{
    AcquireError, Collaborators, DemographicsInferrer, EnrichError, MediaEnricher, ProfileSnapshot,
    ProfileSource, ProfileStore, StoreError,
};
use crate::orchestrator::{RefreshSettings, Refresher};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to build instagram client: {0}")]
    Scraper(#[from] ScraperError),

    #[error("failed to build gemini client: {0}")]
    Gemini(#[from] GeminiError),
}

#[async_trait]
impl ProfileSource for InstagramClient {
    async fn acquire(&self, handle: &str) -> Result<RawProfile, AcquireError> {
        self.fetch_profile(handle)
            .await
            .map_err(AcquireError::from_source)
    }
}

#[async_trait]
impl MediaEnricher for GeminiClient {
    async fn enrich(&self, media_url: &str) -> Result<Enrichment, EnrichError> {
        self.analyze_image(media_url)
            .await
            .map_err(EnrichError::from_source)
    }
}

#[async_trait]
impl DemographicsInferrer for GeminiClient {
    async fn infer(
        &self,
        profile: &ProfileSnapshot<'_>,
    ) -> Result<AudienceDemographics, EnrichError> {
        let signals = AudienceSignals {
            username: profile.handle,
            full_name: profile.full_name,
            followers: profile.followers,
            posts_count: profile.posts_count,
            captions: profile.captions(),
            tags: profile.post_tags(),
        };
        self.infer_demographics(&signals)
            .await
            .map_err(EnrichError::from_source)
    }
}

/// [`ProfileStore`] over the Postgres `profiles` document table.
#[derive(Debug, Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get(&self, handle: &str) -> Result<Option<ProfileRecord>, StoreError> {
        instalens_db::get_profile(&self.pool, handle)
            .await
            .map_err(StoreError::from_source)
    }

    async fn upsert(&self, record: &ProfileRecord) -> Result<ProfileRecord, StoreError> {
        instalens_db::upsert_profile(&self.pool, record)
            .await
            .map_err(StoreError::from_source)
    }

    async fn oldest(&self) -> Result<Option<ProfileRecord>, StoreError> {
        instalens_db::oldest_profile(&self.pool)
            .await
            .map_err(StoreError::from_source)
    }

    async fn health(&self) -> Result<(), StoreError> {
        instalens_db::health_check(&self.pool)
            .await
            .map_err(StoreError::from_source)
    }
}

/// Wire the Instagram, Gemini and Postgres adapters into a [`Refresher`].
///
/// A missing `GEMINI_API_KEY` is not an error here: enrichment and
/// demographics calls fail individually and the pipeline degrades.
///
/// # Errors
///
/// Returns [`BuildError`] if an HTTP client cannot be constructed.
pub fn build_refresher(config: &AppConfig, pool: PgPool) -> Result<Refresher, BuildError> {
    let instagram = InstagramClient::new(
        &InstagramClientConfig::from_app_config(config),
        config.scraper_cookies_path.clone(),
    )?;
    let gemini = Arc::new(GeminiClient::new(&GeminiClientConfig::from_app_config(
        config,
    ))?);
    if !gemini.has_api_key() {
        tracing::warn!("GEMINI_API_KEY not set; media enrichment and demographics are unavailable");
    }

    let collaborators = Collaborators {
        source: Arc::new(instagram),
        enricher: Arc::clone(&gemini) as Arc<dyn MediaEnricher>,
        demographics: gemini,
        store: Arc::new(PgProfileStore::new(pool)),
    };
    Ok(Refresher::new(
        collaborators,
        RefreshSettings::from_app_config(config),
    ))
}
