//! A process-local [`ProfileStore`], for tests and running without Postgres.

use std::collections::HashMap;

use async_trait::async_trait;
use instalens_core::ProfileRecord;
use tokio::sync::RwLock;

use crate::collaborators::{ProfileStore, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    records: RwLock<HashMap<String, ProfileRecord>>,
}

impl InMemoryProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with `records`, keyed by their handles.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = ProfileRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|r| (r.handle.clone(), r))
            .collect();
        Self {
            records: RwLock::new(map),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get(&self, handle: &str) -> Result<Option<ProfileRecord>, StoreError> {
        Ok(self.records.read().await.get(handle).cloned())
    }

    async fn upsert(&self, record: &ProfileRecord) -> Result<ProfileRecord, StoreError> {
        self.records
            .write()
            .await
            .insert(record.handle.clone(), record.clone());
        Ok(record.clone())
    }

    async fn oldest(&self) -> Result<Option<ProfileRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .min_by(|a, b| {
                a.last_updated
                    .cmp(&b.last_updated)
                    .then_with(|| a.handle.cmp(&b.handle))
            })
            .cloned())
    }
}
