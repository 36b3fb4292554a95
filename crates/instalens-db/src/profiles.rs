//! Database operations for the `profiles` document table.
//!
//! Each row holds one [`ProfileRecord`] as JSONB, keyed by its exact
//! (case-sensitive) handle. Writes replace the whole document.

use instalens_core::ProfileRecord;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
struct ProfileDocumentRow {
    handle: String,
    document: serde_json::Value,
}

impl ProfileDocumentRow {
    fn into_record(self) -> Result<ProfileRecord, DbError> {
        serde_json::from_value(self.document).map_err(|source| DbError::Document {
            handle: self.handle,
            source,
        })
    }
}

/// Get the stored profile for `handle`, if any.
///
/// # Errors
///
/// Returns [`DbError`] on query failure or when the stored document does not
/// deserialize.
pub async fn get_profile(pool: &PgPool, handle: &str) -> Result<Option<ProfileRecord>, DbError> {
    sqlx::query_as::<_, ProfileDocumentRow>(
        "SELECT handle, document FROM profiles WHERE handle = $1",
    )
    .bind(handle)
    .fetch_optional(pool)
    .await?
    .map(ProfileDocumentRow::into_record)
    .transpose()
}

/// Insert or fully replace the profile document for `record.handle`.
///
/// Returns the record as persisted.
///
/// # Errors
///
/// Returns [`DbError`] on serialization or query failure.
pub async fn upsert_profile(pool: &PgPool, record: &ProfileRecord) -> Result<ProfileRecord, DbError> {
    let document = serde_json::to_value(record).map_err(|source| DbError::Document {
        handle: record.handle.clone(),
        source,
    })?;

    sqlx::query_as::<_, ProfileDocumentRow>(
        "INSERT INTO profiles (handle, document, last_updated) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (handle) DO UPDATE SET \
           document     = EXCLUDED.document, \
           last_updated = EXCLUDED.last_updated, \
           updated_at   = NOW() \
         RETURNING handle, document",
    )
    .bind(&record.handle)
    .bind(document)
    .bind(record.last_updated)
    .fetch_one(pool)
    .await?
    .into_record()
}

/// Get the profile with the oldest `last_updated`, ties broken by handle.
///
/// # Errors
///
/// Returns [`DbError`] on query failure or a malformed document.
pub async fn oldest_profile(pool: &PgPool) -> Result<Option<ProfileRecord>, DbError> {
    sqlx::query_as::<_, ProfileDocumentRow>(
        "SELECT handle, document FROM profiles ORDER BY last_updated ASC, handle ASC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?
    .map(ProfileDocumentRow::into_record)
    .transpose()
}
