//! GET /api/v1/influencer/{username}: the profile record, refreshed on demand.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use instalens_refresh::RefreshError;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, AppState};

/// Response header reporting whether the body came from the cache, a fresh
/// refresh, or a stale fallback.
pub(super) const ORIGIN_HEADER: &str = "x-instalens-origin";

#[derive(Debug, Deserialize)]
pub(super) struct InfluencerQuery {
    #[serde(default)]
    pub force: bool,
}

pub(super) async fn get_influencer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(username): Path<String>,
    Query(query): Query<InfluencerQuery>,
) -> Result<Response, ApiError> {
    let served = state
        .refresher
        .get_profile_detailed(&username, query.force)
        .await
        .map_err(|e| map_refresh_error(req_id.0, &e))?;

    Ok((
        [(ORIGIN_HEADER, served.origin.as_str())],
        Json(served.record),
    )
        .into_response())
}

fn map_refresh_error(request_id: String, error: &RefreshError) -> ApiError {
    match error {
        RefreshError::NotFound { .. } => ApiError::new(request_id, "not_found", error.to_string()),
        RefreshError::Storage { handle, .. } => {
            tracing::error!(handle = %handle, error = %error, "profile storage failed");
            ApiError::new(request_id, "internal_error", "failed to load profile")
        }
        RefreshError::Interrupted { handle } => {
            tracing::error!(handle = %handle, "profile refresh interrupted");
            ApiError::new(request_id, "internal_error", "failed to load profile")
        }
    }
}
