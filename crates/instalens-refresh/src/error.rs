use std::sync::Arc;

use thiserror::Error;

use crate::collaborators::StoreError;

/// Failures that escape the refresh pipeline.
///
/// Cloneable so that every caller coalesced onto one in-flight refresh gets
/// the same outcome.
#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    /// Acquisition failed and nothing is stored for the handle.
    #[error("no data available for {handle}")]
    NotFound { handle: String },

    /// Reading or writing the profile store failed.
    #[error("storage failure while refreshing {handle}: {source}")]
    Storage {
        handle: String,
        #[source]
        source: Arc<StoreError>,
    },

    /// The refresh task panicked or was cancelled before producing a result.
    #[error("refresh of {handle} was interrupted")]
    Interrupted { handle: String },
}

impl RefreshError {
    pub(crate) fn storage(handle: &str, source: StoreError) -> Self {
        Self::Storage {
            handle: handle.to_owned(),
            source: Arc::new(source),
        }
    }

    #[must_use]
    pub fn handle(&self) -> &str {
        match self {
            Self::NotFound { handle }
            | Self::Storage { handle, .. }
            | Self::Interrupted { handle } => handle,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
