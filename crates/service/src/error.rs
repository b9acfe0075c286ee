//! Typed error enum for the service layer.
//!
//! Business-rule failures (validation, quota) are explicit variants so the
//! HTTP boundary can render their specific shapes; everything else is an
//! internal failure.

use keendreams_storage::StorageError;
use thiserror::Error;

use crate::stats_service::QuotaStatus;

/// Service-layer error unifying storage failures and business-rule rejections.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage operation failed (backend, corrupt record, not found).
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Payload failed validation; carries every issue found.
    #[error("invalid dream: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// Estimated usage is at or above the write threshold.
    #[error("storage quota exceeded: {} of {}", .0.usage, .0.limit)]
    QuotaExceeded(QuotaStatus),

    /// Caller provided invalid input (empty query, malformed parameter).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization failed in the service layer.
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServiceError {
    /// Whether this error is likely transient (worth retrying).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            _ => false,
        }
    }
}
