//! Error types for store operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Access rules rejected the read or write.
    #[error("permission denied: {path}")]
    PermissionDenied { path: String },

    /// Update of a document that does not exist.
    #[error("document not found: {path}")]
    NotFound { path: String },

    /// Create of a document id that is already taken.
    #[error("document already exists: {path}")]
    AlreadyExists { path: String },

    /// Payload is not a JSON object, or a field cannot be encoded.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Network or transport-level HTTP error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote service returned an unexpected status.
    #[error("store error: {status} - {message}")]
    Remote { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Listener could not be started.
    #[error("no async runtime available for listener")]
    NoRuntime,
}

impl StoreError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
