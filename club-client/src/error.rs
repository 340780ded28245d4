//! Client error types

use shared::DomainError;
use thiserror::Error;

use crate::store::StorageError;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Admin credential missing or wrong
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found (server side)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error (server side or local input)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Capacity or uniqueness conflict reported by the server
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rejected by the local document rules
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Server failure (5xx)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Durable store failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Member action without a signed-in session
    #[error("Not signed in")]
    NotSignedIn,

    /// Device reported offline, nothing was sent
    #[error("Offline")]
    Offline,
}

impl ClientError {
    /// Transient failure: the request may succeed later unchanged
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Internal(_) | Self::Offline)
    }

    /// Definitive refusal of a mutation by the server
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Conflict(_) | Self::NotFound(_) | Self::Validation(_)
        )
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
