//! Error types for the mirror.

use thiserror::Error;

/// Main error type for mirror operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Remote database is closed")]
    DatabaseClosed,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Serialization(e.to_string())
    }
}

/// Result type for mirror operations.
pub type Result<T> = std::result::Result<T, SyncError>;
