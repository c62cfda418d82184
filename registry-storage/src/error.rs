//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The write was based on a stale revision.
    #[error("revision conflict on {id}")]
    RevisionConflict { id: String },

    /// The connection mutex was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    Lock,

    /// Stored data that does not have the expected shape.
    #[error("invalid data: {0}")]
    InvalidData(String),
}
