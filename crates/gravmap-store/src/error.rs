//! Error types for gravmap storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Record not found.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// The entity kind that was looked up.
        entity: &'static str,
        /// The key that did not resolve.
        key: String,
    },

    /// Unique-key violation.
    #[error("{entity} already exists: {key}")]
    Conflict {
        /// The entity kind that collided.
        entity: &'static str,
        /// The conflicting key.
        key: String,
    },
}
