//! Error types for campus storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found (or outside the tenant's scope).
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind.
        entity: &'static str,
        /// Looked-up identifier.
        id: String,
    },

    /// A uniqueness or state invariant would be violated.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl StoreError {
    /// Shorthand for a not-found error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
