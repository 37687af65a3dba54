//! Error types for campus domain operations.

use crate::ids::IdError;

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    /// The offending field name.
    pub field: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors that can occur in campus domain operations.
///
/// The five kinds map one-to-one onto boundary outcomes: validation and
/// conflict are caller mistakes, not-found is a scoping miss, gateway
/// failures carry the processor's message unchanged, and configuration
/// faults are logged and absorbed before they reach a caller.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// One or more entity invariants were violated.
    #[error("validation failed: {}", format_fields(.0))]
    Validation(Vec<FieldError>),

    /// A referenced entity is absent or outside the tenant's scope.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. "tenant" or "subscription".
        entity: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// The request is well-formed but the current state forbids it.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An external payment-gateway call failed.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Billing configuration resource missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}

impl DomainError {
    /// Shorthand for a single-field validation error.
    #[must_use]
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }
}

fn format_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_fields() {
        let err = DomainError::Validation(vec![
            FieldError::new("name", "must not be empty"),
            FieldError::new("monthly_price_cents", "must be >= 0"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("name: must not be empty"));
        assert!(msg.contains("monthly_price_cents"));
    }

    #[test]
    fn not_found_names_entity() {
        let err = DomainError::NotFound {
            entity: "tenant",
            id: "abc".into(),
        };
        assert_eq!(err.to_string(), "tenant not found: abc");
    }
}
