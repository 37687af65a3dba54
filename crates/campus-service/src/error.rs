//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use campus_core::{DomainError, FieldError};

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden - valid credentials but insufficient permissions.
    #[error("forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - malformed input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Validation failed with field-level details.
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// Conflict - resource already exists or invalid state transition.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Payment gateway call failed.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_failed",
                "One or more fields are invalid".to_string(),
                Some(serde_json::json!({ "fields": errors })),
            ),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::Gateway(msg) => (StatusCode::BAD_GATEWAY, "gateway_error", msg.clone(), None),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<campus_store::StoreError> for ApiError {
    fn from(err: campus_store::StoreError) -> Self {
        match err {
            campus_store::StoreError::NotFound { entity, id } => {
                Self::NotFound(format!("{entity} not found: {id}"))
            }
            campus_store::StoreError::Conflict(msg) => Self::Conflict(msg),
            campus_store::StoreError::Database(msg)
            | campus_store::StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(errors) => Self::Validation(errors),
            DomainError::NotFound { entity, id } => {
                Self::NotFound(format!("{entity} not found: {id}"))
            }
            DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::Gateway(msg) => Self::Gateway(msg),
            // Configuration faults are absorbed by the fallback catalog;
            // reaching here means a bug, not a caller mistake.
            DomainError::Configuration(msg) => Self::Internal(msg),
            DomainError::InvalidId(e) => Self::BadRequest(e.to_string()),
        }
    }
}

impl From<campus_core::IdError> for ApiError {
    fn from(err: campus_core::IdError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<campus_gateway::GatewayError> for ApiError {
    fn from(err: campus_gateway::GatewayError) -> Self {
        Self::Gateway(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflict_maps_to_conflict() {
        let err = ApiError::from(campus_store::StoreError::Conflict("slug taken".into()));
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn domain_validation_keeps_field_details() {
        let err = ApiError::from(DomainError::invalid("slug", "reserved"));
        match err {
            ApiError::Validation(fields) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "slug");
            }
            other => panic!("expected validation, got {other:?}"),
        }
    }

    #[test]
    fn gateway_error_maps_to_gateway() {
        let err = ApiError::from(campus_gateway::GatewayError::Api {
            error_type: "card_error".into(),
            message: "declined".into(),
            code: None,
        });
        assert!(matches!(err, ApiError::Gateway(_)));
    }
}
