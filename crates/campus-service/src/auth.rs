//! Authentication extractors.
//!
//! Requests carry an HS256 JWT in the `Authorization: Bearer` header. The
//! claims name the user (`sub`), optionally the tenant (`tid`), and the
//! caller's role. Tenant registration is the only operation that accepts a
//! token without a tenant claim.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use campus_core::{TenantId, UserId};

use crate::error::ApiError;
use crate::state::AppState;

/// Caller role within a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can manage content, tiers, and billing.
    Admin,

    /// Can read content and write their own progress.
    Member,
}

/// An authenticated caller extracted from a JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user ID.
    pub user_id: UserId,

    /// The tenant the token is scoped to, absent during registration.
    pub tenant_id: Option<TenantId>,

    /// The caller's role.
    pub role: Role,
}

impl AuthUser {
    /// The tenant claim, or `Forbidden` when the token carries none.
    pub fn tenant(&self) -> Result<TenantId, ApiError> {
        self.tenant_id.ok_or(ApiError::Forbidden)
    }

    /// Require the admin role.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Tenant ID the token is scoped to.
    #[serde(default)]
    pub tid: Option<String>,
    /// Caller role (defaults to member).
    #[serde(default)]
    pub role: Option<Role>,
    /// Issuer.
    pub iss: String,
    /// Expiration time.
    pub exp: i64,
    /// Issued at.
    pub iat: i64,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            // Extract the Authorization header
            let auth_header = parts
                .headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .ok_or(ApiError::Unauthorized)?;

            // Extract the Bearer token
            let token = auth_header
                .strip_prefix("Bearer ")
                .ok_or(ApiError::Unauthorized)?;

            // Allow test tokens in testing only.
            // This bypass is gated behind #[cfg(test)] or the "test-auth" feature
            // to ensure it is never active in production builds.
            #[cfg(any(test, feature = "test-auth"))]
            if let Some(rest) = token.strip_prefix("test-token:") {
                return parse_test_token(rest);
            }

            let claims = validate_jwt(token, state)?;

            let user_id = claims
                .sub
                .parse::<UserId>()
                .map_err(|_| ApiError::Unauthorized)?;

            let tenant_id = claims
                .tid
                .as_deref()
                .map(str::parse::<TenantId>)
                .transpose()
                .map_err(|_| ApiError::Unauthorized)?;

            Ok(AuthUser {
                user_id,
                tenant_id,
                role: claims.role.unwrap_or(Role::Member),
            })
        })
    }
}

/// Validate an HS256 JWT against the configured secret.
fn validate_jwt(token: &str, state: &AppState) -> Result<JwtClaims, ApiError> {
    let secret = state
        .config
        .auth_secret
        .as_ref()
        .ok_or(ApiError::Unauthorized)?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&state.config.auth_issuer]);

    let token_data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "JWT validation failed");
        ApiError::Unauthorized
    })?;

    Ok(token_data.claims)
}

/// Parse a `test-token:` credential.
///
/// Format: `<user_id>[:<tenant_id>][:admin]`.
#[cfg(any(test, feature = "test-auth"))]
fn parse_test_token(rest: &str) -> Result<AuthUser, ApiError> {
    let mut parts = rest.split(':');

    let user_id = parts
        .next()
        .and_then(|s| s.parse::<UserId>().ok())
        .ok_or(ApiError::Unauthorized)?;

    let mut tenant_id = None;
    let mut role = Role::Member;
    for part in parts {
        if part == "admin" {
            role = Role::Admin;
        } else {
            tenant_id = Some(part.parse::<TenantId>().map_err(|_| ApiError::Unauthorized)?);
        }
    }

    Ok(AuthUser {
        user_id,
        tenant_id,
        role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_minimal() {
        let user = UserId::generate();
        let auth = parse_test_token(&user.to_string()).unwrap();
        assert_eq!(auth.user_id, user);
        assert!(auth.tenant_id.is_none());
        assert_eq!(auth.role, Role::Member);
    }

    #[test]
    fn test_token_with_tenant_and_role() {
        let user = UserId::generate();
        let tenant = TenantId::generate();
        let auth = parse_test_token(&format!("{user}:{tenant}:admin")).unwrap();
        assert_eq!(auth.tenant_id, Some(tenant));
        assert_eq!(auth.role, Role::Admin);
    }

    #[test]
    fn test_token_rejects_garbage() {
        assert!(parse_test_token("not-a-uuid").is_err());
    }

    #[test]
    fn tenant_required_for_scoped_calls() {
        let auth = AuthUser {
            user_id: UserId::generate(),
            tenant_id: None,
            role: Role::Member,
        };
        assert!(matches!(auth.tenant(), Err(ApiError::Forbidden)));
    }
}
