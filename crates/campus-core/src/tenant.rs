//! Tenant types and slug rules.
//!
//! Every domain entity belongs to exactly one tenant. Slugs are the
//! tenant's path segment under path-based multitenancy; the reserved-word
//! list plus the store's uniqueness index together form the availability
//! check the registration flow runs before committing a new tenant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, FieldError, Result};
use crate::ids::TenantId;

/// Slugs that can never be claimed by a tenant.
///
/// These collide with platform routes or would be misleading as
/// organization names.
pub const RESERVED_SLUGS: &[&str] = &[
    "admin", "api", "app", "billing", "blog", "docs", "help", "mail", "root", "status",
    "support", "system", "webhooks", "www",
];

/// Maximum slug length.
const MAX_SLUG_LEN: usize = 63;

/// An isolated organization owning its own curricula, users, and billing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// The tenant ID.
    pub id: TenantId,

    /// Display name.
    pub name: String,

    /// Unique slug (path segment).
    pub slug: String,

    /// Optional custom domain.
    pub custom_domain: Option<String>,

    /// Branding settings.
    pub branding: Branding,

    /// Payment-gateway customer ID, set after first gateway contact.
    pub gateway_customer_id: Option<String>,

    /// Gateway connected merchant account ID, set after onboarding.
    pub gateway_account_id: Option<String>,

    /// When the tenant was created.
    pub created_at: DateTime<Utc>,

    /// When the tenant was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Create a new tenant.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the name is empty or the slug is
    /// malformed or reserved. Slug uniqueness against existing tenants is
    /// the store's responsibility.
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let slug = slug.into();
        let mut errors = Vec::new();

        if name.trim().is_empty() {
            errors.push(FieldError::new("name", "must not be empty"));
        }
        if !slug_is_valid(&slug) {
            errors.push(FieldError::new(
                "slug",
                "must be 1-63 lowercase alphanumeric characters or hyphens, not starting or ending with a hyphen",
            ));
        } else if RESERVED_SLUGS.contains(&slug.as_str()) {
            errors.push(FieldError::new("slug", format!("\"{slug}\" is reserved")));
        }

        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let now = Utc::now();
        Ok(Self {
            id: TenantId::generate(),
            name,
            slug,
            custom_domain: None,
            branding: Branding::default(),
            gateway_customer_id: None,
            gateway_account_id: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Tenant branding settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Branding {
    /// Logo URL.
    pub logo_url: Option<String>,

    /// Primary brand color as a hex string, e.g. `#1a73e8`.
    pub primary_color: Option<String>,

    /// Optional welcome message shown to learners.
    pub welcome_message: Option<String>,
}

/// Check slug shape: lowercase alphanumeric and hyphens, no leading or
/// trailing hyphen, at most 63 characters.
#[must_use]
pub fn slug_is_valid(slug: &str) -> bool {
    if slug.is_empty() || slug.len() > MAX_SLUG_LEN {
        return false;
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return false;
    }
    slug.bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_slugs() {
        for slug in ["acme", "acme-corp", "a", "team42"] {
            assert!(slug_is_valid(slug), "{slug} should be valid");
        }
    }

    #[test]
    fn invalid_slugs() {
        for slug in ["", "-acme", "acme-", "Acme", "a b", "a_b", &"x".repeat(64)] {
            assert!(!slug_is_valid(slug), "{slug} should be invalid");
        }
    }

    #[test]
    fn new_tenant_rejects_reserved_slug() {
        let err = Tenant::new("Acme", "admin").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn new_tenant_collects_all_field_errors() {
        let err = Tenant::new("", "-bad-").unwrap_err();
        match err {
            DomainError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn new_tenant_defaults() {
        let tenant = Tenant::new("Acme Corp", "acme").unwrap();
        assert_eq!(tenant.slug, "acme");
        assert!(tenant.gateway_customer_id.is_none());
        assert!(tenant.branding.logo_url.is_none());
    }
}
