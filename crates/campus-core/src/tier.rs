//! Billing tier types.
//!
//! A tier is a tenant-owned priced plan: a flat monthly price plus a
//! per-seat price, with an optional user cap. Trial tiers are marked with
//! an explicit kind rather than by name matching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, FieldError, Result};
use crate::ids::{TenantId, TierId};

/// Kind of billing tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    /// Time-limited trial tier.
    Trial,

    /// Regular paid tier.
    Standard,
}

/// A tenant-scoped priced plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingTier {
    /// The tier ID.
    pub id: TierId,

    /// The owning tenant.
    pub tenant_id: TenantId,

    /// Tier name, unique per tenant.
    pub name: String,

    /// Tier kind.
    pub kind: TierKind,

    /// Flat monthly price in cents.
    pub monthly_price_cents: i64,

    /// Additional monthly price per active user, in cents.
    pub per_user_price_cents: i64,

    /// Maximum active users, `None` = unlimited.
    pub user_limit: Option<u32>,

    /// Feature flags included in this tier.
    pub features: Vec<String>,

    /// External gateway price identifier, unique across the system.
    pub external_price_id: Option<String>,

    /// When the tier was created.
    pub created_at: DateTime<Utc>,

    /// When the tier was last updated.
    pub updated_at: DateTime<Utc>,
}

impl BillingTier {
    /// Create a new tier after checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty name, negative prices, or a
    /// zero user limit. Name uniqueness per tenant and external-price-id
    /// uniqueness are enforced by the store.
    pub fn new(
        tenant_id: TenantId,
        name: impl Into<String>,
        kind: TierKind,
        monthly_price_cents: i64,
        per_user_price_cents: i64,
        user_limit: Option<u32>,
    ) -> Result<Self> {
        let name = name.into();
        let mut errors = Vec::new();

        if name.trim().is_empty() {
            errors.push(FieldError::new("name", "must not be empty"));
        }
        if monthly_price_cents < 0 {
            errors.push(FieldError::new("monthly_price_cents", "must be >= 0"));
        }
        if per_user_price_cents < 0 {
            errors.push(FieldError::new("per_user_price_cents", "must be >= 0"));
        }
        if user_limit == Some(0) {
            errors.push(FieldError::new("user_limit", "must be > 0 or absent"));
        }

        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let now = Utc::now();
        Ok(Self {
            id: TierId::generate(),
            tenant_id,
            name,
            kind,
            monthly_price_cents,
            per_user_price_cents,
            user_limit,
            features: Vec::new(),
            external_price_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Total monthly price for `n` active users, in cents.
    #[must_use]
    pub const fn total_price_for_users(&self, n: u32) -> i64 {
        self.monthly_price_cents + self.per_user_price_cents * n as i64
    }

    /// Whether this tier has no user cap.
    #[must_use]
    pub const fn unlimited_users(&self) -> bool {
        self.user_limit.is_none()
    }

    /// Whether this is a trial tier.
    #[must_use]
    pub fn is_trial(&self) -> bool {
        self.kind == TierKind::Trial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(monthly: i64, per_user: i64, limit: Option<u32>) -> BillingTier {
        BillingTier::new(
            TenantId::generate(),
            "Starter",
            TierKind::Standard,
            monthly,
            per_user,
            limit,
        )
        .unwrap()
    }

    #[test]
    fn total_price_is_linear_in_users() {
        let t = tier(3000, 500, None);
        for n in 0..50 {
            assert_eq!(
                t.total_price_for_users(n),
                t.monthly_price_cents + t.per_user_price_cents * i64::from(n)
            );
        }
    }

    #[test]
    fn total_price_with_no_per_user_component() {
        let t = tier(3000, 0, Some(10));
        assert_eq!(t.total_price_for_users(0), 3000);
        assert_eq!(t.total_price_for_users(100), 3000);
    }

    #[test]
    fn unlimited_users_iff_limit_absent() {
        assert!(tier(0, 0, None).unlimited_users());
        assert!(!tier(0, 0, Some(5)).unlimited_users());
    }

    #[test]
    fn trial_detection_uses_kind_not_name() {
        let named_trial = BillingTier::new(
            TenantId::generate(),
            "Trial",
            TierKind::Standard,
            0,
            0,
            None,
        )
        .unwrap();
        assert!(!named_trial.is_trial());

        let real_trial =
            BillingTier::new(TenantId::generate(), "Evaluation", TierKind::Trial, 0, 0, Some(10))
                .unwrap();
        assert!(real_trial.is_trial());
    }

    #[test]
    fn negative_prices_rejected() {
        let err = BillingTier::new(
            TenantId::generate(),
            "Bad",
            TierKind::Standard,
            -1,
            -1,
            Some(0),
        )
        .unwrap_err();
        match err {
            DomainError::Validation(errors) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
