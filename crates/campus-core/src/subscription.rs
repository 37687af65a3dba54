//! Tenant subscription state machine.
//!
//! One subscription row per tenant is "current": the most recent row whose
//! status is trial or active. Rows are never deleted; cancellation is a
//! status transition. Webhook reconciliation overwrites status and period
//! fields, so replaying an event is a no-op; `last_gateway_event_at`
//! rejects events older than the last one applied.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{SubscriptionId, TenantId, TierId, UserId};
use crate::tier::BillingTier;

/// Status of a tenant subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// In the configured trial window.
    Trial,

    /// Paid and in good standing.
    Active,

    /// A gateway payment failed; access may be restricted.
    PastDue,

    /// Canceled, either directly or by a gateway deletion event.
    Canceled,
}

impl SubscriptionStatus {
    /// Whether this status makes the row the tenant's current subscription.
    #[must_use]
    pub const fn is_current(self) -> bool {
        matches!(self, Self::Trial | Self::Active)
    }
}

/// A tenant's subscription to a billing tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantSubscription {
    /// The subscription ID (time-ordered).
    pub id: SubscriptionId,

    /// The owning tenant.
    pub tenant_id: TenantId,

    /// The subscribed tier.
    pub tier_id: TierId,

    /// Current status.
    pub status: SubscriptionStatus,

    /// End of the trial window. Required while status is `Trial`.
    pub trial_ends_at: Option<DateTime<Utc>>,

    /// Start of the current billing period.
    pub current_period_start: Option<DateTime<Utc>>,

    /// End of the current billing period.
    pub current_period_end: Option<DateTime<Utc>>,

    /// External gateway subscription ID, unique across the system.
    pub external_subscription_id: Option<String>,

    /// Timestamp of the newest gateway event applied to this row.
    ///
    /// Reconciliation skips events strictly older than this, so a stale
    /// webhook cannot regress fields written by a newer direct update.
    pub last_gateway_event_at: Option<DateTime<Utc>>,

    /// When the subscription was created.
    pub created_at: DateTime<Utc>,

    /// When the subscription was last updated.
    pub updated_at: DateTime<Utc>,
}

impl TenantSubscription {
    /// Start a trial subscription ending `trial_days` from now.
    #[must_use]
    pub fn start_trial(tenant_id: TenantId, tier_id: TierId, trial_days: i64) -> Self {
        let now = Utc::now();
        Self {
            id: SubscriptionId::generate(),
            tenant_id,
            tier_id,
            status: SubscriptionStatus::Trial,
            trial_ends_at: Some(now + Duration::days(trial_days)),
            current_period_start: None,
            current_period_end: None,
            external_subscription_id: None,
            last_gateway_event_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an active paid subscription with the gateway's period window.
    #[must_use]
    pub fn start_paid(
        tenant_id: TenantId,
        tier_id: TierId,
        external_subscription_id: String,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SubscriptionId::generate(),
            tenant_id,
            tier_id,
            status: SubscriptionStatus::Active,
            trial_ends_at: None,
            current_period_start: Some(period_start),
            current_period_end: Some(period_end),
            external_subscription_id: Some(external_subscription_id),
            last_gateway_event_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the trial window has elapsed.
    ///
    /// Always false outside `Trial` status, regardless of dates.
    #[must_use]
    pub fn trial_expired(&self) -> bool {
        self.status == SubscriptionStatus::Trial
            && self.trial_ends_at.is_some_and(|t| t <= Utc::now())
    }

    /// Whole days until the trial expires, floored at zero.
    ///
    /// `None` when the subscription is not in trial. Computed purely from
    /// `trial_ends_at`; billing period fields do not participate.
    #[must_use]
    pub fn days_until_trial_expires(&self) -> Option<i64> {
        if self.status != SubscriptionStatus::Trial {
            return None;
        }
        let ends = self.trial_ends_at?;
        Some((ends - Utc::now()).num_days().max(0))
    }

    /// Whether another user seat fits under the tier's cap.
    #[must_use]
    pub fn can_add_user(&self, tier: &BillingTier, active_user_count: u32) -> bool {
        match tier.user_limit {
            None => true,
            Some(limit) => active_user_count < limit,
        }
    }
}

/// Status of a per-user billing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSubscriptionStatus {
    /// Seat is occupied and billed.
    Active,

    /// Seat was released.
    Canceled,
}

/// A per-user billing line within a tenant subscription.
///
/// One row per (subscription, user) pair; the monthly price is a snapshot
/// taken when the seat was added so later tier edits do not reprice
/// existing seats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSubscription {
    /// The parent subscription.
    pub subscription_id: SubscriptionId,

    /// The seated user.
    pub user_id: UserId,

    /// Seat status.
    pub status: UserSubscriptionStatus,

    /// Per-user monthly price snapshot in cents.
    pub monthly_price_cents: i64,

    /// External gateway line-item ID, unique if present.
    pub external_id: Option<String>,

    /// When the seat was added.
    pub created_at: DateTime<Utc>,

    /// When the seat was last updated.
    pub updated_at: DateTime<Utc>,
}

impl UserSubscription {
    /// Add an active seat with a price snapshot from the tier.
    #[must_use]
    pub fn new(subscription_id: SubscriptionId, user_id: UserId, tier: &BillingTier) -> Self {
        let now = Utc::now();
        Self {
            subscription_id,
            user_id,
            status: UserSubscriptionStatus::Active,
            monthly_price_cents: tier.per_user_price_cents,
            external_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}
