//! Billing handlers: tiers, subscriptions, and seats.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use campus_core::{
    prorate, remaining_days_in_period, BillingConfiguration, BillingTier, Proration,
    SubscriptionStatus, TenantId, TenantSubscription, TierId, TierKind, UserId, UserSubscription,
    UserSubscriptionStatus,
};
use campus_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Billing period length used for local-only paid subscriptions.
const LOCAL_PERIOD_DAYS: i64 = 30;

/// Subscription response.
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    /// Subscription ID.
    pub id: String,
    /// The subscribed tier.
    pub tier_id: String,
    /// Current status.
    pub status: SubscriptionStatus,
    /// End of the trial window.
    pub trial_ends_at: Option<String>,
    /// Whole days left in the trial, floored at zero.
    pub days_until_trial_expires: Option<i64>,
    /// Whether the trial window has elapsed.
    pub trial_expired: bool,
    /// Start of the current billing period.
    pub current_period_start: Option<String>,
    /// End of the current billing period.
    pub current_period_end: Option<String>,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&TenantSubscription> for SubscriptionResponse {
    fn from(sub: &TenantSubscription) -> Self {
        Self {
            id: sub.id.to_string(),
            tier_id: sub.tier_id.to_string(),
            status: sub.status,
            trial_ends_at: sub.trial_ends_at.map(|t| t.to_rfc3339()),
            days_until_trial_expires: sub.days_until_trial_expires(),
            trial_expired: sub.trial_expired(),
            current_period_start: sub.current_period_start.map(|t| t.to_rfc3339()),
            current_period_end: sub.current_period_end.map(|t| t.to_rfc3339()),
            created_at: sub.created_at.to_rfc3339(),
        }
    }
}

/// Get the plan catalog.
pub async fn get_catalog(
    _auth: AuthUser,
) -> Result<Json<BillingConfiguration>, ApiError> {
    Ok(Json((*BillingConfiguration::current()).clone()))
}

/// List the tenant's billing tiers.
pub async fn list_tiers(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<BillingTier>>, ApiError> {
    let tenant_id = auth.tenant()?;
    Ok(Json(state.store.list_tiers(&tenant_id)?))
}

/// Tier creation request.
#[derive(Debug, Deserialize)]
pub struct CreateTierRequest {
    /// Display name, unique within the tenant.
    pub name: String,
    /// Tier kind.
    pub kind: TierKind,
    /// Flat monthly price in cents.
    pub monthly_price_cents: i64,
    /// Per-user monthly price in cents.
    pub per_user_price_cents: i64,
    /// Maximum active users; absent = unlimited.
    pub user_limit: Option<u32>,
    /// Included feature flags.
    #[serde(default)]
    pub features: Vec<String>,
    /// Gateway price ID backing this tier.
    pub external_price_id: Option<String>,
}

/// Create a custom tier for the tenant.
pub async fn create_tier(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateTierRequest>,
) -> Result<Json<BillingTier>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    let mut tier = BillingTier::new(
        tenant_id,
        body.name,
        body.kind,
        body.monthly_price_cents,
        body.per_user_price_cents,
        body.user_limit,
    )?;
    tier.features = body.features;
    tier.external_price_id = body.external_price_id;

    state.store.create_tier(&tier)?;

    tracing::info!(tenant_id = %tenant_id, tier = %tier.name, "Tier created");

    Ok(Json(tier))
}

/// Start a trial subscription on the tenant's trial tier.
pub async fn start_trial(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;
    let lock = state.tenant_lock(tenant_id);
    let _guard = lock.lock().await;

    let tier = trial_tier(&state, tenant_id)?;
    let catalog = BillingConfiguration::current();

    let subscription =
        TenantSubscription::start_trial(tenant_id, tier.id, catalog.trial_duration_days);
    state.store.create_subscription(&subscription)?;

    tracing::info!(
        tenant_id = %tenant_id,
        subscription_id = %subscription.id,
        trial_ends_at = ?subscription.trial_ends_at,
        "Trial started"
    );

    Ok(Json(SubscriptionResponse::from(&subscription)))
}

/// Paid signup request.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    /// The tier to subscribe to.
    pub tier_id: TierId,
    /// Initial seat quantity reported to the gateway.
    #[serde(default = "default_user_count")]
    pub user_count: u32,
}

const fn default_user_count() -> u32 {
    1
}

/// Start a paid subscription.
///
/// When the gateway is configured and the tier is backed by a gateway
/// price, the gateway subscription is created first; the local row is only
/// written after that call succeeds.
pub async fn start_subscription(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<SignupRequest>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;
    let lock = state.tenant_lock(tenant_id);
    let _guard = lock.lock().await;

    let tier = state
        .store
        .get_tier(&tenant_id, &body.tier_id)?
        .ok_or_else(|| ApiError::NotFound("Tier not found".into()))?;

    let subscription = match (&state.gateway, &tier.external_price_id) {
        (Some(gateway), Some(price_id)) => {
            let customer_id = ensure_gateway_customer(&state, gateway, tenant_id).await?;
            let remote = gateway
                .create_subscription(&customer_id, price_id, body.user_count)
                .await?;
            TenantSubscription::start_paid(
                tenant_id,
                tier.id,
                remote.id,
                unix_to_datetime(remote.current_period_start),
                unix_to_datetime(remote.current_period_end),
            )
        }
        _ => {
            // No gateway backing: a locally tracked paid subscription.
            let now = Utc::now();
            let mut sub = TenantSubscription::start_trial(tenant_id, tier.id, 0);
            sub.status = SubscriptionStatus::Active;
            sub.trial_ends_at = None;
            sub.current_period_start = Some(now);
            sub.current_period_end = Some(now + Duration::days(LOCAL_PERIOD_DAYS));
            sub
        }
    };

    state.store.create_subscription(&subscription)?;

    tracing::info!(
        tenant_id = %tenant_id,
        subscription_id = %subscription.id,
        tier = %tier.name,
        "Paid subscription started"
    );

    Ok(Json(SubscriptionResponse::from(&subscription)))
}

/// Get the tenant's current subscription.
pub async fn get_subscription(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let tenant_id = auth.tenant()?;
    let subscription = state
        .store
        .current_subscription(&tenant_id)?
        .ok_or_else(|| ApiError::NotFound("No current subscription".into()))?;

    Ok(Json(SubscriptionResponse::from(&subscription)))
}

/// Tier change request.
#[derive(Debug, Deserialize)]
pub struct ChangeTierRequest {
    /// The tier to move to.
    pub tier_id: TierId,
}

/// Tier change response with the proration breakdown.
#[derive(Debug, Serialize)]
pub struct ChangeTierResponse {
    /// The updated subscription.
    pub subscription: SubscriptionResponse,
    /// Amount charged now, in cents.
    pub charge_cents: i64,
    /// Amount credited now, in cents.
    pub credit_cents: i64,
    /// Days left in the current period used for the calculation.
    pub remaining_days: i64,
}

/// Move the current subscription to a different tier, prorating the
/// remainder of the billing period.
///
/// Moving a trial onto a non-trial tier activates the subscription: the
/// trial window is cleared and a billing period starts, provisioned at the
/// gateway when the tier carries a gateway price, locally otherwise.
pub async fn change_tier(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<ChangeTierRequest>,
) -> Result<Json<ChangeTierResponse>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;
    let lock = state.tenant_lock(tenant_id);
    let _guard = lock.lock().await;

    let mut subscription = state
        .store
        .current_subscription(&tenant_id)?
        .ok_or_else(|| ApiError::NotFound("No current subscription".into()))?;

    if subscription.tier_id == body.tier_id {
        return Err(ApiError::Conflict("Already on this tier".into()));
    }

    let old_tier = state
        .store
        .get_tier(&tenant_id, &subscription.tier_id)?
        .ok_or_else(|| ApiError::NotFound("Current tier not found".into()))?;
    let new_tier = state
        .store
        .get_tier(&tenant_id, &body.tier_id)?
        .ok_or_else(|| ApiError::NotFound("Tier not found".into()))?;

    let user_count = state.store.count_active_users(&subscription.id)?;
    let remaining_days = remaining_days_in_period(subscription.current_period_end, Utc::now());
    let proration: Proration = prorate(&old_tier, &new_tier, user_count, remaining_days);

    // Gateway first: a declined change must not move the local row.
    if let (Some(gateway), Some(price_id)) = (&state.gateway, &new_tier.external_price_id) {
        let remote = match &subscription.external_subscription_id {
            Some(external_id) => {
                gateway
                    .update_subscription(external_id, price_id, user_count.max(1))
                    .await?
            }
            None => {
                // Trial rows have no gateway linkage yet; provision one.
                let customer_id = ensure_gateway_customer(&state, gateway, tenant_id).await?;
                gateway
                    .create_subscription(&customer_id, price_id, user_count.max(1))
                    .await?
            }
        };
        subscription.external_subscription_id = Some(remote.id);
        subscription.current_period_start = Some(unix_to_datetime(remote.current_period_start));
        subscription.current_period_end = Some(unix_to_datetime(remote.current_period_end));
    }

    if subscription.status == SubscriptionStatus::Trial && new_tier.kind != TierKind::Trial {
        subscription.status = SubscriptionStatus::Active;
        subscription.trial_ends_at = None;
        if subscription.current_period_end.is_none() {
            let now = Utc::now();
            subscription.current_period_start = Some(now);
            subscription.current_period_end = Some(now + Duration::days(LOCAL_PERIOD_DAYS));
        }
    }

    subscription.tier_id = new_tier.id;
    subscription.updated_at = Utc::now();
    state.store.update_subscription(&subscription)?;

    tracing::info!(
        tenant_id = %tenant_id,
        from = %old_tier.name,
        to = %new_tier.name,
        charge_cents = proration.charge_cents,
        credit_cents = proration.credit_cents,
        "Tier changed"
    );

    Ok(Json(ChangeTierResponse {
        subscription: SubscriptionResponse::from(&subscription),
        charge_cents: proration.charge_cents,
        credit_cents: proration.credit_cents,
        remaining_days: proration.remaining_days,
    }))
}

/// Cancellation request.
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    /// Cancel at the period end (default) or immediately.
    #[serde(default = "default_at_period_end")]
    pub at_period_end: bool,
}

const fn default_at_period_end() -> bool {
    true
}

/// Cancel the current subscription.
///
/// Immediate cancellation moves the row to `canceled` and frees the
/// tenant's current-subscription slot; period-end cancellation leaves the
/// row current until the gateway's deletion event arrives.
pub async fn cancel_subscription(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CancelRequest>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;
    let lock = state.tenant_lock(tenant_id);
    let _guard = lock.lock().await;

    let mut subscription = state
        .store
        .current_subscription(&tenant_id)?
        .ok_or_else(|| ApiError::NotFound("No current subscription".into()))?;

    if let (Some(gateway), Some(external_id)) =
        (&state.gateway, &subscription.external_subscription_id)
    {
        gateway
            .cancel_subscription(external_id, body.at_period_end)
            .await?;
    }

    if !body.at_period_end {
        subscription.status = SubscriptionStatus::Canceled;
    }
    subscription.updated_at = Utc::now();
    state.store.update_subscription(&subscription)?;

    tracing::info!(
        tenant_id = %tenant_id,
        subscription_id = %subscription.id,
        at_period_end = body.at_period_end,
        "Subscription canceled"
    );

    Ok(Json(SubscriptionResponse::from(&subscription)))
}

/// Seat addition request.
#[derive(Debug, Deserialize)]
pub struct AddSeatRequest {
    /// The user to seat.
    pub user_id: UserId,
}

/// Seat response.
#[derive(Debug, Serialize)]
pub struct SeatResponse {
    /// The seated user.
    pub user_id: String,
    /// Seat status.
    pub status: UserSubscriptionStatus,
    /// Per-user monthly price snapshot in cents.
    pub monthly_price_cents: i64,
}

impl From<&UserSubscription> for SeatResponse {
    fn from(seat: &UserSubscription) -> Self {
        Self {
            user_id: seat.user_id.to_string(),
            status: seat.status,
            monthly_price_cents: seat.monthly_price_cents,
        }
    }
}

/// Add a user seat to the current subscription.
pub async fn add_seat(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<AddSeatRequest>,
) -> Result<Json<SeatResponse>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;
    let lock = state.tenant_lock(tenant_id);
    let _guard = lock.lock().await;

    let subscription = state
        .store
        .current_subscription(&tenant_id)?
        .ok_or_else(|| ApiError::NotFound("No current subscription".into()))?;

    let tier = state
        .store
        .get_tier(&tenant_id, &subscription.tier_id)?
        .ok_or_else(|| ApiError::NotFound("Tier not found".into()))?;

    if let Some(existing) = state
        .store
        .get_user_subscription(&subscription.id, &body.user_id)?
    {
        if existing.status == UserSubscriptionStatus::Active {
            return Err(ApiError::Conflict("User already has a seat".into()));
        }
    }

    let active = state.store.count_active_users(&subscription.id)?;
    if !subscription.can_add_user(&tier, active) {
        return Err(ApiError::Conflict(format!(
            "User limit reached for tier {}",
            tier.name
        )));
    }

    let seat = UserSubscription::new(subscription.id, body.user_id, &tier);
    state.store.put_user_subscription(&seat)?;

    tracing::info!(
        tenant_id = %tenant_id,
        user_id = %body.user_id,
        active_users = active + 1,
        "Seat added"
    );

    Ok(Json(SeatResponse::from(&seat)))
}

/// Release a user's seat.
pub async fn remove_seat(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<SeatResponse>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;
    let lock = state.tenant_lock(tenant_id);
    let _guard = lock.lock().await;

    let subscription = state
        .store
        .current_subscription(&tenant_id)?
        .ok_or_else(|| ApiError::NotFound("No current subscription".into()))?;

    let mut seat = state
        .store
        .get_user_subscription(&subscription.id, &user_id)?
        .ok_or_else(|| ApiError::NotFound("Seat not found".into()))?;

    seat.status = UserSubscriptionStatus::Canceled;
    seat.updated_at = Utc::now();
    state.store.put_user_subscription(&seat)?;

    tracing::info!(tenant_id = %tenant_id, user_id = %user_id, "Seat released");

    Ok(Json(SeatResponse::from(&seat)))
}

/// The tenant's trial tier, created from the catalog when missing.
fn trial_tier(state: &AppState, tenant_id: TenantId) -> Result<BillingTier, ApiError> {
    if let Some(tier) = state
        .store
        .list_tiers(&tenant_id)?
        .into_iter()
        .find(|t| t.kind == TierKind::Trial)
    {
        return Ok(tier);
    }

    let catalog = BillingConfiguration::current();
    let definition = catalog
        .trial_tier()
        .ok_or_else(|| ApiError::Internal("Catalog carries no trial tier".into()))?;

    let mut tier = BillingTier::new(
        tenant_id,
        definition.name.clone(),
        definition.kind,
        definition.monthly_price_cents,
        definition.per_user_price_cents,
        definition.user_limit,
    )?;
    tier.features = definition.features.clone();
    state.store.create_tier(&tier)?;
    Ok(tier)
}

/// Get or create the tenant's gateway customer record.
async fn ensure_gateway_customer(
    state: &AppState,
    gateway: &campus_gateway::GatewayClient,
    tenant_id: TenantId,
) -> Result<String, ApiError> {
    let mut tenant = state
        .store
        .get_tenant(&tenant_id)?
        .ok_or_else(|| ApiError::NotFound("Tenant not found".into()))?;

    if let Some(customer_id) = tenant.gateway_customer_id {
        return Ok(customer_id);
    }

    let customer = gateway
        .create_customer(&tenant_id.to_string(), None, Some(&tenant.name))
        .await?;
    tenant.gateway_customer_id = Some(customer.id.clone());
    tenant.updated_at = Utc::now();
    state.store.update_tenant(&tenant)?;

    Ok(customer.id)
}

/// Convert a gateway Unix timestamp into UTC, clamping bad values to now.
fn unix_to_datetime(unix: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(unix, 0).unwrap_or_else(Utc::now)
}
