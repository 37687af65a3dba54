//! Tenant registration and management handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use campus_core::{
    slug_is_valid, BillingConfiguration, BillingTier, Branding, Tenant, RESERVED_SLUGS,
};
use campus_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Tenant response.
#[derive(Debug, Serialize)]
pub struct TenantResponse {
    /// Tenant ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Slug (path segment).
    pub slug: String,
    /// Custom domain, if configured.
    pub custom_domain: Option<String>,
    /// Branding settings.
    pub branding: Branding,
    /// Whether the tenant has a gateway customer record.
    pub gateway_connected: bool,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&Tenant> for TenantResponse {
    fn from(tenant: &Tenant) -> Self {
        Self {
            id: tenant.id.to_string(),
            name: tenant.name.clone(),
            slug: tenant.slug.clone(),
            custom_domain: tenant.custom_domain.clone(),
            branding: tenant.branding.clone(),
            gateway_connected: tenant.gateway_customer_id.is_some(),
            created_at: tenant.created_at.to_rfc3339(),
        }
    }
}

/// Tenant registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterTenantRequest {
    /// Organization display name.
    pub name: String,
    /// Requested slug.
    pub slug: String,
    /// Billing contact email (forwarded to the gateway).
    pub email: Option<String>,
}

/// Register a new tenant.
///
/// Validates the slug (shape, reserved words), claims it atomically in the
/// store, and seeds the tenant's billing tiers from the plan catalog.
pub async fn register_tenant(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<RegisterTenantRequest>,
) -> Result<Json<TenantResponse>, ApiError> {
    let mut tenant = Tenant::new(body.name, body.slug)?;

    // Create the gateway customer before committing locally so a gateway
    // failure leaves no local row behind.
    if let Some(gateway) = &state.gateway {
        match gateway
            .create_customer(&tenant.id.to_string(), body.email.as_deref(), Some(&tenant.name))
            .await
        {
            Ok(customer) => {
                tracing::info!(
                    tenant_id = %tenant.id,
                    gateway_customer = %customer.id,
                    "Gateway customer created"
                );
                tenant.gateway_customer_id = Some(customer.id);
            }
            Err(e) => {
                tracing::warn!(
                    tenant_id = %tenant.id,
                    error = %e,
                    "Failed to create gateway customer - continuing without"
                );
            }
        }
    }

    state.store.create_tenant(&tenant)?;

    // Seed the tenant's tiers from the catalog.
    let catalog = BillingConfiguration::current();
    for definition in catalog.tiers().values() {
        let mut tier = BillingTier::new(
            tenant.id,
            definition.name.clone(),
            definition.kind,
            definition.monthly_price_cents,
            definition.per_user_price_cents,
            definition.user_limit,
        )?;
        tier.features = definition.features.clone();
        state.store.create_tier(&tier)?;
    }

    tracing::info!(
        tenant_id = %tenant.id,
        slug = %tenant.slug,
        user_id = %auth.user_id,
        "Tenant registered"
    );

    Ok(Json(TenantResponse::from(&tenant)))
}

/// Get the caller's tenant.
pub async fn get_tenant(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<TenantResponse>, ApiError> {
    let tenant_id = auth.tenant()?;
    let tenant = state
        .store
        .get_tenant(&tenant_id)?
        .ok_or_else(|| ApiError::NotFound("Tenant not found".into()))?;

    Ok(Json(TenantResponse::from(&tenant)))
}

/// Branding update request. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateBrandingRequest {
    /// Logo URL.
    pub logo_url: Option<String>,
    /// Primary brand color as a hex string.
    pub primary_color: Option<String>,
    /// Welcome message shown to learners.
    pub welcome_message: Option<String>,
}

/// Update the tenant's branding.
pub async fn update_branding(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<UpdateBrandingRequest>,
) -> Result<Json<TenantResponse>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    let mut tenant = state
        .store
        .get_tenant(&tenant_id)?
        .ok_or_else(|| ApiError::NotFound("Tenant not found".into()))?;

    if let Some(logo_url) = body.logo_url {
        tenant.branding.logo_url = Some(logo_url);
    }
    if let Some(primary_color) = body.primary_color {
        tenant.branding.primary_color = Some(primary_color);
    }
    if let Some(welcome_message) = body.welcome_message {
        tenant.branding.welcome_message = Some(welcome_message);
    }
    tenant.updated_at = chrono::Utc::now();

    state.store.update_tenant(&tenant)?;

    Ok(Json(TenantResponse::from(&tenant)))
}

/// Delete the caller's tenant and everything it owns.
pub async fn delete_tenant(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    state.store.delete_tenant(&tenant_id)?;
    state.release_tenant_lock(&tenant_id);

    tracing::info!(tenant_id = %tenant_id, "Tenant deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Slug check query.
#[derive(Debug, Deserialize)]
pub struct SlugCheckQuery {
    /// Candidate slug.
    pub slug: String,
}

/// Slug check response.
#[derive(Debug, Serialize)]
pub struct SlugCheckResponse {
    /// The checked slug.
    pub slug: String,
    /// Whether the slug can be claimed.
    pub available: bool,
    /// Why the slug is unavailable, when it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

/// Check whether a slug can be claimed, without claiming it.
pub async fn check_slug(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlugCheckQuery>,
) -> Result<Json<SlugCheckResponse>, ApiError> {
    let slug = query.slug;

    let reason = if !slug_is_valid(&slug) {
        Some("invalid")
    } else if RESERVED_SLUGS.contains(&slug.as_str()) {
        Some("reserved")
    } else if state.store.slug_taken(&slug)? {
        Some("taken")
    } else {
        None
    };

    Ok(Json(SlugCheckResponse {
        slug,
        available: reason.is_none(),
        reason,
    }))
}
