//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{billing, content, health, progress, tenants, webhooks};
use crate::state::AppState;

// ============================================================================
// Concurrency Limiting Constants
// ============================================================================

/// Maximum concurrent requests for learner-facing endpoints (content reads,
/// progress writes). These carry the bulk of the traffic.
const LEARNER_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Maximum concurrent requests for tenant and billing endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /v1/tenants/slug-check` - Slug availability
///
/// ## Tenants (JWT auth)
/// - `POST /v1/tenants` - Register tenant
/// - `GET /v1/tenants/me` - Get current tenant
/// - `PATCH /v1/tenants/me/branding` - Update branding
/// - `DELETE /v1/tenants/me` - Delete tenant and all owned data
///
/// ## Billing (JWT auth, admin for writes)
/// - `GET /v1/billing/catalog` - Plan catalog
/// - `GET|POST /v1/billing/tiers` - List / create tiers
/// - `POST /v1/billing/subscription/trial` - Start trial
/// - `POST /v1/billing/subscription` - Start paid subscription
/// - `GET /v1/billing/subscription` - Current subscription
/// - `POST /v1/billing/subscription/change-tier` - Prorated tier change
/// - `POST /v1/billing/subscription/cancel` - Cancel
/// - `POST /v1/billing/subscription/users` - Add seat
/// - `DELETE /v1/billing/subscription/users/:user_id` - Release seat
///
/// ## Content (JWT auth, admin for writes)
/// - Curricula, chapters, lessons, and modules: CRUD plus `publish` and
///   `reorder` at every level.
///
/// ## Progress (JWT auth)
/// - Progress, notes, highlights, and bookmarks, all scoped to the caller.
///
/// ## Webhooks (signature verification)
/// - `POST /webhooks/gateway` - Payment gateway events
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Learner-facing routes carry classroom traffic and get a higher
    // concurrency ceiling.
    let learner_routes = Router::new()
        // Content tree
        .route(
            "/curricula",
            get(content::list_curricula).post(content::create_curriculum),
        )
        .route("/curricula/reorder", post(content::reorder_curricula))
        .route(
            "/curricula/:curriculum_id",
            get(content::get_curriculum)
                .patch(content::update_curriculum)
                .delete(content::delete_curriculum),
        )
        .route(
            "/curricula/:curriculum_id/publish",
            post(content::publish_curriculum),
        )
        .route(
            "/curricula/:curriculum_id/chapters",
            get(content::list_chapters).post(content::create_chapter),
        )
        .route(
            "/curricula/:curriculum_id/chapters/reorder",
            post(content::reorder_chapters),
        )
        .route(
            "/curricula/:curriculum_id/chapters/:chapter_id",
            get(content::get_chapter)
                .patch(content::update_chapter)
                .delete(content::delete_chapter),
        )
        .route(
            "/curricula/:curriculum_id/chapters/:chapter_id/publish",
            post(content::publish_chapter),
        )
        .route(
            "/chapters/:chapter_id/lessons",
            get(content::list_lessons).post(content::create_lesson),
        )
        .route(
            "/chapters/:chapter_id/lessons/reorder",
            post(content::reorder_lessons),
        )
        .route(
            "/chapters/:chapter_id/lessons/:lesson_id",
            get(content::get_lesson)
                .patch(content::update_lesson)
                .delete(content::delete_lesson),
        )
        .route(
            "/chapters/:chapter_id/lessons/:lesson_id/publish",
            post(content::publish_lesson),
        )
        .route(
            "/lessons/:lesson_id/modules",
            get(content::list_modules).post(content::create_module),
        )
        .route(
            "/lessons/:lesson_id/modules/reorder",
            post(content::reorder_modules),
        )
        .route(
            "/lessons/:lesson_id/modules/:module_id",
            get(content::get_module)
                .patch(content::update_module)
                .delete(content::delete_module),
        )
        .route(
            "/lessons/:lesson_id/modules/:module_id/publish",
            post(content::publish_module),
        )
        // Progress and annotations
        .route(
            "/progress",
            get(progress::list_progress).put(progress::put_progress),
        )
        .route("/notes", get(progress::list_notes).put(progress::put_note))
        .route(
            "/notes/lesson/:lesson_id",
            delete(progress::delete_lesson_note),
        )
        .route(
            "/notes/chapter/:curriculum_id/:chapter_id",
            delete(progress::delete_chapter_note),
        )
        .route(
            "/lessons/:lesson_id/highlights",
            get(progress::list_highlights).post(progress::create_highlight),
        )
        .route(
            "/lessons/:lesson_id/highlights/:highlight_id",
            delete(progress::delete_highlight),
        )
        .route(
            "/lessons/:lesson_id/bookmark",
            put(progress::put_bookmark).delete(progress::delete_bookmark),
        )
        .route("/bookmarks", get(progress::list_bookmarks))
        .layer(ConcurrencyLimitLayer::new(LEARNER_MAX_CONCURRENT_REQUESTS));

    // Tenant and billing routes
    let api_routes = Router::new()
        // Tenants
        .route("/tenants", post(tenants::register_tenant))
        .route(
            "/tenants/me",
            get(tenants::get_tenant).delete(tenants::delete_tenant),
        )
        .route("/tenants/me/branding", patch(tenants::update_branding))
        .route("/tenants/slug-check", get(tenants::check_slug))
        // Billing
        .route("/billing/catalog", get(billing::get_catalog))
        .route(
            "/billing/tiers",
            get(billing::list_tiers).post(billing::create_tier),
        )
        .route("/billing/subscription/trial", post(billing::start_trial))
        .route(
            "/billing/subscription",
            get(billing::get_subscription).post(billing::start_subscription),
        )
        .route(
            "/billing/subscription/change-tier",
            post(billing::change_tier),
        )
        .route("/billing/subscription/cancel", post(billing::cancel_subscription))
        .route("/billing/subscription/users", post(billing::add_seat))
        .route(
            "/billing/subscription/users/:user_id",
            delete(billing::remove_seat),
        )
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS))
        // Learner routes (with their own concurrency limit)
        .merge(learner_routes);

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Webhooks (no rate limit - retry cadence is the gateway's)
        .route("/webhooks/gateway", post(webhooks::handle_webhook))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
