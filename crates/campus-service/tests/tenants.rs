//! Tenant registration and management integration tests.

mod common;

use common::TestHarness;
use serde_json::json;

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn register_tenant_returns_tenant_and_seeds_tiers() {
    let harness = TestHarness::new();
    let tenant_id = harness.register_tenant("Acme Academy", "acme-academy").await;

    // The catalog tiers were seeded for the new tenant.
    let response = harness
        .server
        .get("/v1/billing/tiers")
        .add_header("authorization", harness.admin_auth_header(&tenant_id))
        .await;
    response.assert_status_ok();
    let tiers: serde_json::Value = response.json();
    let names: Vec<&str> = tiers
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Trial"));
    assert!(names.contains(&"Starter"));
}

#[tokio::test]
async fn duplicate_slug_is_rejected() {
    let harness = TestHarness::new();
    harness.register_tenant("First School", "my-school").await;

    let response = harness
        .server
        .post("/v1/tenants")
        .add_header("authorization", harness.registration_auth_header())
        .json(&json!({ "name": "Second School", "slug": "my-school" }))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn invalid_slug_fails_validation_with_field_details() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/tenants")
        .add_header("authorization", harness.registration_auth_header())
        .json(&json!({ "name": "Bad Slug School", "slug": "Has Spaces!" }))
        .await;
    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "validation_failed");
    let fields = body["error"]["details"]["fields"].as_array().unwrap();
    assert!(fields.iter().any(|f| f["field"] == "slug"));
}

#[tokio::test]
async fn reserved_slug_is_rejected() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/tenants")
        .add_header("authorization", harness.registration_auth_header())
        .json(&json!({ "name": "Sneaky", "slug": "admin" }))
        .await;
    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn registration_requires_auth() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/tenants")
        .json(&json!({ "name": "No Auth", "slug": "no-auth" }))
        .await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Slug check
// ============================================================================

#[tokio::test]
async fn slug_check_reports_availability() {
    let harness = TestHarness::new();
    harness.register_tenant("Taken School", "taken-slug").await;

    let cases = [
        ("taken-slug", false, Some("taken")),
        ("admin", false, Some("reserved")),
        ("Not Valid", false, Some("invalid")),
        ("fresh-slug", true, None),
    ];
    for (slug, available, reason) in cases {
        let response = harness
            .server
            .get("/v1/tenants/slug-check")
            .add_query_param("slug", slug)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["available"], available, "slug {slug}");
        match reason {
            Some(r) => assert_eq!(body["reason"], r, "slug {slug}"),
            None => assert!(body.get("reason").is_none(), "slug {slug}"),
        }
    }
}

// ============================================================================
// Tenant management
// ============================================================================

#[tokio::test]
async fn get_tenant_requires_tenant_claim() {
    let harness = TestHarness::new();
    harness.register_tenant("Claimless", "claimless").await;

    let response = harness
        .server
        .get("/v1/tenants/me")
        .add_header("authorization", harness.registration_auth_header())
        .await;
    response.assert_status(axum::http::StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn branding_update_is_partial() {
    let harness = TestHarness::new();
    let tenant_id = harness.register_tenant("Branded", "branded").await;

    harness
        .server
        .patch("/v1/tenants/me/branding")
        .add_header("authorization", harness.admin_auth_header(&tenant_id))
        .json(&json!({ "primary_color": "#336699" }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .patch("/v1/tenants/me/branding")
        .add_header("authorization", harness.admin_auth_header(&tenant_id))
        .json(&json!({ "welcome_message": "Welcome aboard" }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    // The earlier color survives the second partial update.
    assert_eq!(body["branding"]["primary_color"], "#336699");
    assert_eq!(body["branding"]["welcome_message"], "Welcome aboard");
}

#[tokio::test]
async fn branding_update_requires_admin() {
    let harness = TestHarness::new();
    let tenant_id = harness.register_tenant("Members Only", "members-only").await;

    let response = harness
        .server
        .patch("/v1/tenants/me/branding")
        .add_header("authorization", harness.member_auth_header(&tenant_id))
        .json(&json!({ "primary_color": "#000000" }))
        .await;
    response.assert_status(axum::http::StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn delete_tenant_frees_the_slug() {
    let harness = TestHarness::new();
    let tenant_id = harness.register_tenant("Short Lived", "short-lived").await;

    harness
        .server
        .delete("/v1/tenants/me")
        .add_header("authorization", harness.admin_auth_header(&tenant_id))
        .await
        .assert_status_ok();

    // The slug can be claimed again.
    let response = harness
        .server
        .get("/v1/tenants/slug-check")
        .add_query_param("slug", "short-lived")
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["available"], true);

    // The tenant itself is gone.
    harness
        .server
        .get("/v1/tenants/me")
        .add_header("authorization", harness.admin_auth_header(&tenant_id))
        .await
        .assert_status(axum::http::StatusCode::NOT_FOUND);
}
