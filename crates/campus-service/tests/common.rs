//! Common test utilities for campus integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use tempfile::TempDir;

use campus_core::{TenantId, UserId};
use campus_service::{create_router, AppState, ServiceConfig};
use campus_store::RocksStore;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct store handle for seeding state the API cannot create
    /// without a live gateway.
    pub store: Arc<RocksStore>,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// An admin user for tenant-scoped requests.
    pub admin_user_id: UserId,
    /// A regular member for tenant-scoped requests.
    pub member_user_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    /// Create a harness with a customized configuration (the data dir is
    /// always replaced with a fresh temp directory).
    pub fn with_config(mut config: ServiceConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));

        config.data_dir = temp_dir.path().to_string_lossy().to_string();

        let state = AppState::new(Arc::clone(&store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            _temp_dir: temp_dir,
            admin_user_id: UserId::generate(),
            member_user_id: UserId::generate(),
        }
    }

    /// Auth header for a tenant-less admin (registration calls).
    pub fn registration_auth_header(&self) -> String {
        format!("Bearer test-token:{}:admin", self.admin_user_id)
    }

    /// Auth header for the admin within a tenant.
    pub fn admin_auth_header(&self, tenant_id: &str) -> String {
        format!("Bearer test-token:{}:{tenant_id}:admin", self.admin_user_id)
    }

    /// Auth header for a plain member within a tenant.
    pub fn member_auth_header(&self, tenant_id: &str) -> String {
        format!("Bearer test-token:{}:{tenant_id}", self.member_user_id)
    }

    /// Auth header for an arbitrary user within a tenant.
    pub fn user_auth_header(user_id: &UserId, tenant_id: &str) -> String {
        format!("Bearer test-token:{user_id}:{tenant_id}")
    }

    /// Register a tenant and return its id as a string.
    pub async fn register_tenant(&self, name: &str, slug: &str) -> String {
        let response = self
            .server
            .post("/v1/tenants")
            .add_header("authorization", self.registration_auth_header())
            .json(&serde_json::json!({ "name": name, "slug": slug }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["id"].as_str().expect("tenant id").to_string()
    }

    /// Register a tenant and start a trial, returning the tenant id.
    pub async fn tenant_on_trial(&self, name: &str, slug: &str) -> String {
        let tenant_id = self.register_tenant(name, slug).await;
        self.server
            .post("/v1/billing/subscription/trial")
            .add_header("authorization", self.admin_auth_header(&tenant_id))
            .await
            .assert_status_ok();
        tenant_id
    }

    /// A throwaway tenant id that exists in no token's claims.
    pub fn unknown_tenant() -> TenantId {
        TenantId::generate()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
