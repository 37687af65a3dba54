//! Application state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use campus_core::TenantId;
use campus_gateway::GatewayClient;
use campus_store::RocksStore;

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Gateway client for payments (optional).
    pub gateway: Option<Arc<GatewayClient>>,

    /// Per-tenant async locks serializing billing mutations.
    ///
    /// Tier changes and seat additions are read-modify-write sequences;
    /// the lock makes them atomic per tenant without blocking other
    /// tenants.
    tenant_locks: Arc<Mutex<HashMap<TenantId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        let gateway = config.gateway_api_key.as_ref().map(|key| {
            tracing::info!("Payment gateway integration enabled");
            let client = GatewayClient::for_platform(key);
            let client = match &config.gateway_base_url {
                Some(url) => client.with_base_url(url),
                None => client,
            };
            Arc::new(client)
        });

        if gateway.is_none() {
            tracing::warn!("Payment gateway not configured - paid subscriptions will be local-only");
        }

        Self {
            store,
            config,
            gateway,
            tenant_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check if the payment gateway is configured.
    #[must_use]
    pub fn has_gateway(&self) -> bool {
        self.gateway.is_some()
    }

    /// The billing mutation lock for a tenant, created on first use.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned, which cannot happen since
    /// no code panics while holding it.
    #[must_use]
    pub fn tenant_lock(&self, tenant_id: TenantId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.tenant_locks.lock().expect("lock registry poisoned");
        Arc::clone(locks.entry(tenant_id).or_default())
    }

    /// Drop a tenant's entry from the lock registry.
    ///
    /// Called when a tenant is deleted so the registry does not accumulate
    /// entries for tenants that no longer exist. In-flight holders keep
    /// their `Arc` clone; a later `tenant_lock` for the same id simply
    /// creates a fresh entry.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned, which cannot happen since
    /// no code panics while holding it.
    pub fn release_tenant_lock(&self, tenant_id: &TenantId) {
        let mut locks = self.tenant_locks.lock().expect("lock registry poisoned");
        locks.remove(tenant_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RocksStore::open(dir.path()).unwrap());
        (AppState::new(store, ServiceConfig::default()), dir)
    }

    #[test]
    fn release_evicts_the_registry_entry() {
        let (state, _dir) = test_state();
        let tenant_id = TenantId::generate();

        let lock = state.tenant_lock(tenant_id);
        assert_eq!(state.tenant_locks.lock().unwrap().len(), 1);

        state.release_tenant_lock(&tenant_id);
        assert_eq!(state.tenant_locks.lock().unwrap().len(), 0);

        // Existing holders are unaffected and a fresh entry is independent.
        drop(lock);
        let _again = state.tenant_lock(tenant_id);
        assert_eq!(state.tenant_locks.lock().unwrap().len(), 1);
    }

    #[test]
    fn release_of_unknown_tenant_is_a_no_op() {
        let (state, _dir) = test_state();
        state.release_tenant_lock(&TenantId::generate());
        assert!(state.tenant_locks.lock().unwrap().is_empty());
    }
}
