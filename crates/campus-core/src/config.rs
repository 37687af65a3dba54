//! Billing configuration: the plan catalog and billing durations.
//!
//! The configuration is a process-wide snapshot, lazily parsed on first
//! access from `CAMPUS_BILLING_CONFIG` (a JSON file path) or, when unset,
//! from the embedded catalog. A missing or malformed resource is logged
//! and replaced by a minimal trial-only configuration; loading never fails
//! to the caller. `reload()` swaps the snapshot atomically, so readers
//! always see either the old or the new catalog, never a mix.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock, RwLock};

use serde::{Deserialize, Serialize};

use crate::tier::TierKind;

/// Environment variable naming an external catalog file.
pub const BILLING_CONFIG_ENV: &str = "CAMPUS_BILLING_CONFIG";

/// Embedded default catalog.
const EMBEDDED_CATALOG: &str = include_str!("billing_catalog.json");

/// Catalog key of the trial tier.
const TRIAL_TIER_KEY: &str = "trial";

static CURRENT: OnceLock<RwLock<Arc<BillingConfiguration>>> = OnceLock::new();

/// One tier definition in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierDefinition {
    /// Display name.
    pub name: String,

    /// Tier kind.
    pub kind: TierKind,

    /// Flat monthly price in cents.
    pub monthly_price_cents: i64,

    /// Per-user monthly price in cents.
    pub per_user_price_cents: i64,

    /// Maximum active users, `null` = unlimited.
    pub user_limit: Option<u32>,

    /// Included feature flags.
    #[serde(default)]
    pub features: Vec<String>,

    /// Catalog description shown during signup.
    #[serde(default)]
    pub description: String,
}

/// The plan catalog plus billing-related durations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingConfiguration {
    /// Trial length in days.
    pub trial_duration_days: i64,

    /// Invitation expiry in days.
    pub invitation_expiry_days: i64,

    /// Supported payment method identifiers.
    pub payment_methods: Vec<String>,

    /// Supported ISO currency codes.
    pub currencies: Vec<String>,

    /// Tier catalog keyed by exact, case-sensitive key.
    pub tiers: BTreeMap<String, TierDefinition>,
}

impl BillingConfiguration {
    /// The process-wide configuration snapshot.
    ///
    /// Parses the resource on first call; subsequent calls are a cheap
    /// `Arc` clone until [`BillingConfiguration::reload`] replaces it.
    #[must_use]
    pub fn current() -> Arc<Self> {
        let lock = CURRENT.get_or_init(|| RwLock::new(Arc::new(Self::load())));
        match lock.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Re-parse the resource and swap the snapshot atomically.
    pub fn reload() {
        let fresh = Arc::new(Self::load());
        let lock = CURRENT.get_or_init(|| RwLock::new(Arc::clone(&fresh)));
        match lock.write() {
            Ok(mut guard) => *guard = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
    }

    /// The full tier catalog.
    #[must_use]
    pub fn tiers(&self) -> &BTreeMap<String, TierDefinition> {
        &self.tiers
    }

    /// Look up a tier by exact, case-sensitive catalog key.
    #[must_use]
    pub fn get_tier(&self, key: &str) -> Option<&TierDefinition> {
        self.tiers.get(key)
    }

    /// The trial tier definition, if the catalog carries one.
    #[must_use]
    pub fn trial_tier(&self) -> Option<&TierDefinition> {
        self.get_tier(TRIAL_TIER_KEY)
    }

    /// Load from the external path when configured, else the embedded
    /// catalog, falling back to the minimal configuration on any fault.
    fn load() -> Self {
        let source = match std::env::var(BILLING_CONFIG_ENV) {
            Ok(path) => match std::fs::read_to_string(&path) {
                Ok(contents) => {
                    tracing::info!(path = %path, "loaded billing catalog from file");
                    contents
                }
                Err(e) => {
                    tracing::error!(
                        path = %path,
                        error = %e,
                        "billing catalog file unreadable, using fallback configuration"
                    );
                    return Self::fallback();
                }
            },
            Err(_) => EMBEDDED_CATALOG.to_string(),
        };

        Self::parse(&source).unwrap_or_else(|e| {
            tracing::error!(error = %e, "billing catalog malformed, using fallback configuration");
            Self::fallback()
        })
    }

    /// Parse a catalog document.
    ///
    /// # Errors
    ///
    /// Returns the underlying JSON error when the document is malformed.
    pub fn parse(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// Minimal trial-only configuration used when the resource is broken.
    #[must_use]
    pub fn fallback() -> Self {
        let mut tiers = BTreeMap::new();
        tiers.insert(
            TRIAL_TIER_KEY.to_string(),
            TierDefinition {
                name: "Trial".to_string(),
                kind: TierKind::Trial,
                monthly_price_cents: 0,
                per_user_price_cents: 0,
                user_limit: Some(10),
                features: Vec::new(),
                description: String::new(),
            },
        );
        Self {
            trial_duration_days: 30,
            invitation_expiry_days: 14,
            payment_methods: vec!["card".to_string()],
            currencies: vec!["usd".to_string()],
            tiers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn embedded_catalog_parses() {
        let config = BillingConfiguration::parse(EMBEDDED_CATALOG).unwrap();
        assert_eq!(config.trial_duration_days, 30);
        assert!(config.trial_tier().is_some());
        assert_eq!(config.trial_tier().unwrap().user_limit, Some(10));
    }

    #[test]
    fn tier_lookup_is_exact_and_case_sensitive() {
        let config = BillingConfiguration::parse(EMBEDDED_CATALOG).unwrap();
        assert!(config.get_tier("starter").is_some());
        assert!(config.get_tier("Starter").is_none());
        assert!(config.get_tier("STARTER").is_none());
        assert!(config.get_tier(" starter").is_none());
    }

    #[test]
    fn fallback_is_trial_only() {
        let config = BillingConfiguration::fallback();
        assert_eq!(config.tiers().len(), 1);
        let trial = config.trial_tier().unwrap();
        assert_eq!(trial.kind, TierKind::Trial);
        assert_eq!(trial.monthly_price_cents, 0);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(BillingConfiguration::parse("{not json").is_err());
    }

    #[test]
    fn parse_file_roundtrip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EMBEDDED_CATALOG.as_bytes()).unwrap();
        let contents = std::fs::read_to_string(file.path()).unwrap();
        let config = BillingConfiguration::parse(&contents).unwrap();
        assert_eq!(config.get_tier("growth").unwrap().monthly_price_cents, 9000);
    }

    #[test]
    fn current_and_reload_share_one_snapshot() {
        // Both calls go through the same singleton; reload must not panic
        // and current() must keep returning a usable snapshot.
        let before = BillingConfiguration::current();
        assert!(before.trial_tier().is_some());
        BillingConfiguration::reload();
        let after = BillingConfiguration::current();
        assert!(after.trial_tier().is_some());
    }
}
