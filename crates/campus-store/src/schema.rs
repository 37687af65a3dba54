//! Column family layout.

/// Column family names.
pub mod cf {
    /// Tenants, keyed by tenant id.
    pub const TENANTS: &str = "tenants";
    /// Slug -> tenant id index.
    pub const TENANT_SLUGS: &str = "tenant_slugs";
    /// Billing tiers, keyed by tenant id || tier id.
    pub const TIERS: &str = "tiers";
    /// Tier name uniqueness index, keyed by tenant id || name.
    pub const TIER_NAMES: &str = "tier_names";
    /// External price id uniqueness index.
    pub const EXTERNAL_PRICES: &str = "external_prices";
    /// Subscriptions, keyed by tenant id || subscription id.
    pub const SUBSCRIPTIONS: &str = "subscriptions";
    /// Current-subscription index, keyed by tenant id.
    pub const CURRENT_SUBSCRIPTIONS: &str = "current_subscriptions";
    /// External subscription id -> subscription key index.
    pub const EXTERNAL_SUBSCRIPTIONS: &str = "external_subscriptions";
    /// Per-user seats, keyed by subscription id || user id.
    pub const USER_SUBSCRIPTIONS: &str = "user_subscriptions";
    /// Curricula, keyed by tenant id || curriculum id.
    pub const CURRICULA: &str = "curricula";
    /// Chapters, keyed by tenant id || curriculum id || chapter id.
    pub const CHAPTERS: &str = "chapters";
    /// Lessons, keyed by tenant id || chapter id || lesson id.
    pub const LESSONS: &str = "lessons";
    /// Lesson modules, keyed by tenant id || lesson id || module id.
    pub const MODULES: &str = "modules";
    /// Progress rows, keyed by tenant id || user id || node.
    pub const PROGRESS: &str = "progress";
    /// Notes, keyed by tenant id || user id || scope.
    pub const NOTES: &str = "notes";
    /// Highlights, keyed by tenant id || user id || lesson id || highlight id.
    pub const HIGHLIGHTS: &str = "highlights";
    /// Bookmarks, keyed by tenant id || user id || lesson id.
    pub const BOOKMARKS: &str = "bookmarks";
}

/// All column families, for opening the database.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::TENANTS,
        cf::TENANT_SLUGS,
        cf::TIERS,
        cf::TIER_NAMES,
        cf::EXTERNAL_PRICES,
        cf::SUBSCRIPTIONS,
        cf::CURRENT_SUBSCRIPTIONS,
        cf::EXTERNAL_SUBSCRIPTIONS,
        cf::USER_SUBSCRIPTIONS,
        cf::CURRICULA,
        cf::CHAPTERS,
        cf::LESSONS,
        cf::MODULES,
        cf::PROGRESS,
        cf::NOTES,
        cf::HIGHLIGHTS,
        cf::BOOKMARKS,
    ]
}
