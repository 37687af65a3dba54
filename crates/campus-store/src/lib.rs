//! RocksDB storage layer for the campus platform.
//!
//! Rows live in column families keyed by tenant-scoped binary keys (see
//! [`keys`]), with CBOR-encoded values. Secondary indexes enforce the
//! uniqueness invariants the domain relies on: slugs, tier names per
//! tenant, external price and subscription ids, and the one-current-
//! subscription-per-tenant rule. Multi-key mutations go through a single
//! `WriteBatch` so indexes and rows never diverge.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use campus_core::{
    Bookmark, Chapter, Curriculum, Highlight, HighlightId, Lesson, LessonModule, Note, NoteScope,
    Progress, ProgressNode, SubscriptionId, Tenant, TenantSubscription, UserSubscription,
};
use campus_core::{BillingTier, ChapterId, CurriculumId, LessonId, LessonModuleId, TenantId, TierId, UserId};

/// The storage trait defining all database operations.
///
/// Every method takes the tenant identifier explicitly; there is no
/// ambient "current tenant" state anywhere in the store.
pub trait Store: Send + Sync {
    // =========================================================================
    // Tenants
    // =========================================================================

    /// Create a tenant, claiming its slug atomically.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when the slug is already taken.
    fn create_tenant(&self, tenant: &Tenant) -> Result<()>;

    /// Get a tenant by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_tenant(&self, tenant_id: &TenantId) -> Result<Option<Tenant>>;

    /// Look up a tenant by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>>;

    /// Whether a slug is already claimed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn slug_taken(&self, slug: &str) -> Result<bool>;

    /// Overwrite a tenant record (branding, gateway ids). The slug is
    /// immutable; this method does not touch the slug index.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the tenant does not exist.
    fn update_tenant(&self, tenant: &Tenant) -> Result<()>;

    /// Delete a tenant and every row it owns, in one batch.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the tenant does not exist.
    fn delete_tenant(&self, tenant_id: &TenantId) -> Result<()>;

    // =========================================================================
    // Billing tiers
    // =========================================================================

    /// Create a tier, claiming its per-tenant name and (when present) its
    /// external price id atomically.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` on a duplicate name or external price id.
    fn create_tier(&self, tier: &BillingTier) -> Result<()>;

    /// Get a tier by id within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_tier(&self, tenant_id: &TenantId, tier_id: &TierId) -> Result<Option<BillingTier>>;

    /// List a tenant's tiers.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_tiers(&self, tenant_id: &TenantId) -> Result<Vec<BillingTier>>;

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Create a subscription and, when its status is trial/active, claim
    /// the tenant's current-subscription slot atomically.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when the tenant already has a current
    /// subscription, or when the external subscription id is taken.
    fn create_subscription(&self, subscription: &TenantSubscription) -> Result<()>;

    /// Get a subscription by id within a tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_subscription(
        &self,
        tenant_id: &TenantId,
        subscription_id: &SubscriptionId,
    ) -> Result<Option<TenantSubscription>>;

    /// The tenant's current (trial or active) subscription, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn current_subscription(&self, tenant_id: &TenantId) -> Result<Option<TenantSubscription>>;

    /// Overwrite a subscription row, keeping the current-subscription and
    /// external-id indexes consistent with its new state.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the row does not exist.
    fn update_subscription(&self, subscription: &TenantSubscription) -> Result<()>;

    /// Find a subscription by its gateway subscription id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_by_external_subscription_id(
        &self,
        external_id: &str,
    ) -> Result<Option<TenantSubscription>>;

    /// List a tenant's subscriptions, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_subscriptions(&self, tenant_id: &TenantId) -> Result<Vec<TenantSubscription>>;

    // =========================================================================
    // Seats
    // =========================================================================

    /// Insert or update a seat.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_user_subscription(&self, seat: &UserSubscription) -> Result<()>;

    /// Get a seat.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user_subscription(
        &self,
        subscription_id: &SubscriptionId,
        user_id: &UserId,
    ) -> Result<Option<UserSubscription>>;

    /// List all seats of a subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_user_subscriptions(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<UserSubscription>>;

    /// Count seats with active status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn count_active_users(&self, subscription_id: &SubscriptionId) -> Result<u32>;

    // =========================================================================
    // Content tree
    // =========================================================================

    /// Insert or update a curriculum.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_curriculum(&self, curriculum: &Curriculum) -> Result<()>;

    /// Get a curriculum.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_curriculum(
        &self,
        tenant_id: &TenantId,
        curriculum_id: &CurriculumId,
    ) -> Result<Option<Curriculum>>;

    /// List a tenant's curricula ordered by position.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_curricula(&self, tenant_id: &TenantId) -> Result<Vec<Curriculum>>;

    /// Delete a curriculum and its chapters, lessons, and modules.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the curriculum does not exist.
    fn delete_curriculum(&self, tenant_id: &TenantId, curriculum_id: &CurriculumId) -> Result<()>;

    /// Insert or update a chapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_chapter(&self, chapter: &Chapter) -> Result<()>;

    /// Get a chapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_chapter(
        &self,
        tenant_id: &TenantId,
        curriculum_id: &CurriculumId,
        chapter_id: &ChapterId,
    ) -> Result<Option<Chapter>>;

    /// List a curriculum's chapters ordered by position.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_chapters(
        &self,
        tenant_id: &TenantId,
        curriculum_id: &CurriculumId,
    ) -> Result<Vec<Chapter>>;

    /// Delete a chapter and its lessons and modules.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the chapter does not exist.
    fn delete_chapter(
        &self,
        tenant_id: &TenantId,
        curriculum_id: &CurriculumId,
        chapter_id: &ChapterId,
    ) -> Result<()>;

    /// Insert or update a lesson.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_lesson(&self, lesson: &Lesson) -> Result<()>;

    /// Get a lesson.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_lesson(
        &self,
        tenant_id: &TenantId,
        chapter_id: &ChapterId,
        lesson_id: &LessonId,
    ) -> Result<Option<Lesson>>;

    /// List a chapter's lessons ordered by position.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_lessons(&self, tenant_id: &TenantId, chapter_id: &ChapterId) -> Result<Vec<Lesson>>;

    /// Delete a lesson and its modules.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the lesson does not exist.
    fn delete_lesson(
        &self,
        tenant_id: &TenantId,
        chapter_id: &ChapterId,
        lesson_id: &LessonId,
    ) -> Result<()>;

    /// Insert or update a lesson module.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_module(&self, module: &LessonModule) -> Result<()>;

    /// Get a lesson module.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_module(
        &self,
        tenant_id: &TenantId,
        lesson_id: &LessonId,
        module_id: &LessonModuleId,
    ) -> Result<Option<LessonModule>>;

    /// List a lesson's modules ordered by position.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_modules(&self, tenant_id: &TenantId, lesson_id: &LessonId)
        -> Result<Vec<LessonModule>>;

    /// Delete a lesson module.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the module does not exist.
    fn delete_module(
        &self,
        tenant_id: &TenantId,
        lesson_id: &LessonId,
        module_id: &LessonModuleId,
    ) -> Result<()>;

    // =========================================================================
    // Progress and annotations
    // =========================================================================

    /// Insert or update a progress row (keyed upsert; one row per node).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_progress(&self, progress: &Progress) -> Result<()>;

    /// Get a user's progress on one node.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_progress(
        &self,
        tenant_id: &TenantId,
        user_id: &UserId,
        node: &ProgressNode,
    ) -> Result<Option<Progress>>;

    /// List all progress rows for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_progress(&self, tenant_id: &TenantId, user_id: &UserId) -> Result<Vec<Progress>>;

    /// Insert or update a note (one per scope key).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_note(&self, note: &Note) -> Result<()>;

    /// Get a user's note for one scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_note(
        &self,
        tenant_id: &TenantId,
        user_id: &UserId,
        scope: &NoteScope,
    ) -> Result<Option<Note>>;

    /// List all notes for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_notes(&self, tenant_id: &TenantId, user_id: &UserId) -> Result<Vec<Note>>;

    /// Delete a note.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the note does not exist.
    fn delete_note(
        &self,
        tenant_id: &TenantId,
        user_id: &UserId,
        scope: &NoteScope,
    ) -> Result<()>;

    /// Insert a highlight.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_highlight(&self, highlight: &Highlight) -> Result<()>;

    /// List a user's highlights within a lesson, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_highlights(
        &self,
        tenant_id: &TenantId,
        user_id: &UserId,
        lesson_id: &LessonId,
    ) -> Result<Vec<Highlight>>;

    /// Delete a highlight.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the highlight does not exist.
    fn delete_highlight(
        &self,
        tenant_id: &TenantId,
        user_id: &UserId,
        lesson_id: &LessonId,
        highlight_id: &HighlightId,
    ) -> Result<()>;

    /// Insert a bookmark (keyed upsert; one per lesson).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_bookmark(&self, bookmark: &Bookmark) -> Result<()>;

    /// List a user's bookmarks.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_bookmarks(&self, tenant_id: &TenantId, user_id: &UserId) -> Result<Vec<Bookmark>>;

    /// Delete a bookmark.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the bookmark does not exist.
    fn delete_bookmark(
        &self,
        tenant_id: &TenantId,
        user_id: &UserId,
        lesson_id: &LessonId,
    ) -> Result<()>;
}
