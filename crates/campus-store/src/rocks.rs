//! `RocksDB` storage implementation.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use campus_core::{
    BillingTier, Bookmark, Chapter, ChapterId, Curriculum, CurriculumId, Highlight, HighlightId,
    Lesson, LessonId, LessonModule, LessonModuleId, Note, NoteScope, Progress, ProgressNode,
    SubscriptionId, Tenant, TenantId, TenantSubscription, TierId, UserId, UserSubscription,
    UserSubscriptionStatus,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get_raw(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_value<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        self.get_raw(cf_name, key)?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn put_value<T: serde::Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let data = Self::serialize(value)?;
        self.db
            .put_cf(&cf, key, data)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Collect all (key, value) pairs under a prefix.
    fn scan_prefix(&self, cf_name: &str, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let cf = self.cf(cf_name)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, rocksdb::Direction::Forward));

        let mut entries = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            entries.push((key.to_vec(), value.to_vec()));
        }
        Ok(entries)
    }

    /// Deserialize every value under a prefix.
    fn scan_values<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        prefix: &[u8],
    ) -> Result<Vec<T>> {
        self.scan_prefix(cf_name, prefix)?
            .into_iter()
            .map(|(_, value)| Self::deserialize(&value))
            .collect()
    }

    /// Queue deletion of every key under a prefix.
    fn delete_prefix(&self, batch: &mut WriteBatch, cf_name: &str, prefix: &[u8]) -> Result<()> {
        let cf = self.cf(cf_name)?;
        for (key, _) in self.scan_prefix(cf_name, prefix)? {
            batch.delete_cf(&cf, key);
        }
        Ok(())
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Tenants
    // =========================================================================

    fn create_tenant(&self, tenant: &Tenant) -> Result<()> {
        let slug_key = keys::slug_key(&tenant.slug);
        if self.get_raw(cf::TENANT_SLUGS, &slug_key)?.is_some() {
            return Err(StoreError::Conflict(format!(
                "slug already taken: {}",
                tenant.slug
            )));
        }

        let cf_tenants = self.cf(cf::TENANTS)?;
        let cf_slugs = self.cf(cf::TENANT_SLUGS)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_tenants, keys::tenant_key(&tenant.id), Self::serialize(tenant)?);
        batch.put_cf(&cf_slugs, slug_key, tenant.id.as_bytes());
        self.write(batch)
    }

    fn get_tenant(&self, tenant_id: &TenantId) -> Result<Option<Tenant>> {
        self.get_value(cf::TENANTS, &keys::tenant_key(tenant_id))
    }

    fn find_tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>> {
        let Some(id_bytes) = self.get_raw(cf::TENANT_SLUGS, &keys::slug_key(slug))? else {
            return Ok(None);
        };
        if id_bytes.len() != 16 {
            return Err(StoreError::Serialization("malformed slug index entry".into()));
        }
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&id_bytes);
        let tenant_id = TenantId::from_uuid(uuid::Uuid::from_bytes(bytes));
        self.get_tenant(&tenant_id)
    }

    fn slug_taken(&self, slug: &str) -> Result<bool> {
        Ok(self.get_raw(cf::TENANT_SLUGS, &keys::slug_key(slug))?.is_some())
    }

    fn update_tenant(&self, tenant: &Tenant) -> Result<()> {
        if self.get_tenant(&tenant.id)?.is_none() {
            return Err(StoreError::not_found("tenant", tenant.id));
        }
        self.put_value(cf::TENANTS, &keys::tenant_key(&tenant.id), tenant)
    }

    fn delete_tenant(&self, tenant_id: &TenantId) -> Result<()> {
        let tenant = self
            .get_tenant(tenant_id)?
            .ok_or_else(|| StoreError::not_found("tenant", tenant_id))?;

        let mut batch = WriteBatch::default();

        let cf_tenants = self.cf(cf::TENANTS)?;
        let cf_slugs = self.cf(cf::TENANT_SLUGS)?;
        batch.delete_cf(&cf_tenants, keys::tenant_key(tenant_id));
        batch.delete_cf(&cf_slugs, keys::slug_key(&tenant.slug));

        // Tiers and their external price index entries.
        let cf_prices = self.cf(cf::EXTERNAL_PRICES)?;
        for tier in self.scan_values::<BillingTier>(cf::TIERS, &keys::tier_prefix(tenant_id))? {
            if let Some(price_id) = &tier.external_price_id {
                batch.delete_cf(&cf_prices, keys::external_price_key(price_id));
            }
        }
        self.delete_prefix(&mut batch, cf::TIERS, &keys::tier_prefix(tenant_id))?;
        self.delete_prefix(&mut batch, cf::TIER_NAMES, tenant_id.as_bytes())?;

        // Subscriptions, seats, and their external id entries.
        let cf_external = self.cf(cf::EXTERNAL_SUBSCRIPTIONS)?;
        for sub in self
            .scan_values::<TenantSubscription>(cf::SUBSCRIPTIONS, &keys::subscription_prefix(tenant_id))?
        {
            if let Some(external_id) = &sub.external_subscription_id {
                batch.delete_cf(&cf_external, keys::external_subscription_key(external_id));
            }
            self.delete_prefix(
                &mut batch,
                cf::USER_SUBSCRIPTIONS,
                &keys::user_subscription_prefix(&sub.id),
            )?;
        }
        self.delete_prefix(&mut batch, cf::SUBSCRIPTIONS, &keys::subscription_prefix(tenant_id))?;
        let cf_current = self.cf(cf::CURRENT_SUBSCRIPTIONS)?;
        batch.delete_cf(&cf_current, keys::current_subscription_key(tenant_id));

        // Content tree and annotations: every CF is tenant-prefixed.
        for cf_name in [
            cf::CURRICULA,
            cf::CHAPTERS,
            cf::LESSONS,
            cf::MODULES,
            cf::PROGRESS,
            cf::NOTES,
            cf::HIGHLIGHTS,
            cf::BOOKMARKS,
        ] {
            self.delete_prefix(&mut batch, cf_name, tenant_id.as_bytes())?;
        }

        self.write(batch)
    }

    // =========================================================================
    // Billing tiers
    // =========================================================================

    fn create_tier(&self, tier: &BillingTier) -> Result<()> {
        let name_key = keys::tier_name_key(&tier.tenant_id, &tier.name);
        if self.get_raw(cf::TIER_NAMES, &name_key)?.is_some() {
            return Err(StoreError::Conflict(format!(
                "tier name already exists: {}",
                tier.name
            )));
        }
        if let Some(price_id) = &tier.external_price_id {
            if self
                .get_raw(cf::EXTERNAL_PRICES, &keys::external_price_key(price_id))?
                .is_some()
            {
                return Err(StoreError::Conflict(format!(
                    "external price id already exists: {price_id}"
                )));
            }
        }

        let cf_tiers = self.cf(cf::TIERS)?;
        let cf_names = self.cf(cf::TIER_NAMES)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_tiers,
            keys::tier_key(&tier.tenant_id, &tier.id),
            Self::serialize(tier)?,
        );
        batch.put_cf(&cf_names, name_key, tier.id.as_bytes());
        if let Some(price_id) = &tier.external_price_id {
            let cf_prices = self.cf(cf::EXTERNAL_PRICES)?;
            batch.put_cf(&cf_prices, keys::external_price_key(price_id), tier.id.as_bytes());
        }
        self.write(batch)
    }

    fn get_tier(&self, tenant_id: &TenantId, tier_id: &TierId) -> Result<Option<BillingTier>> {
        self.get_value(cf::TIERS, &keys::tier_key(tenant_id, tier_id))
    }

    fn list_tiers(&self, tenant_id: &TenantId) -> Result<Vec<BillingTier>> {
        let mut tiers: Vec<BillingTier> =
            self.scan_values(cf::TIERS, &keys::tier_prefix(tenant_id))?;
        tiers.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tiers)
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    fn create_subscription(&self, subscription: &TenantSubscription) -> Result<()> {
        // The current-subscription slot is the uniqueness point: while an
        // index entry exists the tenant already has a trial/active row and
        // a second creation is a conflict, not a new row.
        let current_key = keys::current_subscription_key(&subscription.tenant_id);
        if subscription.status.is_current()
            && self.get_raw(cf::CURRENT_SUBSCRIPTIONS, &current_key)?.is_some()
        {
            return Err(StoreError::Conflict(
                "tenant already has a current subscription".into(),
            ));
        }
        if let Some(external_id) = &subscription.external_subscription_id {
            if self
                .get_raw(
                    cf::EXTERNAL_SUBSCRIPTIONS,
                    &keys::external_subscription_key(external_id),
                )?
                .is_some()
            {
                return Err(StoreError::Conflict(format!(
                    "external subscription id already exists: {external_id}"
                )));
            }
        }

        let row_key = keys::subscription_key(&subscription.tenant_id, &subscription.id);
        let cf_subs = self.cf(cf::SUBSCRIPTIONS)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_subs, &row_key, Self::serialize(subscription)?);
        if subscription.status.is_current() {
            let cf_current = self.cf(cf::CURRENT_SUBSCRIPTIONS)?;
            batch.put_cf(&cf_current, &current_key, subscription.id.to_bytes());
        }
        if let Some(external_id) = &subscription.external_subscription_id {
            let cf_external = self.cf(cf::EXTERNAL_SUBSCRIPTIONS)?;
            batch.put_cf(
                &cf_external,
                keys::external_subscription_key(external_id),
                &row_key,
            );
        }
        self.write(batch)
    }

    fn get_subscription(
        &self,
        tenant_id: &TenantId,
        subscription_id: &SubscriptionId,
    ) -> Result<Option<TenantSubscription>> {
        self.get_value(cf::SUBSCRIPTIONS, &keys::subscription_key(tenant_id, subscription_id))
    }

    fn current_subscription(&self, tenant_id: &TenantId) -> Result<Option<TenantSubscription>> {
        let Some(id_bytes) =
            self.get_raw(cf::CURRENT_SUBSCRIPTIONS, &keys::current_subscription_key(tenant_id))?
        else {
            return Ok(None);
        };
        if id_bytes.len() != 16 {
            return Err(StoreError::Serialization(
                "malformed current-subscription index entry".into(),
            ));
        }
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&id_bytes);
        let subscription_id = SubscriptionId::from_bytes(bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.get_subscription(tenant_id, &subscription_id)
    }

    fn update_subscription(&self, subscription: &TenantSubscription) -> Result<()> {
        let row_key = keys::subscription_key(&subscription.tenant_id, &subscription.id);
        if self.get_raw(cf::SUBSCRIPTIONS, &row_key)?.is_none() {
            return Err(StoreError::not_found("subscription", subscription.id));
        }

        let cf_subs = self.cf(cf::SUBSCRIPTIONS)?;
        let cf_current = self.cf(cf::CURRENT_SUBSCRIPTIONS)?;
        let current_key = keys::current_subscription_key(&subscription.tenant_id);

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_subs, &row_key, Self::serialize(subscription)?);

        if subscription.status.is_current() {
            batch.put_cf(&cf_current, &current_key, subscription.id.to_bytes());
        } else if let Some(id_bytes) = self.get_raw(cf::CURRENT_SUBSCRIPTIONS, &current_key)? {
            // Release the slot only if it still points at this row.
            if id_bytes == subscription.id.to_bytes() {
                batch.delete_cf(&cf_current, &current_key);
            }
        }

        if let Some(external_id) = &subscription.external_subscription_id {
            let cf_external = self.cf(cf::EXTERNAL_SUBSCRIPTIONS)?;
            batch.put_cf(
                &cf_external,
                keys::external_subscription_key(external_id),
                &row_key,
            );
        }

        self.write(batch)
    }

    fn find_by_external_subscription_id(
        &self,
        external_id: &str,
    ) -> Result<Option<TenantSubscription>> {
        let Some(row_key) = self.get_raw(
            cf::EXTERNAL_SUBSCRIPTIONS,
            &keys::external_subscription_key(external_id),
        )?
        else {
            return Ok(None);
        };
        self.get_raw(cf::SUBSCRIPTIONS, &row_key)?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_subscriptions(&self, tenant_id: &TenantId) -> Result<Vec<TenantSubscription>> {
        // ULID key segments keep the scan in creation order.
        self.scan_values(cf::SUBSCRIPTIONS, &keys::subscription_prefix(tenant_id))
    }

    // =========================================================================
    // Seats
    // =========================================================================

    fn put_user_subscription(&self, seat: &UserSubscription) -> Result<()> {
        self.put_value(
            cf::USER_SUBSCRIPTIONS,
            &keys::user_subscription_key(&seat.subscription_id, &seat.user_id),
            seat,
        )
    }

    fn get_user_subscription(
        &self,
        subscription_id: &SubscriptionId,
        user_id: &UserId,
    ) -> Result<Option<UserSubscription>> {
        self.get_value(
            cf::USER_SUBSCRIPTIONS,
            &keys::user_subscription_key(subscription_id, user_id),
        )
    }

    fn list_user_subscriptions(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<UserSubscription>> {
        self.scan_values(
            cf::USER_SUBSCRIPTIONS,
            &keys::user_subscription_prefix(subscription_id),
        )
    }

    fn count_active_users(&self, subscription_id: &SubscriptionId) -> Result<u32> {
        let seats = self.list_user_subscriptions(subscription_id)?;
        let count = seats
            .iter()
            .filter(|s| s.status == UserSubscriptionStatus::Active)
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    // =========================================================================
    // Content tree
    // =========================================================================

    fn put_curriculum(&self, curriculum: &Curriculum) -> Result<()> {
        self.put_value(
            cf::CURRICULA,
            &keys::curriculum_key(&curriculum.tenant_id, &curriculum.id),
            curriculum,
        )
    }

    fn get_curriculum(
        &self,
        tenant_id: &TenantId,
        curriculum_id: &CurriculumId,
    ) -> Result<Option<Curriculum>> {
        self.get_value(cf::CURRICULA, &keys::curriculum_key(tenant_id, curriculum_id))
    }

    fn list_curricula(&self, tenant_id: &TenantId) -> Result<Vec<Curriculum>> {
        let mut rows: Vec<Curriculum> =
            self.scan_values(cf::CURRICULA, &keys::curriculum_prefix(tenant_id))?;
        rows.sort_by_key(|c| c.position);
        Ok(rows)
    }

    fn delete_curriculum(&self, tenant_id: &TenantId, curriculum_id: &CurriculumId) -> Result<()> {
        if self.get_curriculum(tenant_id, curriculum_id)?.is_none() {
            return Err(StoreError::not_found("curriculum", curriculum_id));
        }

        let mut batch = WriteBatch::default();
        let cf_curricula = self.cf(cf::CURRICULA)?;
        batch.delete_cf(&cf_curricula, keys::curriculum_key(tenant_id, curriculum_id));

        for chapter in
            self.scan_values::<Chapter>(cf::CHAPTERS, &keys::chapter_prefix(tenant_id, curriculum_id))?
        {
            self.queue_chapter_subtree_delete(&mut batch, tenant_id, &chapter)?;
        }
        self.delete_prefix(&mut batch, cf::CHAPTERS, &keys::chapter_prefix(tenant_id, curriculum_id))?;
        self.write(batch)
    }

    fn put_chapter(&self, chapter: &Chapter) -> Result<()> {
        self.put_value(
            cf::CHAPTERS,
            &keys::chapter_key(&chapter.tenant_id, &chapter.curriculum_id, &chapter.id),
            chapter,
        )
    }

    fn get_chapter(
        &self,
        tenant_id: &TenantId,
        curriculum_id: &CurriculumId,
        chapter_id: &ChapterId,
    ) -> Result<Option<Chapter>> {
        self.get_value(cf::CHAPTERS, &keys::chapter_key(tenant_id, curriculum_id, chapter_id))
    }

    fn list_chapters(
        &self,
        tenant_id: &TenantId,
        curriculum_id: &CurriculumId,
    ) -> Result<Vec<Chapter>> {
        let mut rows: Vec<Chapter> =
            self.scan_values(cf::CHAPTERS, &keys::chapter_prefix(tenant_id, curriculum_id))?;
        rows.sort_by_key(|c| c.position);
        Ok(rows)
    }

    fn delete_chapter(
        &self,
        tenant_id: &TenantId,
        curriculum_id: &CurriculumId,
        chapter_id: &ChapterId,
    ) -> Result<()> {
        let chapter = self
            .get_chapter(tenant_id, curriculum_id, chapter_id)?
            .ok_or_else(|| StoreError::not_found("chapter", chapter_id))?;

        let mut batch = WriteBatch::default();
        let cf_chapters = self.cf(cf::CHAPTERS)?;
        batch.delete_cf(&cf_chapters, keys::chapter_key(tenant_id, curriculum_id, chapter_id));
        self.queue_chapter_subtree_delete(&mut batch, tenant_id, &chapter)?;
        self.write(batch)
    }

    fn put_lesson(&self, lesson: &Lesson) -> Result<()> {
        self.put_value(
            cf::LESSONS,
            &keys::lesson_key(&lesson.tenant_id, &lesson.chapter_id, &lesson.id),
            lesson,
        )
    }

    fn get_lesson(
        &self,
        tenant_id: &TenantId,
        chapter_id: &ChapterId,
        lesson_id: &LessonId,
    ) -> Result<Option<Lesson>> {
        self.get_value(cf::LESSONS, &keys::lesson_key(tenant_id, chapter_id, lesson_id))
    }

    fn list_lessons(&self, tenant_id: &TenantId, chapter_id: &ChapterId) -> Result<Vec<Lesson>> {
        let mut rows: Vec<Lesson> =
            self.scan_values(cf::LESSONS, &keys::lesson_prefix(tenant_id, chapter_id))?;
        rows.sort_by_key(|l| l.position);
        Ok(rows)
    }

    fn delete_lesson(
        &self,
        tenant_id: &TenantId,
        chapter_id: &ChapterId,
        lesson_id: &LessonId,
    ) -> Result<()> {
        if self.get_lesson(tenant_id, chapter_id, lesson_id)?.is_none() {
            return Err(StoreError::not_found("lesson", lesson_id));
        }

        let mut batch = WriteBatch::default();
        let cf_lessons = self.cf(cf::LESSONS)?;
        batch.delete_cf(&cf_lessons, keys::lesson_key(tenant_id, chapter_id, lesson_id));
        self.delete_prefix(&mut batch, cf::MODULES, &keys::module_prefix(tenant_id, lesson_id))?;
        self.write(batch)
    }

    fn put_module(&self, module: &LessonModule) -> Result<()> {
        self.put_value(
            cf::MODULES,
            &keys::module_key(&module.tenant_id, &module.lesson_id, &module.id),
            module,
        )
    }

    fn get_module(
        &self,
        tenant_id: &TenantId,
        lesson_id: &LessonId,
        module_id: &LessonModuleId,
    ) -> Result<Option<LessonModule>> {
        self.get_value(cf::MODULES, &keys::module_key(tenant_id, lesson_id, module_id))
    }

    fn list_modules(
        &self,
        tenant_id: &TenantId,
        lesson_id: &LessonId,
    ) -> Result<Vec<LessonModule>> {
        let mut rows: Vec<LessonModule> =
            self.scan_values(cf::MODULES, &keys::module_prefix(tenant_id, lesson_id))?;
        rows.sort_by_key(|m| m.position);
        Ok(rows)
    }

    fn delete_module(
        &self,
        tenant_id: &TenantId,
        lesson_id: &LessonId,
        module_id: &LessonModuleId,
    ) -> Result<()> {
        let key = keys::module_key(tenant_id, lesson_id, module_id);
        if self.get_raw(cf::MODULES, &key)?.is_none() {
            return Err(StoreError::not_found("module", module_id));
        }
        let cf_modules = self.cf(cf::MODULES)?;
        self.db
            .delete_cf(&cf_modules, key)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    // =========================================================================
    // Progress and annotations
    // =========================================================================

    fn put_progress(&self, progress: &Progress) -> Result<()> {
        self.put_value(
            cf::PROGRESS,
            &keys::progress_key(&progress.tenant_id, &progress.user_id, &progress.node),
            progress,
        )
    }

    fn get_progress(
        &self,
        tenant_id: &TenantId,
        user_id: &UserId,
        node: &ProgressNode,
    ) -> Result<Option<Progress>> {
        self.get_value(cf::PROGRESS, &keys::progress_key(tenant_id, user_id, node))
    }

    fn list_progress(&self, tenant_id: &TenantId, user_id: &UserId) -> Result<Vec<Progress>> {
        self.scan_values(cf::PROGRESS, &keys::progress_prefix(tenant_id, user_id))
    }

    fn put_note(&self, note: &Note) -> Result<()> {
        self.put_value(
            cf::NOTES,
            &keys::note_key(&note.tenant_id, &note.user_id, &note.scope),
            note,
        )
    }

    fn get_note(
        &self,
        tenant_id: &TenantId,
        user_id: &UserId,
        scope: &NoteScope,
    ) -> Result<Option<Note>> {
        self.get_value(cf::NOTES, &keys::note_key(tenant_id, user_id, scope))
    }

    fn list_notes(&self, tenant_id: &TenantId, user_id: &UserId) -> Result<Vec<Note>> {
        self.scan_values(cf::NOTES, &keys::note_prefix(tenant_id, user_id))
    }

    fn delete_note(&self, tenant_id: &TenantId, user_id: &UserId, scope: &NoteScope) -> Result<()> {
        let key = keys::note_key(tenant_id, user_id, scope);
        if self.get_raw(cf::NOTES, &key)?.is_none() {
            return Err(StoreError::not_found("note", user_id));
        }
        let cf_notes = self.cf(cf::NOTES)?;
        self.db
            .delete_cf(&cf_notes, key)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn put_highlight(&self, highlight: &Highlight) -> Result<()> {
        self.put_value(
            cf::HIGHLIGHTS,
            &keys::highlight_key(
                &highlight.tenant_id,
                &highlight.user_id,
                &highlight.lesson_id,
                &highlight.id,
            ),
            highlight,
        )
    }

    fn list_highlights(
        &self,
        tenant_id: &TenantId,
        user_id: &UserId,
        lesson_id: &LessonId,
    ) -> Result<Vec<Highlight>> {
        self.scan_values(cf::HIGHLIGHTS, &keys::highlight_prefix(tenant_id, user_id, lesson_id))
    }

    fn delete_highlight(
        &self,
        tenant_id: &TenantId,
        user_id: &UserId,
        lesson_id: &LessonId,
        highlight_id: &HighlightId,
    ) -> Result<()> {
        let key = keys::highlight_key(tenant_id, user_id, lesson_id, highlight_id);
        if self.get_raw(cf::HIGHLIGHTS, &key)?.is_none() {
            return Err(StoreError::not_found("highlight", highlight_id));
        }
        let cf_highlights = self.cf(cf::HIGHLIGHTS)?;
        self.db
            .delete_cf(&cf_highlights, key)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn put_bookmark(&self, bookmark: &Bookmark) -> Result<()> {
        self.put_value(
            cf::BOOKMARKS,
            &keys::bookmark_key(&bookmark.tenant_id, &bookmark.user_id, &bookmark.lesson_id),
            bookmark,
        )
    }

    fn list_bookmarks(&self, tenant_id: &TenantId, user_id: &UserId) -> Result<Vec<Bookmark>> {
        self.scan_values(cf::BOOKMARKS, &keys::bookmark_prefix(tenant_id, user_id))
    }

    fn delete_bookmark(
        &self,
        tenant_id: &TenantId,
        user_id: &UserId,
        lesson_id: &LessonId,
    ) -> Result<()> {
        let key = keys::bookmark_key(tenant_id, user_id, lesson_id);
        if self.get_raw(cf::BOOKMARKS, &key)?.is_none() {
            return Err(StoreError::not_found("bookmark", lesson_id));
        }
        let cf_bookmarks = self.cf(cf::BOOKMARKS)?;
        self.db
            .delete_cf(&cf_bookmarks, key)
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

impl RocksStore {
    /// Queue deletion of a chapter's lessons and their modules.
    fn queue_chapter_subtree_delete(
        &self,
        batch: &mut WriteBatch,
        tenant_id: &TenantId,
        chapter: &Chapter,
    ) -> Result<()> {
        for lesson in
            self.scan_values::<Lesson>(cf::LESSONS, &keys::lesson_prefix(tenant_id, &chapter.id))?
        {
            self.delete_prefix(batch, cf::MODULES, &keys::module_prefix(tenant_id, &lesson.id))?;
        }
        self.delete_prefix(batch, cf::LESSONS, &keys::lesson_prefix(tenant_id, &chapter.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_core::{ModuleBody, SubscriptionStatus, TierKind};
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn test_tenant() -> Tenant {
        Tenant::new("Acme Corp", format!("acme-{}", &TenantId::generate().to_string()[..8]))
            .unwrap()
    }

    fn test_tier(tenant_id: TenantId) -> BillingTier {
        BillingTier::new(tenant_id, "Starter", TierKind::Standard, 3000, 300, Some(25)).unwrap()
    }

    #[test]
    fn tenant_crud_and_slug_index() {
        let (store, _dir) = create_test_store();
        let tenant = Tenant::new("Acme", "acme").unwrap();

        store.create_tenant(&tenant).unwrap();
        assert!(store.slug_taken("acme").unwrap());
        assert!(!store.slug_taken("other").unwrap());

        let by_slug = store.find_tenant_by_slug("acme").unwrap().unwrap();
        assert_eq!(by_slug.id, tenant.id);

        // Slug is claimed: a second tenant with the same slug conflicts.
        let dup = Tenant::new("Other", "acme").unwrap();
        assert!(matches!(
            store.create_tenant(&dup),
            Err(StoreError::Conflict(_))
        ));

        store.delete_tenant(&tenant.id).unwrap();
        assert!(store.get_tenant(&tenant.id).unwrap().is_none());
        assert!(!store.slug_taken("acme").unwrap());
    }

    #[test]
    fn tier_name_unique_per_tenant() {
        let (store, _dir) = create_test_store();
        let tenant = test_tenant();
        store.create_tenant(&tenant).unwrap();

        store.create_tier(&test_tier(tenant.id)).unwrap();
        assert!(matches!(
            store.create_tier(&test_tier(tenant.id)),
            Err(StoreError::Conflict(_))
        ));

        // Same name under a different tenant is fine.
        let other = test_tenant();
        store.create_tenant(&other).unwrap();
        store.create_tier(&test_tier(other.id)).unwrap();
    }

    #[test]
    fn external_price_id_unique_across_tenants() {
        let (store, _dir) = create_test_store();
        let a = test_tenant();
        let b = test_tenant();
        store.create_tenant(&a).unwrap();
        store.create_tenant(&b).unwrap();

        let mut tier_a = test_tier(a.id);
        tier_a.external_price_id = Some("price_123".into());
        store.create_tier(&tier_a).unwrap();

        let mut tier_b = test_tier(b.id);
        tier_b.external_price_id = Some("price_123".into());
        assert!(matches!(
            store.create_tier(&tier_b),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn one_current_subscription_per_tenant() {
        let (store, _dir) = create_test_store();
        let tenant = test_tenant();
        store.create_tenant(&tenant).unwrap();
        let tier = test_tier(tenant.id);
        store.create_tier(&tier).unwrap();

        let sub = TenantSubscription::start_trial(tenant.id, tier.id, 30);
        store.create_subscription(&sub).unwrap();

        let current = store.current_subscription(&tenant.id).unwrap().unwrap();
        assert_eq!(current.id, sub.id);

        // Second current row is a conflict.
        let second = TenantSubscription::start_trial(tenant.id, tier.id, 30);
        assert!(matches!(
            store.create_subscription(&second),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn cancel_releases_current_slot() {
        let (store, _dir) = create_test_store();
        let tenant = test_tenant();
        store.create_tenant(&tenant).unwrap();
        let tier = test_tier(tenant.id);
        store.create_tier(&tier).unwrap();

        let mut sub = TenantSubscription::start_trial(tenant.id, tier.id, 30);
        store.create_subscription(&sub).unwrap();

        sub.status = SubscriptionStatus::Canceled;
        store.update_subscription(&sub).unwrap();
        assert!(store.current_subscription(&tenant.id).unwrap().is_none());

        // The row itself survives cancellation.
        let row = store.get_subscription(&tenant.id, &sub.id).unwrap().unwrap();
        assert_eq!(row.status, SubscriptionStatus::Canceled);

        // And the tenant may start a new subscription afterwards.
        let next = TenantSubscription::start_trial(tenant.id, tier.id, 30);
        store.create_subscription(&next).unwrap();
    }

    #[test]
    fn find_by_external_subscription_id() {
        let (store, _dir) = create_test_store();
        let tenant = test_tenant();
        store.create_tenant(&tenant).unwrap();
        let tier = test_tier(tenant.id);
        store.create_tier(&tier).unwrap();

        let mut sub = TenantSubscription::start_trial(tenant.id, tier.id, 30);
        store.create_subscription(&sub).unwrap();
        assert!(store
            .find_by_external_subscription_id("sub_ext_1")
            .unwrap()
            .is_none());

        sub.external_subscription_id = Some("sub_ext_1".into());
        store.update_subscription(&sub).unwrap();

        let found = store
            .find_by_external_subscription_id("sub_ext_1")
            .unwrap()
            .unwrap();
        assert_eq!(found.id, sub.id);
    }

    #[test]
    fn seat_counting() {
        let (store, _dir) = create_test_store();
        let tenant = test_tenant();
        let tier = test_tier(tenant.id);
        let sub = TenantSubscription::start_trial(tenant.id, tier.id, 30);
        store.create_tenant(&tenant).unwrap();
        store.create_tier(&tier).unwrap();
        store.create_subscription(&sub).unwrap();

        let u1 = UserId::generate();
        let u2 = UserId::generate();
        store
            .put_user_subscription(&UserSubscription::new(sub.id, u1, &tier))
            .unwrap();
        store
            .put_user_subscription(&UserSubscription::new(sub.id, u2, &tier))
            .unwrap();
        assert_eq!(store.count_active_users(&sub.id).unwrap(), 2);

        let mut seat = store.get_user_subscription(&sub.id, &u2).unwrap().unwrap();
        seat.status = UserSubscriptionStatus::Canceled;
        store.put_user_subscription(&seat).unwrap();
        assert_eq!(store.count_active_users(&sub.id).unwrap(), 1);
    }

    #[test]
    fn content_tree_crud_and_ordering() {
        let (store, _dir) = create_test_store();
        let tenant = test_tenant();
        store.create_tenant(&tenant).unwrap();

        let curriculum = Curriculum::new(tenant.id, "Rust 101", 0).unwrap();
        store.put_curriculum(&curriculum).unwrap();

        let ch_b = Chapter::new(tenant.id, curriculum.id, "Traits", 1).unwrap();
        let ch_a = Chapter::new(tenant.id, curriculum.id, "Ownership", 0).unwrap();
        store.put_chapter(&ch_b).unwrap();
        store.put_chapter(&ch_a).unwrap();

        let chapters = store.list_chapters(&tenant.id, &curriculum.id).unwrap();
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "Ownership");
        assert_eq!(chapters[1].title, "Traits");

        let lesson = Lesson::new(tenant.id, ch_a.id, "Borrowing", 0).unwrap();
        store.put_lesson(&lesson).unwrap();

        let module = LessonModule::new(
            tenant.id,
            lesson.id,
            "Intro",
            0,
            ModuleBody::Text {
                markdown: "# Borrowing".into(),
            },
        )
        .unwrap();
        store.put_module(&module).unwrap();
        assert_eq!(store.list_modules(&tenant.id, &lesson.id).unwrap().len(), 1);

        // Deleting the chapter takes its lessons and modules with it.
        store
            .delete_chapter(&tenant.id, &curriculum.id, &ch_a.id)
            .unwrap();
        assert!(store
            .get_lesson(&tenant.id, &ch_a.id, &lesson.id)
            .unwrap()
            .is_none());
        assert!(store.list_modules(&tenant.id, &lesson.id).unwrap().is_empty());
    }

    #[test]
    fn tenant_delete_cascades() {
        let (store, _dir) = create_test_store();
        let tenant = test_tenant();
        store.create_tenant(&tenant).unwrap();
        let tier = test_tier(tenant.id);
        store.create_tier(&tier).unwrap();
        let sub = TenantSubscription::start_trial(tenant.id, tier.id, 30);
        store.create_subscription(&sub).unwrap();
        let curriculum = Curriculum::new(tenant.id, "Rust 101", 0).unwrap();
        store.put_curriculum(&curriculum).unwrap();

        store.delete_tenant(&tenant.id).unwrap();
        assert!(store.get_tier(&tenant.id, &tier.id).unwrap().is_none());
        assert!(store.current_subscription(&tenant.id).unwrap().is_none());
        assert!(store.list_curricula(&tenant.id).unwrap().is_empty());
    }

    #[test]
    fn progress_is_keyed_upsert() {
        let (store, _dir) = create_test_store();
        let tenant = test_tenant();
        store.create_tenant(&tenant).unwrap();
        let user = UserId::generate();
        let node = ProgressNode::Lesson {
            lesson_id: LessonId::generate(),
        };

        store
            .put_progress(&Progress::new(tenant.id, user, node, true))
            .unwrap();
        store
            .put_progress(&Progress::new(tenant.id, user, node, false))
            .unwrap();

        // Two writes, one row.
        let rows = store.list_progress(&tenant.id, &user).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].completed);
    }

    #[test]
    fn notes_and_bookmarks_roundtrip() {
        let (store, _dir) = create_test_store();
        let tenant = test_tenant();
        store.create_tenant(&tenant).unwrap();
        let user = UserId::generate();
        let lesson_id = LessonId::generate();

        let scope = NoteScope::Lesson { lesson_id };
        store
            .put_note(&Note::new(tenant.id, user, scope, "remember this"))
            .unwrap();
        let note = store.get_note(&tenant.id, &user, &scope).unwrap().unwrap();
        assert_eq!(note.body, "remember this");

        store.put_bookmark(&Bookmark::new(tenant.id, user, lesson_id)).unwrap();
        assert_eq!(store.list_bookmarks(&tenant.id, &user).unwrap().len(), 1);
        store.delete_bookmark(&tenant.id, &user, &lesson_id).unwrap();
        assert!(store.list_bookmarks(&tenant.id, &user).unwrap().is_empty());
    }

    #[test]
    fn highlights_are_many_per_lesson() {
        let (store, _dir) = create_test_store();
        let tenant = test_tenant();
        store.create_tenant(&tenant).unwrap();
        let user = UserId::generate();
        let lesson_id = LessonId::generate();

        let h1 = Highlight::new(tenant.id, user, lesson_id, "first", 0, 5);
        std::thread::sleep(std::time::Duration::from_millis(2));
        let h2 = Highlight::new(tenant.id, user, lesson_id, "second", 10, 16);
        store.put_highlight(&h1).unwrap();
        store.put_highlight(&h2).unwrap();

        let highlights = store.list_highlights(&tenant.id, &user, &lesson_id).unwrap();
        assert_eq!(highlights.len(), 2);
        assert_eq!(highlights[0].text, "first"); // Oldest first via ULID key.

        store
            .delete_highlight(&tenant.id, &user, &lesson_id, &h1.id)
            .unwrap();
        assert_eq!(store.list_highlights(&tenant.id, &user, &lesson_id).unwrap().len(), 1);
    }
}
