//! Key encodings for the column families.
//!
//! Keys are fixed-width id bytes concatenated parent-first, so a parent's
//! id bytes are a prefix that iterates all of its children. ULID segments
//! (subscriptions, highlights) keep ranges in creation order.

use campus_core::{
    ChapterId, CurriculumId, HighlightId, LessonId, LessonModuleId, NoteScope, ProgressNode,
    SubscriptionId, TenantId, TierId, UserId,
};

/// Tag byte for lesson-scoped progress/note keys.
const TAG_LESSON: u8 = 0x01;

/// Tag byte for chapter-scoped progress/note keys.
const TAG_CHAPTER: u8 = 0x02;

fn concat(parts: &[&[u8]]) -> Vec<u8> {
    let len = parts.iter().map(|p| p.len()).sum();
    let mut key = Vec::with_capacity(len);
    for part in parts {
        key.extend_from_slice(part);
    }
    key
}

/// Tenant record key.
#[must_use]
pub fn tenant_key(tenant_id: &TenantId) -> Vec<u8> {
    tenant_id.as_bytes().to_vec()
}

/// Slug index key.
#[must_use]
pub fn slug_key(slug: &str) -> Vec<u8> {
    slug.as_bytes().to_vec()
}

/// Tier record key.
#[must_use]
pub fn tier_key(tenant_id: &TenantId, tier_id: &TierId) -> Vec<u8> {
    concat(&[tenant_id.as_bytes(), tier_id.as_bytes()])
}

/// Prefix for all tiers of a tenant.
#[must_use]
pub fn tier_prefix(tenant_id: &TenantId) -> Vec<u8> {
    tenant_id.as_bytes().to_vec()
}

/// Tier name uniqueness index key.
#[must_use]
pub fn tier_name_key(tenant_id: &TenantId, name: &str) -> Vec<u8> {
    concat(&[tenant_id.as_bytes(), name.as_bytes()])
}

/// External price id uniqueness index key.
#[must_use]
pub fn external_price_key(external_price_id: &str) -> Vec<u8> {
    external_price_id.as_bytes().to_vec()
}

/// Subscription record key. The ULID segment sorts by creation time.
#[must_use]
pub fn subscription_key(tenant_id: &TenantId, subscription_id: &SubscriptionId) -> Vec<u8> {
    concat(&[tenant_id.as_bytes(), &subscription_id.to_bytes()])
}

/// Prefix for all subscriptions of a tenant.
#[must_use]
pub fn subscription_prefix(tenant_id: &TenantId) -> Vec<u8> {
    tenant_id.as_bytes().to_vec()
}

/// Current-subscription index key (one entry per tenant).
#[must_use]
pub fn current_subscription_key(tenant_id: &TenantId) -> Vec<u8> {
    tenant_id.as_bytes().to_vec()
}

/// External subscription id index key.
#[must_use]
pub fn external_subscription_key(external_id: &str) -> Vec<u8> {
    external_id.as_bytes().to_vec()
}

/// Seat record key.
#[must_use]
pub fn user_subscription_key(subscription_id: &SubscriptionId, user_id: &UserId) -> Vec<u8> {
    concat(&[&subscription_id.to_bytes(), user_id.as_bytes()])
}

/// Prefix for all seats of a subscription.
#[must_use]
pub fn user_subscription_prefix(subscription_id: &SubscriptionId) -> Vec<u8> {
    subscription_id.to_bytes().to_vec()
}

/// Curriculum record key.
#[must_use]
pub fn curriculum_key(tenant_id: &TenantId, curriculum_id: &CurriculumId) -> Vec<u8> {
    concat(&[tenant_id.as_bytes(), curriculum_id.as_bytes()])
}

/// Prefix for all curricula of a tenant.
#[must_use]
pub fn curriculum_prefix(tenant_id: &TenantId) -> Vec<u8> {
    tenant_id.as_bytes().to_vec()
}

/// Chapter record key.
#[must_use]
pub fn chapter_key(
    tenant_id: &TenantId,
    curriculum_id: &CurriculumId,
    chapter_id: &ChapterId,
) -> Vec<u8> {
    concat(&[
        tenant_id.as_bytes(),
        curriculum_id.as_bytes(),
        chapter_id.as_bytes(),
    ])
}

/// Prefix for all chapters of a curriculum.
#[must_use]
pub fn chapter_prefix(tenant_id: &TenantId, curriculum_id: &CurriculumId) -> Vec<u8> {
    concat(&[tenant_id.as_bytes(), curriculum_id.as_bytes()])
}

/// Lesson record key.
#[must_use]
pub fn lesson_key(tenant_id: &TenantId, chapter_id: &ChapterId, lesson_id: &LessonId) -> Vec<u8> {
    concat(&[
        tenant_id.as_bytes(),
        chapter_id.as_bytes(),
        lesson_id.as_bytes(),
    ])
}

/// Prefix for all lessons of a chapter.
#[must_use]
pub fn lesson_prefix(tenant_id: &TenantId, chapter_id: &ChapterId) -> Vec<u8> {
    concat(&[tenant_id.as_bytes(), chapter_id.as_bytes()])
}

/// Lesson module record key.
#[must_use]
pub fn module_key(
    tenant_id: &TenantId,
    lesson_id: &LessonId,
    module_id: &LessonModuleId,
) -> Vec<u8> {
    concat(&[
        tenant_id.as_bytes(),
        lesson_id.as_bytes(),
        module_id.as_bytes(),
    ])
}

/// Prefix for all modules of a lesson.
#[must_use]
pub fn module_prefix(tenant_id: &TenantId, lesson_id: &LessonId) -> Vec<u8> {
    concat(&[tenant_id.as_bytes(), lesson_id.as_bytes()])
}

/// Progress record key. The tag byte separates lesson and chapter nodes so
/// one user can hold both kinds without collision.
#[must_use]
pub fn progress_key(tenant_id: &TenantId, user_id: &UserId, node: &ProgressNode) -> Vec<u8> {
    match node {
        ProgressNode::Lesson { lesson_id } => concat(&[
            tenant_id.as_bytes(),
            user_id.as_bytes(),
            &[TAG_LESSON],
            lesson_id.as_bytes(),
        ]),
        ProgressNode::Chapter { chapter_id } => concat(&[
            tenant_id.as_bytes(),
            user_id.as_bytes(),
            &[TAG_CHAPTER],
            chapter_id.as_bytes(),
        ]),
    }
}

/// Prefix for all progress rows of a user.
#[must_use]
pub fn progress_prefix(tenant_id: &TenantId, user_id: &UserId) -> Vec<u8> {
    concat(&[tenant_id.as_bytes(), user_id.as_bytes()])
}

/// Note record key. Chapter notes embed the curriculum so the same chapter
/// read in different curricula holds distinct notes.
#[must_use]
pub fn note_key(tenant_id: &TenantId, user_id: &UserId, scope: &NoteScope) -> Vec<u8> {
    match scope {
        NoteScope::Lesson { lesson_id } => concat(&[
            tenant_id.as_bytes(),
            user_id.as_bytes(),
            &[TAG_LESSON],
            lesson_id.as_bytes(),
        ]),
        NoteScope::Chapter {
            curriculum_id,
            chapter_id,
        } => concat(&[
            tenant_id.as_bytes(),
            user_id.as_bytes(),
            &[TAG_CHAPTER],
            curriculum_id.as_bytes(),
            chapter_id.as_bytes(),
        ]),
    }
}

/// Prefix for all notes of a user.
#[must_use]
pub fn note_prefix(tenant_id: &TenantId, user_id: &UserId) -> Vec<u8> {
    concat(&[tenant_id.as_bytes(), user_id.as_bytes()])
}

/// Highlight record key. The ULID tail keeps highlights in creation order.
#[must_use]
pub fn highlight_key(
    tenant_id: &TenantId,
    user_id: &UserId,
    lesson_id: &LessonId,
    highlight_id: &HighlightId,
) -> Vec<u8> {
    concat(&[
        tenant_id.as_bytes(),
        user_id.as_bytes(),
        lesson_id.as_bytes(),
        &highlight_id.to_bytes(),
    ])
}

/// Prefix for all highlights of a user within a lesson.
#[must_use]
pub fn highlight_prefix(tenant_id: &TenantId, user_id: &UserId, lesson_id: &LessonId) -> Vec<u8> {
    concat(&[
        tenant_id.as_bytes(),
        user_id.as_bytes(),
        lesson_id.as_bytes(),
    ])
}

/// Bookmark record key.
#[must_use]
pub fn bookmark_key(tenant_id: &TenantId, user_id: &UserId, lesson_id: &LessonId) -> Vec<u8> {
    concat(&[
        tenant_id.as_bytes(),
        user_id.as_bytes(),
        lesson_id.as_bytes(),
    ])
}

/// Prefix for all bookmarks of a user.
#[must_use]
pub fn bookmark_prefix(tenant_id: &TenantId, user_id: &UserId) -> Vec<u8> {
    concat(&[tenant_id.as_bytes(), user_id.as_bytes()])
}

/// Extract the subscription id from a `tenant || subscription` key.
///
/// # Panics
///
/// Panics if the key is shorter than 32 bytes.
#[must_use]
pub fn extract_subscription_id(key: &[u8]) -> SubscriptionId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    SubscriptionId::from_bytes(bytes).expect("valid ULID bytes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_key_layout() {
        let tenant = TenantId::generate();
        let sub = SubscriptionId::generate();
        let key = subscription_key(&tenant, &sub);
        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], tenant.as_bytes());
        assert_eq!(&key[16..], sub.to_bytes());
    }

    #[test]
    fn extract_subscription_id_roundtrip() {
        let tenant = TenantId::generate();
        let sub = SubscriptionId::generate();
        let key = subscription_key(&tenant, &sub);
        assert_eq!(extract_subscription_id(&key), sub);
    }

    #[test]
    fn lesson_and_chapter_progress_keys_differ() {
        let tenant = TenantId::generate();
        let user = UserId::generate();
        let raw = uuid::Uuid::new_v4();
        // Same underlying id bytes under both node kinds must not collide.
        let as_lesson = ProgressNode::Lesson {
            lesson_id: LessonId::from_uuid(raw),
        };
        let as_chapter = ProgressNode::Chapter {
            chapter_id: ChapterId::from_uuid(raw),
        };
        assert_ne!(
            progress_key(&tenant, &user, &as_lesson),
            progress_key(&tenant, &user, &as_chapter)
        );
    }

    #[test]
    fn chapter_note_keys_embed_curriculum() {
        let tenant = TenantId::generate();
        let user = UserId::generate();
        let chapter = ChapterId::generate();
        let a = NoteScope::Chapter {
            curriculum_id: CurriculumId::generate(),
            chapter_id: chapter,
        };
        let b = NoteScope::Chapter {
            curriculum_id: CurriculumId::generate(),
            chapter_id: chapter,
        };
        assert_ne!(note_key(&tenant, &user, &a), note_key(&tenant, &user, &b));
    }
}
