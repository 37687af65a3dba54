//! Per-user progress and annotations.
//!
//! Each record is scoped to (tenant, user) and exactly one content node.
//! Uniqueness (one progress row per lesson or chapter, one note per lesson
//! or per chapter-within-curriculum, one bookmark per lesson) comes from
//! the store's key shapes rather than runtime checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChapterId, CurriculumId, HighlightId, LessonId, TenantId, UserId};

/// The content node a progress row tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum ProgressNode {
    /// A lesson completion flag.
    Lesson {
        /// The lesson.
        lesson_id: LessonId,
    },

    /// A chapter completion flag.
    Chapter {
        /// The chapter.
        chapter_id: ChapterId,
    },
}

/// A completion flag for one user on one content node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    /// The owning tenant.
    pub tenant_id: TenantId,

    /// The tracked user.
    pub user_id: UserId,

    /// The content node.
    pub node: ProgressNode,

    /// Whether the node is completed.
    pub completed: bool,

    /// When completion last changed.
    pub updated_at: DateTime<Utc>,
}

impl Progress {
    /// Create a completed/uncompleted progress record.
    #[must_use]
    pub fn new(tenant_id: TenantId, user_id: UserId, node: ProgressNode, completed: bool) -> Self {
        Self {
            tenant_id,
            user_id,
            node,
            completed,
            updated_at: Utc::now(),
        }
    }
}

/// Where a note attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum NoteScope {
    /// One note per (user, lesson).
    Lesson {
        /// The lesson.
        lesson_id: LessonId,
    },

    /// One note per (user, chapter, curriculum).
    Chapter {
        /// The curriculum the chapter is read in.
        curriculum_id: CurriculumId,
        /// The chapter.
        chapter_id: ChapterId,
    },
}

/// A user's private note on a content node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// The owning tenant.
    pub tenant_id: TenantId,

    /// The author.
    pub user_id: UserId,

    /// Attachment point.
    pub scope: NoteScope,

    /// Note body (markdown).
    pub body: String,

    /// When the note was created.
    pub created_at: DateTime<Utc>,

    /// When the note was last edited.
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Create a note.
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        user_id: UserId,
        scope: NoteScope,
        body: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            tenant_id,
            user_id,
            scope,
            body: body.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A highlighted text range within a lesson. Many per lesson are allowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Highlight {
    /// The highlight ID (time-ordered within the lesson).
    pub id: HighlightId,

    /// The owning tenant.
    pub tenant_id: TenantId,

    /// The highlighting user.
    pub user_id: UserId,

    /// The lesson containing the highlighted text.
    pub lesson_id: LessonId,

    /// The highlighted text.
    pub text: String,

    /// Character offset where the highlight starts.
    pub start_offset: u32,

    /// Character offset where the highlight ends.
    pub end_offset: u32,

    /// When the highlight was created.
    pub created_at: DateTime<Utc>,
}

impl Highlight {
    /// Create a highlight.
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        user_id: UserId,
        lesson_id: LessonId,
        text: impl Into<String>,
        start_offset: u32,
        end_offset: u32,
    ) -> Self {
        Self {
            id: HighlightId::generate(),
            tenant_id,
            user_id,
            lesson_id,
            text: text.into(),
            start_offset,
            end_offset,
            created_at: Utc::now(),
        }
    }
}

/// A bookmark on a lesson; at most one per (user, lesson).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    /// The owning tenant.
    pub tenant_id: TenantId,

    /// The bookmarking user.
    pub user_id: UserId,

    /// The bookmarked lesson.
    pub lesson_id: LessonId,

    /// When the bookmark was created.
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    /// Create a bookmark.
    #[must_use]
    pub fn new(tenant_id: TenantId, user_id: UserId, lesson_id: LessonId) -> Self {
        Self {
            tenant_id,
            user_id,
            lesson_id,
            created_at: Utc::now(),
        }
    }
}
