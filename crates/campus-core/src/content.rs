//! Curriculum content tree: curriculum -> chapter -> lesson -> module.
//!
//! Every level carries its owning tenant so scoping checks never need a
//! join, a position unique within its parent, and a published flag.
//! Lesson modules are a closed variant set with typed per-variant settings;
//! there is no open-ended "settings hash".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};
use crate::ids::{ChapterId, CurriculumId, LessonId, LessonModuleId, TenantId};

/// A top-level course within a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curriculum {
    /// The curriculum ID.
    pub id: CurriculumId,

    /// The owning tenant.
    pub tenant_id: TenantId,

    /// Title.
    pub title: String,

    /// Optional description.
    pub description: Option<String>,

    /// Order among the tenant's curricula.
    pub position: u32,

    /// Whether learners can see this curriculum.
    pub published: bool,

    /// When the curriculum was created.
    pub created_at: DateTime<Utc>,

    /// When the curriculum was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Curriculum {
    /// Create an unpublished curriculum.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the title is empty.
    pub fn new(tenant_id: TenantId, title: impl Into<String>, position: u32) -> Result<Self> {
        let title = non_empty_title(title.into())?;
        let now = Utc::now();
        Ok(Self {
            id: CurriculumId::generate(),
            tenant_id,
            title,
            description: None,
            position,
            published: false,
            created_at: now,
            updated_at: now,
        })
    }
}

/// A chapter within a curriculum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    /// The chapter ID.
    pub id: ChapterId,

    /// The parent curriculum.
    pub curriculum_id: CurriculumId,

    /// The owning tenant.
    pub tenant_id: TenantId,

    /// Title.
    pub title: String,

    /// Order within the curriculum.
    pub position: u32,

    /// Whether learners can see this chapter.
    pub published: bool,

    /// When the chapter was created.
    pub created_at: DateTime<Utc>,

    /// When the chapter was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Chapter {
    /// Create an unpublished chapter.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the title is empty.
    pub fn new(
        tenant_id: TenantId,
        curriculum_id: CurriculumId,
        title: impl Into<String>,
        position: u32,
    ) -> Result<Self> {
        let title = non_empty_title(title.into())?;
        let now = Utc::now();
        Ok(Self {
            id: ChapterId::generate(),
            curriculum_id,
            tenant_id,
            title,
            position,
            published: false,
            created_at: now,
            updated_at: now,
        })
    }
}

/// A lesson within a chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    /// The lesson ID.
    pub id: LessonId,

    /// The parent chapter.
    pub chapter_id: ChapterId,

    /// The owning tenant.
    pub tenant_id: TenantId,

    /// Title.
    pub title: String,

    /// Order within the chapter.
    pub position: u32,

    /// Whether learners can see this lesson.
    pub published: bool,

    /// When the lesson was created.
    pub created_at: DateTime<Utc>,

    /// When the lesson was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Lesson {
    /// Create an unpublished lesson.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the title is empty.
    pub fn new(
        tenant_id: TenantId,
        chapter_id: ChapterId,
        title: impl Into<String>,
        position: u32,
    ) -> Result<Self> {
        let title = non_empty_title(title.into())?;
        let now = Utc::now();
        Ok(Self {
            id: LessonId::generate(),
            chapter_id,
            tenant_id,
            title,
            position,
            published: false,
            created_at: now,
            updated_at: now,
        })
    }
}

/// One typed content block within a lesson.
///
/// The envelope (id, lesson, title, position, published) is shared; the
/// payload is one of the five module kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonModule {
    /// The module ID.
    pub id: LessonModuleId,

    /// The parent lesson.
    pub lesson_id: LessonId,

    /// The owning tenant.
    pub tenant_id: TenantId,

    /// Title.
    pub title: String,

    /// Order within the lesson.
    pub position: u32,

    /// Whether learners can see this module.
    pub published: bool,

    /// Typed module payload.
    pub body: ModuleBody,

    /// When the module was created.
    pub created_at: DateTime<Utc>,

    /// When the module was last updated.
    pub updated_at: DateTime<Utc>,
}

impl LessonModule {
    /// Create an unpublished module.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the title is empty or the body
    /// fails its own checks.
    pub fn new(
        tenant_id: TenantId,
        lesson_id: LessonId,
        title: impl Into<String>,
        position: u32,
        body: ModuleBody,
    ) -> Result<Self> {
        let title = non_empty_title(title.into())?;
        body.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: LessonModuleId::generate(),
            lesson_id,
            tenant_id,
            title,
            position,
            published: false,
            body,
            created_at: now,
            updated_at: now,
        })
    }
}

/// The closed set of lesson module kinds with typed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModuleBody {
    /// A hosted video.
    Video {
        /// Stream or file URL.
        url: String,
        /// Duration in seconds, when known.
        duration_seconds: Option<u32>,
        /// Optional captions track URL.
        captions_url: Option<String>,
    },

    /// Markdown text content.
    Text {
        /// Markdown source.
        markdown: String,
    },

    /// A multiple-choice assessment.
    Assessment {
        /// Questions in presentation order.
        questions: Vec<AssessmentQuestion>,
        /// Passing score, 0-100.
        passing_score_percent: u8,
        /// Whether learners may retake the assessment.
        allow_retries: bool,
    },

    /// A list of downloadable or external resources.
    Resources {
        /// Resource links.
        links: Vec<ResourceLink>,
    },

    /// A single image with alt text.
    Image {
        /// Image URL.
        url: String,
        /// Alt text for accessibility.
        alt_text: String,
        /// Optional caption.
        caption: Option<String>,
    },
}

impl ModuleBody {
    /// Stable kind label, used in responses and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Video { .. } => "video",
            Self::Text { .. } => "text",
            Self::Assessment { .. } => "assessment",
            Self::Resources { .. } => "resources",
            Self::Image { .. } => "image",
        }
    }

    /// Check per-variant invariants.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the offending field.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Video { url, .. } if url.trim().is_empty() => {
                Err(DomainError::invalid("url", "must not be empty"))
            }
            Self::Image { url, .. } if url.trim().is_empty() => {
                Err(DomainError::invalid("url", "must not be empty"))
            }
            Self::Assessment {
                passing_score_percent,
                questions,
                ..
            } => {
                if *passing_score_percent > 100 {
                    return Err(DomainError::invalid(
                        "passing_score_percent",
                        "must be 0-100",
                    ));
                }
                for q in questions {
                    if q.correct_choice as usize >= q.choices.len() {
                        return Err(DomainError::invalid(
                            "questions",
                            format!("correct_choice out of range for \"{}\"", q.prompt),
                        ));
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// One question in an assessment module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentQuestion {
    /// Question prompt.
    pub prompt: String,
    /// Answer choices.
    pub choices: Vec<String>,
    /// Index of the correct choice.
    pub correct_choice: u32,
}

/// One entry in a resources module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLink {
    /// Display title.
    pub title: String,
    /// Target URL.
    pub url: String,
}

fn non_empty_title(title: String) -> Result<String> {
    if title.trim().is_empty() {
        Err(DomainError::invalid("title", "must not be empty"))
    } else {
        Ok(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_body_serde_is_tagged() {
        let body = ModuleBody::Video {
            url: "https://cdn.example.com/v/1.m3u8".into(),
            duration_seconds: Some(300),
            captions_url: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "video");

        let back: ModuleBody = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), "video");
    }

    #[test]
    fn unknown_module_type_rejected() {
        let result: std::result::Result<ModuleBody, _> =
            serde_json::from_str(r#"{"type":"hologram","url":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn assessment_validates_choice_range() {
        let body = ModuleBody::Assessment {
            questions: vec![AssessmentQuestion {
                prompt: "2+2?".into(),
                choices: vec!["3".into(), "4".into()],
                correct_choice: 5,
            }],
            passing_score_percent: 80,
            allow_retries: true,
        };
        assert!(body.validate().is_err());
    }

    #[test]
    fn assessment_score_bounds() {
        let body = ModuleBody::Assessment {
            questions: Vec::new(),
            passing_score_percent: 101,
            allow_retries: false,
        };
        assert!(body.validate().is_err());
    }

    #[test]
    fn empty_title_rejected() {
        let err = Curriculum::new(TenantId::generate(), "  ", 0).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn new_nodes_start_unpublished() {
        let tenant = TenantId::generate();
        let curriculum = Curriculum::new(tenant, "Rust 101", 0).unwrap();
        assert!(!curriculum.published);

        let chapter = Chapter::new(tenant, curriculum.id, "Ownership", 0).unwrap();
        let lesson = Lesson::new(tenant, chapter.id, "Borrowing", 0).unwrap();
        let module = LessonModule::new(
            tenant,
            lesson.id,
            "Intro video",
            0,
            ModuleBody::Text {
                markdown: "# hi".into(),
            },
        )
        .unwrap();
        assert!(!chapter.published && !lesson.published && !module.published);
    }
}
