//! Content tree handlers: curricula, chapters, lessons, and modules.
//!
//! Writes require the admin role. Reads are tenant-wide, but members only
//! see published nodes; admins see everything.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use campus_core::{
    Chapter, ChapterId, Curriculum, CurriculumId, Lesson, LessonId, LessonModule, LessonModuleId,
    ModuleBody,
};
use campus_store::Store;

use crate::auth::{AuthUser, Role};
use crate::error::ApiError;
use crate::state::AppState;

/// Publish toggle request, shared by every level of the tree.
#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    /// The new published state.
    pub published: bool,
}

/// Reorder request: node IDs in their new order. Position becomes the
/// index within this list.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    /// IDs in the desired order.
    pub ordered_ids: Vec<String>,
}

fn index_position(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

const fn visible_to(role: Role, published: bool) -> bool {
    matches!(role, Role::Admin) || published
}

// =============================================================================
// Curricula
// =============================================================================

/// Curriculum creation request.
#[derive(Debug, Deserialize)]
pub struct CreateCurriculumRequest {
    /// Title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
}

/// Create a curriculum, appended after the tenant's existing ones.
pub async fn create_curriculum(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateCurriculumRequest>,
) -> Result<Json<Curriculum>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    let position = index_position(state.store.list_curricula(&tenant_id)?.len());
    let mut curriculum = Curriculum::new(tenant_id, body.title, position)?;
    curriculum.description = body.description;

    state.store.put_curriculum(&curriculum)?;

    tracing::info!(tenant_id = %tenant_id, curriculum_id = %curriculum.id, "Curriculum created");

    Ok(Json(curriculum))
}

/// List the tenant's curricula in position order.
pub async fn list_curricula(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<Curriculum>>, ApiError> {
    let tenant_id = auth.tenant()?;
    let curricula = state
        .store
        .list_curricula(&tenant_id)?
        .into_iter()
        .filter(|c| visible_to(auth.role, c.published))
        .collect();
    Ok(Json(curricula))
}

/// Get one curriculum.
pub async fn get_curriculum(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(curriculum_id): Path<CurriculumId>,
) -> Result<Json<Curriculum>, ApiError> {
    let tenant_id = auth.tenant()?;
    let curriculum = state
        .store
        .get_curriculum(&tenant_id, &curriculum_id)?
        .filter(|c| visible_to(auth.role, c.published))
        .ok_or_else(|| ApiError::NotFound("Curriculum not found".into()))?;
    Ok(Json(curriculum))
}

/// Curriculum update request. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateCurriculumRequest {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
}

/// Update a curriculum's title or description.
pub async fn update_curriculum(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(curriculum_id): Path<CurriculumId>,
    Json(body): Json<UpdateCurriculumRequest>,
) -> Result<Json<Curriculum>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    let mut curriculum = state
        .store
        .get_curriculum(&tenant_id, &curriculum_id)?
        .ok_or_else(|| ApiError::NotFound("Curriculum not found".into()))?;

    if let Some(title) = body.title {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("title must not be empty".into()));
        }
        curriculum.title = title;
    }
    if let Some(description) = body.description {
        curriculum.description = Some(description);
    }
    curriculum.updated_at = Utc::now();

    state.store.put_curriculum(&curriculum)?;
    Ok(Json(curriculum))
}

/// Delete a curriculum and its whole subtree.
pub async fn delete_curriculum(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(curriculum_id): Path<CurriculumId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    state.store.delete_curriculum(&tenant_id, &curriculum_id)?;

    tracing::info!(tenant_id = %tenant_id, curriculum_id = %curriculum_id, "Curriculum deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Toggle a curriculum's published flag.
pub async fn publish_curriculum(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(curriculum_id): Path<CurriculumId>,
    Json(body): Json<PublishRequest>,
) -> Result<Json<Curriculum>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    let mut curriculum = state
        .store
        .get_curriculum(&tenant_id, &curriculum_id)?
        .ok_or_else(|| ApiError::NotFound("Curriculum not found".into()))?;

    curriculum.published = body.published;
    curriculum.updated_at = Utc::now();
    state.store.put_curriculum(&curriculum)?;
    Ok(Json(curriculum))
}

/// Reorder the tenant's curricula.
pub async fn reorder_curricula(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<ReorderRequest>,
) -> Result<Json<Vec<Curriculum>>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    let mut reordered = Vec::with_capacity(body.ordered_ids.len());
    for (index, raw_id) in body.ordered_ids.iter().enumerate() {
        let id: CurriculumId = raw_id.parse()?;
        let mut curriculum = state
            .store
            .get_curriculum(&tenant_id, &id)?
            .ok_or_else(|| ApiError::NotFound(format!("Curriculum {raw_id} not found")))?;
        curriculum.position = index_position(index);
        curriculum.updated_at = Utc::now();
        state.store.put_curriculum(&curriculum)?;
        reordered.push(curriculum);
    }
    Ok(Json(reordered))
}

// =============================================================================
// Chapters
// =============================================================================

/// Chapter creation request.
#[derive(Debug, Deserialize)]
pub struct CreateChapterRequest {
    /// Title.
    pub title: String,
}

/// Create a chapter at the end of a curriculum.
pub async fn create_chapter(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(curriculum_id): Path<CurriculumId>,
    Json(body): Json<CreateChapterRequest>,
) -> Result<Json<Chapter>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    state
        .store
        .get_curriculum(&tenant_id, &curriculum_id)?
        .ok_or_else(|| ApiError::NotFound("Curriculum not found".into()))?;

    let position = index_position(state.store.list_chapters(&tenant_id, &curriculum_id)?.len());
    let chapter = Chapter::new(tenant_id, curriculum_id, body.title, position)?;

    state.store.put_chapter(&chapter)?;
    Ok(Json(chapter))
}

/// List a curriculum's chapters in position order.
pub async fn list_chapters(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(curriculum_id): Path<CurriculumId>,
) -> Result<Json<Vec<Chapter>>, ApiError> {
    let tenant_id = auth.tenant()?;
    let chapters = state
        .store
        .list_chapters(&tenant_id, &curriculum_id)?
        .into_iter()
        .filter(|c| visible_to(auth.role, c.published))
        .collect();
    Ok(Json(chapters))
}

/// Get one chapter.
pub async fn get_chapter(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((curriculum_id, chapter_id)): Path<(CurriculumId, ChapterId)>,
) -> Result<Json<Chapter>, ApiError> {
    let tenant_id = auth.tenant()?;
    let chapter = state
        .store
        .get_chapter(&tenant_id, &curriculum_id, &chapter_id)?
        .filter(|c| visible_to(auth.role, c.published))
        .ok_or_else(|| ApiError::NotFound("Chapter not found".into()))?;
    Ok(Json(chapter))
}

/// Chapter update request.
#[derive(Debug, Deserialize)]
pub struct UpdateChapterRequest {
    /// New title.
    pub title: Option<String>,
}

/// Update a chapter's title.
pub async fn update_chapter(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((curriculum_id, chapter_id)): Path<(CurriculumId, ChapterId)>,
    Json(body): Json<UpdateChapterRequest>,
) -> Result<Json<Chapter>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    let mut chapter = state
        .store
        .get_chapter(&tenant_id, &curriculum_id, &chapter_id)?
        .ok_or_else(|| ApiError::NotFound("Chapter not found".into()))?;

    if let Some(title) = body.title {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("title must not be empty".into()));
        }
        chapter.title = title;
    }
    chapter.updated_at = Utc::now();

    state.store.put_chapter(&chapter)?;
    Ok(Json(chapter))
}

/// Delete a chapter and its lessons and modules.
pub async fn delete_chapter(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((curriculum_id, chapter_id)): Path<(CurriculumId, ChapterId)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    state
        .store
        .delete_chapter(&tenant_id, &curriculum_id, &chapter_id)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Toggle a chapter's published flag.
pub async fn publish_chapter(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((curriculum_id, chapter_id)): Path<(CurriculumId, ChapterId)>,
    Json(body): Json<PublishRequest>,
) -> Result<Json<Chapter>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    let mut chapter = state
        .store
        .get_chapter(&tenant_id, &curriculum_id, &chapter_id)?
        .ok_or_else(|| ApiError::NotFound("Chapter not found".into()))?;

    chapter.published = body.published;
    chapter.updated_at = Utc::now();
    state.store.put_chapter(&chapter)?;
    Ok(Json(chapter))
}

/// Reorder a curriculum's chapters.
pub async fn reorder_chapters(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(curriculum_id): Path<CurriculumId>,
    Json(body): Json<ReorderRequest>,
) -> Result<Json<Vec<Chapter>>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    let mut reordered = Vec::with_capacity(body.ordered_ids.len());
    for (index, raw_id) in body.ordered_ids.iter().enumerate() {
        let id: ChapterId = raw_id.parse()?;
        let mut chapter = state
            .store
            .get_chapter(&tenant_id, &curriculum_id, &id)?
            .ok_or_else(|| ApiError::NotFound(format!("Chapter {raw_id} not found")))?;
        chapter.position = index_position(index);
        chapter.updated_at = Utc::now();
        state.store.put_chapter(&chapter)?;
        reordered.push(chapter);
    }
    Ok(Json(reordered))
}

// =============================================================================
// Lessons
// =============================================================================

/// Lesson creation request.
#[derive(Debug, Deserialize)]
pub struct CreateLessonRequest {
    /// Title.
    pub title: String,
}

/// Create a lesson at the end of a chapter.
pub async fn create_lesson(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(chapter_id): Path<ChapterId>,
    Json(body): Json<CreateLessonRequest>,
) -> Result<Json<Lesson>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    let position = index_position(state.store.list_lessons(&tenant_id, &chapter_id)?.len());
    let lesson = Lesson::new(tenant_id, chapter_id, body.title, position)?;

    state.store.put_lesson(&lesson)?;
    Ok(Json(lesson))
}

/// List a chapter's lessons in position order.
pub async fn list_lessons(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(chapter_id): Path<ChapterId>,
) -> Result<Json<Vec<Lesson>>, ApiError> {
    let tenant_id = auth.tenant()?;
    let lessons = state
        .store
        .list_lessons(&tenant_id, &chapter_id)?
        .into_iter()
        .filter(|l| visible_to(auth.role, l.published))
        .collect();
    Ok(Json(lessons))
}

/// Get one lesson.
pub async fn get_lesson(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((chapter_id, lesson_id)): Path<(ChapterId, LessonId)>,
) -> Result<Json<Lesson>, ApiError> {
    let tenant_id = auth.tenant()?;
    let lesson = state
        .store
        .get_lesson(&tenant_id, &chapter_id, &lesson_id)?
        .filter(|l| visible_to(auth.role, l.published))
        .ok_or_else(|| ApiError::NotFound("Lesson not found".into()))?;
    Ok(Json(lesson))
}

/// Lesson update request.
#[derive(Debug, Deserialize)]
pub struct UpdateLessonRequest {
    /// New title.
    pub title: Option<String>,
}

/// Update a lesson's title.
pub async fn update_lesson(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((chapter_id, lesson_id)): Path<(ChapterId, LessonId)>,
    Json(body): Json<UpdateLessonRequest>,
) -> Result<Json<Lesson>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    let mut lesson = state
        .store
        .get_lesson(&tenant_id, &chapter_id, &lesson_id)?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".into()))?;

    if let Some(title) = body.title {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("title must not be empty".into()));
        }
        lesson.title = title;
    }
    lesson.updated_at = Utc::now();

    state.store.put_lesson(&lesson)?;
    Ok(Json(lesson))
}

/// Delete a lesson and its modules.
pub async fn delete_lesson(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((chapter_id, lesson_id)): Path<(ChapterId, LessonId)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    state
        .store
        .delete_lesson(&tenant_id, &chapter_id, &lesson_id)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Toggle a lesson's published flag.
pub async fn publish_lesson(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((chapter_id, lesson_id)): Path<(ChapterId, LessonId)>,
    Json(body): Json<PublishRequest>,
) -> Result<Json<Lesson>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    let mut lesson = state
        .store
        .get_lesson(&tenant_id, &chapter_id, &lesson_id)?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".into()))?;

    lesson.published = body.published;
    lesson.updated_at = Utc::now();
    state.store.put_lesson(&lesson)?;
    Ok(Json(lesson))
}

/// Reorder a chapter's lessons.
pub async fn reorder_lessons(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(chapter_id): Path<ChapterId>,
    Json(body): Json<ReorderRequest>,
) -> Result<Json<Vec<Lesson>>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    let mut reordered = Vec::with_capacity(body.ordered_ids.len());
    for (index, raw_id) in body.ordered_ids.iter().enumerate() {
        let id: LessonId = raw_id.parse()?;
        let mut lesson = state
            .store
            .get_lesson(&tenant_id, &chapter_id, &id)?
            .ok_or_else(|| ApiError::NotFound(format!("Lesson {raw_id} not found")))?;
        lesson.position = index_position(index);
        lesson.updated_at = Utc::now();
        state.store.put_lesson(&lesson)?;
        reordered.push(lesson);
    }
    Ok(Json(reordered))
}

// =============================================================================
// Lesson modules
// =============================================================================

/// Module creation request.
#[derive(Debug, Deserialize)]
pub struct CreateModuleRequest {
    /// Title.
    pub title: String,
    /// Typed module payload.
    pub body: ModuleBody,
}

/// Create a module at the end of a lesson.
pub async fn create_module(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(lesson_id): Path<LessonId>,
    Json(body): Json<CreateModuleRequest>,
) -> Result<Json<LessonModule>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    let position = index_position(state.store.list_modules(&tenant_id, &lesson_id)?.len());
    let module = LessonModule::new(tenant_id, lesson_id, body.title, position, body.body)?;

    state.store.put_module(&module)?;

    tracing::debug!(
        tenant_id = %tenant_id,
        module_id = %module.id,
        kind = module.body.kind(),
        "Module created"
    );

    Ok(Json(module))
}

/// List a lesson's modules in position order.
pub async fn list_modules(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(lesson_id): Path<LessonId>,
) -> Result<Json<Vec<LessonModule>>, ApiError> {
    let tenant_id = auth.tenant()?;
    let modules = state
        .store
        .list_modules(&tenant_id, &lesson_id)?
        .into_iter()
        .filter(|m| visible_to(auth.role, m.published))
        .collect();
    Ok(Json(modules))
}

/// Get one module.
pub async fn get_module(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((lesson_id, module_id)): Path<(LessonId, LessonModuleId)>,
) -> Result<Json<LessonModule>, ApiError> {
    let tenant_id = auth.tenant()?;
    let module = state
        .store
        .get_module(&tenant_id, &lesson_id, &module_id)?
        .filter(|m| visible_to(auth.role, m.published))
        .ok_or_else(|| ApiError::NotFound("Module not found".into()))?;
    Ok(Json(module))
}

/// Module update request.
#[derive(Debug, Deserialize)]
pub struct UpdateModuleRequest {
    /// New title.
    pub title: Option<String>,
    /// Replacement payload. The kind may change; the whole body is
    /// replaced, never merged.
    pub body: Option<ModuleBody>,
}

/// Update a module's title or payload.
pub async fn update_module(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((lesson_id, module_id)): Path<(LessonId, LessonModuleId)>,
    Json(body): Json<UpdateModuleRequest>,
) -> Result<Json<LessonModule>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    let mut module = state
        .store
        .get_module(&tenant_id, &lesson_id, &module_id)?
        .ok_or_else(|| ApiError::NotFound("Module not found".into()))?;

    if let Some(title) = body.title {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("title must not be empty".into()));
        }
        module.title = title;
    }
    if let Some(new_body) = body.body {
        new_body.validate()?;
        module.body = new_body;
    }
    module.updated_at = Utc::now();

    state.store.put_module(&module)?;
    Ok(Json(module))
}

/// Delete a module.
pub async fn delete_module(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((lesson_id, module_id)): Path<(LessonId, LessonModuleId)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    state.store.delete_module(&tenant_id, &lesson_id, &module_id)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Toggle a module's published flag.
pub async fn publish_module(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((lesson_id, module_id)): Path<(LessonId, LessonModuleId)>,
    Json(body): Json<PublishRequest>,
) -> Result<Json<LessonModule>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    let mut module = state
        .store
        .get_module(&tenant_id, &lesson_id, &module_id)?
        .ok_or_else(|| ApiError::NotFound("Module not found".into()))?;

    module.published = body.published;
    module.updated_at = Utc::now();
    state.store.put_module(&module)?;
    Ok(Json(module))
}

/// Reorder a lesson's modules.
pub async fn reorder_modules(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(lesson_id): Path<LessonId>,
    Json(body): Json<ReorderRequest>,
) -> Result<Json<Vec<LessonModule>>, ApiError> {
    auth.require_admin()?;
    let tenant_id = auth.tenant()?;

    let mut reordered = Vec::with_capacity(body.ordered_ids.len());
    for (index, raw_id) in body.ordered_ids.iter().enumerate() {
        let id: LessonModuleId = raw_id.parse()?;
        let mut module = state
            .store
            .get_module(&tenant_id, &lesson_id, &id)?
            .ok_or_else(|| ApiError::NotFound(format!("Module {raw_id} not found")))?;
        module.position = index_position(index);
        module.updated_at = Utc::now();
        state.store.put_module(&module)?;
        reordered.push(module);
    }
    Ok(Json(reordered))
}
