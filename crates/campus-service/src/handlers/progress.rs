//! Learner progress and annotation handlers.
//!
//! All records are scoped to the calling user; there is no cross-user
//! read surface here.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use campus_core::{
    Bookmark, ChapterId, CurriculumId, DomainError, Highlight, HighlightId, LessonId, Note,
    NoteScope, Progress, ProgressNode,
};
use campus_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Progress
// =============================================================================

/// Progress upsert request. The node is flattened into the body:
/// `{"node":"lesson","lesson_id":"...","completed":true}`.
#[derive(Debug, Deserialize)]
pub struct PutProgressRequest {
    /// The content node.
    #[serde(flatten)]
    pub node: ProgressNode,
    /// The new completion state.
    pub completed: bool,
}

/// Set the caller's completion state on one node.
pub async fn put_progress(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<PutProgressRequest>,
) -> Result<Json<Progress>, ApiError> {
    let tenant_id = auth.tenant()?;

    let progress = Progress::new(tenant_id, auth.user_id, body.node, body.completed);
    state.store.put_progress(&progress)?;

    Ok(Json(progress))
}

/// List all of the caller's progress rows.
pub async fn list_progress(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<Progress>>, ApiError> {
    let tenant_id = auth.tenant()?;
    Ok(Json(state.store.list_progress(&tenant_id, &auth.user_id)?))
}

// =============================================================================
// Notes
// =============================================================================

/// Note upsert request. The scope is flattened into the body:
/// `{"scope":"lesson","lesson_id":"...","body":"..."}`.
#[derive(Debug, Deserialize)]
pub struct PutNoteRequest {
    /// Attachment point.
    #[serde(flatten)]
    pub scope: NoteScope,
    /// Note body (markdown).
    pub body: String,
}

/// Create or replace the caller's note on one scope.
pub async fn put_note(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<PutNoteRequest>,
) -> Result<Json<Note>, ApiError> {
    let tenant_id = auth.tenant()?;

    if body.body.trim().is_empty() {
        return Err(DomainError::invalid("body", "must not be empty").into());
    }

    let mut note = Note::new(tenant_id, auth.user_id, body.scope, body.body);
    // An edit keeps the original creation time.
    if let Some(existing) = state.store.get_note(&tenant_id, &auth.user_id, &note.scope)? {
        note.created_at = existing.created_at;
    }
    state.store.put_note(&note)?;

    Ok(Json(note))
}

/// List all of the caller's notes.
pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<Note>>, ApiError> {
    let tenant_id = auth.tenant()?;
    Ok(Json(state.store.list_notes(&tenant_id, &auth.user_id)?))
}

/// Delete the caller's note on a lesson.
pub async fn delete_lesson_note(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(lesson_id): Path<LessonId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tenant_id = auth.tenant()?;

    state.store.delete_note(
        &tenant_id,
        &auth.user_id,
        &NoteScope::Lesson { lesson_id },
    )?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Delete the caller's note on a chapter within a curriculum.
pub async fn delete_chapter_note(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((curriculum_id, chapter_id)): Path<(CurriculumId, ChapterId)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tenant_id = auth.tenant()?;

    state.store.delete_note(
        &tenant_id,
        &auth.user_id,
        &NoteScope::Chapter {
            curriculum_id,
            chapter_id,
        },
    )?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

// =============================================================================
// Highlights
// =============================================================================

/// Highlight creation request.
#[derive(Debug, Deserialize)]
pub struct CreateHighlightRequest {
    /// The highlighted text.
    pub text: String,
    /// Character offset where the highlight starts.
    pub start_offset: u32,
    /// Character offset where the highlight ends.
    pub end_offset: u32,
}

/// Add a highlight to a lesson.
pub async fn create_highlight(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(lesson_id): Path<LessonId>,
    Json(body): Json<CreateHighlightRequest>,
) -> Result<Json<Highlight>, ApiError> {
    let tenant_id = auth.tenant()?;

    if body.text.trim().is_empty() {
        return Err(DomainError::invalid("text", "must not be empty").into());
    }
    if body.end_offset <= body.start_offset {
        return Err(
            DomainError::invalid("end_offset", "must be greater than start_offset").into(),
        );
    }

    let highlight = Highlight::new(
        tenant_id,
        auth.user_id,
        lesson_id,
        body.text,
        body.start_offset,
        body.end_offset,
    );
    state.store.put_highlight(&highlight)?;

    Ok(Json(highlight))
}

/// List the caller's highlights within a lesson, oldest first.
pub async fn list_highlights(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(lesson_id): Path<LessonId>,
) -> Result<Json<Vec<Highlight>>, ApiError> {
    let tenant_id = auth.tenant()?;
    Ok(Json(state.store.list_highlights(
        &tenant_id,
        &auth.user_id,
        &lesson_id,
    )?))
}

/// Remove one of the caller's highlights.
pub async fn delete_highlight(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((lesson_id, highlight_id)): Path<(LessonId, HighlightId)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tenant_id = auth.tenant()?;

    state
        .store
        .delete_highlight(&tenant_id, &auth.user_id, &lesson_id, &highlight_id)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

// =============================================================================
// Bookmarks
// =============================================================================

/// Bookmark a lesson. Idempotent; re-bookmarking refreshes the timestamp.
pub async fn put_bookmark(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(lesson_id): Path<LessonId>,
) -> Result<Json<Bookmark>, ApiError> {
    let tenant_id = auth.tenant()?;

    let bookmark = Bookmark::new(tenant_id, auth.user_id, lesson_id);
    state.store.put_bookmark(&bookmark)?;

    Ok(Json(bookmark))
}

/// Remove the caller's bookmark on a lesson.
pub async fn delete_bookmark(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(lesson_id): Path<LessonId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let tenant_id = auth.tenant()?;

    state
        .store
        .delete_bookmark(&tenant_id, &auth.user_id, &lesson_id)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// List all of the caller's bookmarks.
pub async fn list_bookmarks(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<Bookmark>>, ApiError> {
    let tenant_id = auth.tenant()?;
    Ok(Json(state.store.list_bookmarks(&tenant_id, &auth.user_id)?))
}
