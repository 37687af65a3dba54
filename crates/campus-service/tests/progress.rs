//! Progress, notes, highlights, and bookmark integration tests.

mod common;

use axum::http::StatusCode;
use campus_core::UserId;
use common::TestHarness;
use serde_json::json;

fn lesson_id() -> String {
    campus_core::LessonId::generate().to_string()
}

// ============================================================================
// Progress
// ============================================================================

#[tokio::test]
async fn progress_is_an_upsert_per_node() {
    let harness = TestHarness::new();
    let tenant_id = harness.register_tenant("Progress Co", "progress-co").await;
    let auth = harness.member_auth_header(&tenant_id);
    let lesson = lesson_id();

    harness
        .server
        .put("/v1/progress")
        .add_header("authorization", &auth)
        .json(&json!({ "node": "lesson", "lesson_id": lesson, "completed": true }))
        .await
        .assert_status_ok();

    // Flipping completion overwrites rather than duplicating.
    harness
        .server
        .put("/v1/progress")
        .add_header("authorization", &auth)
        .json(&json!({ "node": "lesson", "lesson_id": lesson, "completed": false }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/v1/progress")
        .add_header("authorization", &auth)
        .await;
    response.assert_status_ok();
    let rows: serde_json::Value = response.json();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["completed"], false);
}

#[tokio::test]
async fn progress_is_scoped_to_the_user() {
    let harness = TestHarness::new();
    let tenant_id = harness.register_tenant("Private Co", "private-co").await;

    harness
        .server
        .put("/v1/progress")
        .add_header("authorization", harness.member_auth_header(&tenant_id))
        .json(&json!({ "node": "lesson", "lesson_id": lesson_id(), "completed": true }))
        .await
        .assert_status_ok();

    let other = UserId::generate();
    let response = harness
        .server
        .get("/v1/progress")
        .add_header(
            "authorization",
            TestHarness::user_auth_header(&other, &tenant_id),
        )
        .await;
    let rows: serde_json::Value = response.json();
    assert!(rows.as_array().unwrap().is_empty());
}

// ============================================================================
// Notes
// ============================================================================

#[tokio::test]
async fn one_note_per_lesson_with_replacement() {
    let harness = TestHarness::new();
    let tenant_id = harness.register_tenant("Notes Co", "notes-co").await;
    let auth = harness.member_auth_header(&tenant_id);
    let lesson = lesson_id();

    harness
        .server
        .put("/v1/notes")
        .add_header("authorization", &auth)
        .json(&json!({ "scope": "lesson", "lesson_id": lesson, "body": "first draft" }))
        .await
        .assert_status_ok();

    harness
        .server
        .put("/v1/notes")
        .add_header("authorization", &auth)
        .json(&json!({ "scope": "lesson", "lesson_id": lesson, "body": "final" }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/v1/notes")
        .add_header("authorization", &auth)
        .await;
    let notes: serde_json::Value = response.json();
    let notes = notes.as_array().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["body"], "final");
}

#[tokio::test]
async fn chapter_notes_are_distinct_from_lesson_notes() {
    let harness = TestHarness::new();
    let tenant_id = harness.register_tenant("Scoped Co", "scoped-co").await;
    let auth = harness.member_auth_header(&tenant_id);
    let curriculum = campus_core::CurriculumId::generate().to_string();
    let chapter = campus_core::ChapterId::generate().to_string();

    harness
        .server
        .put("/v1/notes")
        .add_header("authorization", &auth)
        .json(&json!({
            "scope": "chapter",
            "curriculum_id": curriculum,
            "chapter_id": chapter,
            "body": "chapter summary"
        }))
        .await
        .assert_status_ok();

    harness
        .server
        .put("/v1/notes")
        .add_header("authorization", &auth)
        .json(&json!({ "scope": "lesson", "lesson_id": lesson_id(), "body": "lesson note" }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/v1/notes")
        .add_header("authorization", &auth)
        .await;
    let notes: serde_json::Value = response.json();
    assert_eq!(notes.as_array().unwrap().len(), 2);

    // Delete only the chapter note.
    harness
        .server
        .delete(&format!("/v1/notes/chapter/{curriculum}/{chapter}"))
        .add_header("authorization", &auth)
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/v1/notes")
        .add_header("authorization", &auth)
        .await;
    let notes: serde_json::Value = response.json();
    let notes = notes.as_array().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["scope"]["scope"], "lesson");
}

#[tokio::test]
async fn empty_note_body_fails_validation() {
    let harness = TestHarness::new();
    let tenant_id = harness.register_tenant("Empty Co", "empty-co").await;

    harness
        .server
        .put("/v1/notes")
        .add_header("authorization", harness.member_auth_header(&tenant_id))
        .json(&json!({ "scope": "lesson", "lesson_id": lesson_id(), "body": "   " }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn deleting_a_missing_note_is_not_found() {
    let harness = TestHarness::new();
    let tenant_id = harness.register_tenant("Missing Co", "missing-co").await;

    harness
        .server
        .delete(&format!("/v1/notes/lesson/{}", lesson_id()))
        .add_header("authorization", harness.member_auth_header(&tenant_id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// Highlights
// ============================================================================

#[tokio::test]
async fn highlights_accumulate_within_a_lesson() {
    let harness = TestHarness::new();
    let tenant_id = harness.register_tenant("Marker Co", "marker-co").await;
    let auth = harness.member_auth_header(&tenant_id);
    let lesson = lesson_id();

    for (text, start) in [("borrow checker", 10), ("lifetimes", 120)] {
        harness
            .server
            .post(&format!("/v1/lessons/{lesson}/highlights"))
            .add_header("authorization", &auth)
            .json(&json!({
                "text": text,
                "start_offset": start,
                "end_offset": start + 20
            }))
            .await
            .assert_status_ok();
    }

    let response = harness
        .server
        .get(&format!("/v1/lessons/{lesson}/highlights"))
        .add_header("authorization", &auth)
        .await;
    let highlights: serde_json::Value = response.json();
    let highlights = highlights.as_array().unwrap();
    assert_eq!(highlights.len(), 2);
    // Oldest first.
    assert_eq!(highlights[0]["text"], "borrow checker");

    let first_id = highlights[0]["id"].as_str().unwrap();
    harness
        .server
        .delete(&format!("/v1/lessons/{lesson}/highlights/{first_id}"))
        .add_header("authorization", &auth)
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get(&format!("/v1/lessons/{lesson}/highlights"))
        .add_header("authorization", &auth)
        .await;
    let highlights: serde_json::Value = response.json();
    assert_eq!(highlights.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn inverted_highlight_offsets_fail_validation() {
    let harness = TestHarness::new();
    let tenant_id = harness.register_tenant("Backward Co", "backward-co").await;

    harness
        .server
        .post(&format!("/v1/lessons/{}/highlights", lesson_id()))
        .add_header("authorization", harness.member_auth_header(&tenant_id))
        .json(&json!({ "text": "oops", "start_offset": 50, "end_offset": 10 }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

// ============================================================================
// Bookmarks
// ============================================================================

#[tokio::test]
async fn bookmarks_are_one_per_lesson_and_removable() {
    let harness = TestHarness::new();
    let tenant_id = harness.register_tenant("Bookmark Co", "bookmark-co").await;
    let auth = harness.member_auth_header(&tenant_id);
    let lesson = lesson_id();

    // Idempotent put.
    for _ in 0..2 {
        harness
            .server
            .put(&format!("/v1/lessons/{lesson}/bookmark"))
            .add_header("authorization", &auth)
            .await
            .assert_status_ok();
    }

    let response = harness
        .server
        .get("/v1/bookmarks")
        .add_header("authorization", &auth)
        .await;
    let bookmarks: serde_json::Value = response.json();
    assert_eq!(bookmarks.as_array().unwrap().len(), 1);

    harness
        .server
        .delete(&format!("/v1/lessons/{lesson}/bookmark"))
        .add_header("authorization", &auth)
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/v1/bookmarks")
        .add_header("authorization", &auth)
        .await;
    let bookmarks: serde_json::Value = response.json();
    assert!(bookmarks.as_array().unwrap().is_empty());
}
