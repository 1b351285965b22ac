//! HTTP-level tests for the session API.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`; no socket is bound.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use rewrite_lab_backend::routes::build_router;
use rewrite_lab_backend::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

// ── Helpers ────────────────────────────────────────────────────

fn app(state: &Arc<AppState>) -> axum::Router {
    build_router(state.clone())
}

async fn call(state: &Arc<AppState>, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();
    let resp = app(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn open(state: &Arc<AppState>, question_id: &str, mode: &str) -> String {
    let (status, body) = call(
        state,
        "POST",
        "/api/v1/sessions",
        Some(json!({ "questionId": question_id, "mode": mode })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

// ── Tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_and_question_listing() {
    let state = Arc::new(AppState::default());
    let (status, body) = call(&state, "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let (status, body) = call(&state, "GET", "/api/v1/questions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().iter().any(|q| q["id"] == "q-anbn"));

    let (status, body) = call(&state, "GET", "/api/v1/questions/q-anbn", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rulesText"][0], "S -> a S b");
    assert_eq!(body["content"]["startState"][0]["type"], "S");

    let (status, _) = call(&state, "GET", "/api/v1/questions/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn solve_session_apply_undo_redo() {
    let state = Arc::new(AppState::default());
    let sid = open(&state, "q-collapse", "solve").await;

    let (status, body) = call(
        &state,
        "POST",
        &format!("/api/v1/sessions/{sid}/apply"),
        Some(json!({ "ruleId": "R1", "index": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentText"], "X C");
    assert_eq!(body["steps"][0]["replacedCount"], 2);
    assert_eq!(body["solved"], true);

    let (_, body) = call(&state, "POST", &format!("/api/v1/sessions/{sid}/undo"), None).await;
    assert_eq!(body["currentText"], "A B C");
    assert_eq!(body["canRedo"], true);

    let (_, body) = call(&state, "POST", &format!("/api/v1/sessions/{sid}/redo"), None).await;
    assert_eq!(body["currentText"], "X C");

    let (status, body) = call(&state, "POST", &format!("/api/v1/sessions/{sid}/check"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "solved": true, "steps": 1 }));
}

#[tokio::test]
async fn bad_requests_map_to_status_codes() {
    let state = Arc::new(AppState::default());
    let sid = open(&state, "q-collapse", "solve").await;

    let (status, body) = call(
        &state,
        "POST",
        &format!("/api/v1/sessions/{sid}/apply"),
        Some(json!({ "ruleId": "nope", "index": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Unknown rule: nope");

    let (status, _) = call(&state, "POST", &format!("/api/v1/sessions/{sid}/undo"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(&state, "POST", &format!("/api/v1/sessions/{sid}/save"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(&state, "GET", "/api/v1/sessions/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn author_create_edit_save_and_close() {
    let state = Arc::new(AppState::default());
    let (status, q) = call(
        &state,
        "POST",
        "/api/v1/questions",
        Some(json!({ "title": "Mirror", "difficulty": "easy", "content": "{broken" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(q["source"], "created");
    assert_eq!(q["startText"], "ε");
    let qid = q["id"].as_str().unwrap().to_string();

    let sid = open(&state, &qid, "create").await;
    let (status, _) = call(&state, "PUT", &format!("/api/v1/sessions/{sid}/start"), Some(json!({ "start": "S" }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(
        &state,
        "POST",
        &format!("/api/v1/sessions/{sid}/rules"),
        Some(json!({ "id": "wrap", "rule": "S -> x S x" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    call(&state, "POST", &format!("/api/v1/sessions/{sid}/rules"), Some(json!({ "id": "end", "rule": "S -> y" }))).await;

    let (_, m) = call(&state, "GET", &format!("/api/v1/sessions/{sid}/matches?ruleId=wrap"), None).await;
    assert_eq!(m["indices"], json!([0]));

    call(&state, "POST", &format!("/api/v1/sessions/{sid}/apply"), Some(json!({ "ruleId": "wrap", "index": 0 }))).await;
    call(&state, "POST", &format!("/api/v1/sessions/{sid}/apply"), Some(json!({ "ruleId": "end", "index": 1 }))).await;

    let (status, saved) = call(&state, "POST", &format!("/api/v1/sessions/{sid}/save"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["targetText"], "x y x");
    assert_eq!(saved["content"]["steps"].as_array().unwrap().len(), 2);

    let (_, after_remove) = call(&state, "DELETE", &format!("/api/v1/sessions/{sid}/rules/wrap"), None).await;
    assert_eq!(after_remove["skippedSteps"], json!([0]));

    let (status, _) = call(&state, "DELETE", &format!("/api/v1/sessions/{sid}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // A solver now works towards the saved target.
    let solver = open(&state, &qid, "solve").await;
    let (_, s) = call(&state, "GET", &format!("/api/v1/sessions/{solver}"), None).await;
    assert_eq!(s["currentText"], "S");
    assert_eq!(s["target"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn generated_questions_are_stored() {
    let state = Arc::new(AppState::default());
    let (status, q) = call(
        &state,
        "POST",
        "/api/v1/questions/generate",
        Some(json!({ "baseQuestionId": "q-anbn", "maxSteps": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(q["source"], "generated");
    let qid = q["id"].as_str().unwrap();
    let (status, _) = call(&state, "GET", &format!("/api/v1/questions/{qid}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn overlong_generator_walks_are_rejected() {
    let state = Arc::new(AppState::default());
    let (status, body) = call(
        &state,
        "POST",
        "/api/v1/questions/generate",
        Some(json!({ "baseQuestionId": "q-anbn", "maxSteps": 10000 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("limit is 64"));
}
