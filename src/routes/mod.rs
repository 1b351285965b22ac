//! Router assembly: HTTP endpoints, WebSocket upgrade, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - REST-ish API under `/api/v1/...`
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // Questions
        .route("/api/v1/health", get(http::http_health))
        .route(
            "/api/v1/questions",
            get(http::http_list_questions).post(http::http_create_question),
        )
        .route("/api/v1/questions/generate", post(http::http_generate_question))
        .route("/api/v1/questions/:id", get(http::http_get_question))
        // Sessions
        .route("/api/v1/sessions", post(http::http_open_session))
        .route(
            "/api/v1/sessions/:id",
            get(http::http_get_session).delete(http::http_close_session),
        )
        .route("/api/v1/sessions/:id/apply", post(http::http_apply_rule))
        .route("/api/v1/sessions/:id/undo", post(http::http_undo))
        .route("/api/v1/sessions/:id/redo", post(http::http_redo))
        .route("/api/v1/sessions/:id/replay", post(http::http_replay))
        .route("/api/v1/sessions/:id/matches", get(http::http_matches))
        .route("/api/v1/sessions/:id/check", post(http::http_check))
        .route("/api/v1/sessions/:id/save", post(http::http_save))
        .route("/api/v1/sessions/:id/rules", post(http::http_add_rule))
        .route("/api/v1/sessions/:id/rules/:rule_id", delete(http::http_remove_rule))
        .route("/api/v1/sessions/:id/start", put(http::http_reset_start))
        // State + HTTP tracing (outermost) + CORS
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}
