//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; failures map to status codes via `AppError`.

use std::sync::Arc;
use axum::{extract::{Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, AppError>;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_list_questions(State(state): State<Arc<AppState>>) -> Json<Vec<QuestionSummary>> {
  let all = state.list_questions().await;
  Json(all.iter().map(to_summary).collect())
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_question(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> ApiResult<QuestionOut> {
  let q = state.get_question(&id).await?;
  Ok(Json(to_question_out(&q)))
}

#[instrument(level = "info", skip(state, body), fields(difficulty = %body.difficulty, has_content = body.content.is_some()))]
pub async fn http_create_question(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CreateQuestionIn>,
) -> impl IntoResponse {
  let q = state
    .create_question(&body.title, &body.difficulty, body.content.as_deref())
    .await;
  (StatusCode::CREATED, Json(to_question_out(&q)))
}

#[instrument(level = "info", skip(state, body), fields(base = %body.base_question_id))]
pub async fn http_generate_question(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GenerateIn>,
) -> Result<impl IntoResponse, AppError> {
  let q = state.generate_question(&body.base_question_id, body.max_steps).await?;
  Ok((StatusCode::CREATED, Json(to_question_out(&q))))
}

#[instrument(level = "info", skip(state, body), fields(question_id = %body.question_id, mode = ?body.mode))]
pub async fn http_open_session(
  State(state): State<Arc<AppState>>,
  Json(body): Json<OpenSessionIn>,
) -> Result<impl IntoResponse, AppError> {
  let s = state.open_session(&body.question_id, body.mode).await?;
  Ok((StatusCode::CREATED, Json(to_session_out(&s))))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> ApiResult<SessionOut> {
  Ok(Json(logic::session_snapshot(&state, &id).await?))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_close_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
  state.close_session(&id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip(state, body), fields(%id, rule_id = %body.rule_id, index = body.index))]
pub async fn http_apply_rule(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<ApplyIn>,
) -> ApiResult<SessionOut> {
  let out = logic::apply_rule(&state, &id, &body.rule_id, body.index, body.count).await?;
  info!(target: "session", %id, steps = out.steps.len(), solved = out.solved, "HTTP apply_rule served");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_undo(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<SessionOut> {
  Ok(Json(logic::undo(&state, &id).await?))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_redo(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<SessionOut> {
  Ok(Json(logic::redo(&state, &id).await?))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_replay(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<SessionOut> {
  Ok(Json(logic::replay(&state, &id).await?))
}

#[instrument(level = "info", skip(state), fields(%id, rule_id = %q.rule_id))]
pub async fn http_matches(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Query(q): Query<MatchesQuery>,
) -> ApiResult<MatchesOut> {
  Ok(Json(logic::matches(&state, &id, &q.rule_id).await?))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_check(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<CheckOut> {
  Ok(Json(logic::check(&state, &id).await?))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_save(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<QuestionOut> {
  let q = state.save_session(&id).await?;
  Ok(Json(to_question_out(&q)))
}

#[instrument(level = "info", skip(state, body), fields(%id, rule_id = %body.id))]
pub async fn http_add_rule(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<AddRuleIn>,
) -> ApiResult<SessionOut> {
  Ok(Json(logic::add_rule(&state, &id, &body.id, &body.rule).await?))
}

#[instrument(level = "info", skip(state), fields(%id, %rule_id))]
pub async fn http_remove_rule(
  State(state): State<Arc<AppState>>,
  Path((id, rule_id)): Path<(String, String)>,
) -> ApiResult<SessionOut> {
  Ok(Json(logic::remove_rule(&state, &id, &rule_id).await?))
}

#[instrument(level = "info", skip(state, body), fields(%id))]
pub async fn http_reset_start(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<StartIn>,
) -> ApiResult<SessionOut> {
  Ok(Json(logic::reset_start(&state, &id, &body.start).await?))
}
