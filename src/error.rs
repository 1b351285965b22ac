//! Service-level errors shared by HTTP and WebSocket handlers.

use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use crate::domain::SessionMode;
use crate::engine::EngineError;
use crate::notation::NotationError;
use crate::protocol::ErrorOut;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Unknown question: {0}")]
  QuestionNotFound(String),
  #[error("Unknown session: {0}")]
  SessionNotFound(String),
  #[error("'{op}' is not available in {mode:?} sessions")]
  WrongMode { op: &'static str, mode: SessionMode },
  #[error("Nothing to {0}")]
  EmptyHistory(&'static str),
  #[error("Requested {requested} generator steps; the limit is {limit}")]
  StepLimit { requested: usize, limit: usize },
  #[error("Background task failed: {0}")]
  TaskFailed(String),
  #[error(transparent)]
  Engine(#[from] EngineError),
  #[error(transparent)]
  Notation(#[from] NotationError),
}

impl AppError {
  pub fn status(&self) -> StatusCode {
    match self {
      AppError::QuestionNotFound(_) | AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
      AppError::WrongMode { .. } | AppError::EmptyHistory(_) => StatusCode::CONFLICT,
      AppError::Engine(EngineError::DuplicateRule(_)) => StatusCode::CONFLICT,
      AppError::Engine(_) | AppError::Notation(_) | AppError::StepLimit { .. } => StatusCode::UNPROCESSABLE_ENTITY,
      AppError::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> axum::response::Response {
    (self.status(), Json(ErrorOut { error: self.to_string() })).into_response()
  }
}
