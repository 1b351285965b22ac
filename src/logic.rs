//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Applying rules, undo/redo and replay on a session's derivation
//!   - Rule match lookup and solve checks
//!   - Creator edits (rules, start state) and saving drafts
//!
//! Every session operation returns a fresh `SessionOut` snapshot.

use tracing::{info, instrument};

use crate::domain::SessionMode;
use crate::error::AppError;
use crate::notation::{parse_rule, parse_sequence};
use crate::protocol::{to_session_out, CheckOut, MatchesOut, SessionOut};
use crate::state::AppState;

#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn session_snapshot(state: &AppState, session_id: &str) -> Result<SessionOut, AppError> {
  let s = state.get_session(session_id).await?;
  Ok(to_session_out(&s))
}

#[instrument(level = "info", skip(state), fields(%session_id, %rule_id, %index, ?count))]
pub async fn apply_rule(
  state: &AppState,
  session_id: &str,
  rule_id: &str,
  index: usize,
  count: Option<usize>,
) -> Result<SessionOut, AppError> {
  state
    .with_session(session_id, |s| {
      let step = s.derivation.apply_rule(rule_id, index, count)?;
      info!(target: "session", id = %s.id, %rule_id, index, replaced = step.replaced_count, "Rule applied");
      Ok(to_session_out(s))
    })
    .await
}

#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn undo(state: &AppState, session_id: &str) -> Result<SessionOut, AppError> {
  state
    .with_session(session_id, |s| {
      let (step, replay) = s.derivation.undo().ok_or(AppError::EmptyHistory("undo"))?;
      s.skipped = replay.skipped;
      info!(target: "session", id = %s.id, rule_id = %step.rule_id, remaining = s.derivation.steps().len(), "Step undone");
      Ok(to_session_out(s))
    })
    .await
}

#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn redo(state: &AppState, session_id: &str) -> Result<SessionOut, AppError> {
  state
    .with_session(session_id, |s| {
      let (step, replay) = s.derivation.redo().ok_or(AppError::EmptyHistory("redo"))?;
      s.skipped = replay.skipped;
      info!(target: "session", id = %s.id, rule_id = %step.rule_id, steps = s.derivation.steps().len(), "Step redone");
      Ok(to_session_out(s))
    })
    .await
}

/// Rebuild the visible sequence from the initial state.
#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn replay(state: &AppState, session_id: &str) -> Result<SessionOut, AppError> {
  state
    .with_session(session_id, |s| {
      s.skipped = s.derivation.replay().skipped;
      Ok(to_session_out(s))
    })
    .await
}

#[instrument(level = "debug", skip(state), fields(%session_id, %rule_id))]
pub async fn matches(state: &AppState, session_id: &str, rule_id: &str) -> Result<MatchesOut, AppError> {
  let s = state.get_session(session_id).await?;
  let indices = s.derivation.matches(rule_id)?;
  Ok(MatchesOut { rule_id: rule_id.to_string(), indices })
}

#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn check(state: &AppState, session_id: &str) -> Result<CheckOut, AppError> {
  let s = state.get_session(session_id).await?;
  s.require("check", SessionMode::Solve)?;
  let out = CheckOut { solved: s.solved(), steps: s.derivation.steps().len() };
  info!(target: "session", id = %s.id, question_id = %s.question_id, solved = out.solved, steps = out.steps, "Solution checked");
  Ok(out)
}

#[instrument(level = "info", skip(state, text), fields(%session_id, %rule_id))]
pub async fn add_rule(state: &AppState, session_id: &str, rule_id: &str, text: &str) -> Result<SessionOut, AppError> {
  let rule = parse_rule(rule_id, text)?;
  state
    .with_session(session_id, |s| {
      s.require("add_rule", SessionMode::Create)?;
      s.derivation.add_rule(rule)?;
      Ok(to_session_out(s))
    })
    .await
}

/// Remove a rule. Steps recorded with it stay in the history and are skipped on replay,
/// so the sequence is rebuilt immediately to show the effect.
#[instrument(level = "info", skip(state), fields(%session_id, %rule_id))]
pub async fn remove_rule(state: &AppState, session_id: &str, rule_id: &str) -> Result<SessionOut, AppError> {
  state
    .with_session(session_id, |s| {
      s.require("remove_rule", SessionMode::Create)?;
      s.derivation
        .remove_rule(rule_id)
        .ok_or_else(|| crate::engine::EngineError::UnknownRule(rule_id.to_string()))?;
      s.skipped = s.derivation.replay().skipped;
      Ok(to_session_out(s))
    })
    .await
}

#[instrument(level = "info", skip(state, text), fields(%session_id))]
pub async fn reset_start(state: &AppState, session_id: &str, text: &str) -> Result<SessionOut, AppError> {
  let start = parse_sequence(text);
  state
    .with_session(session_id, |s| {
      s.require("reset_start", SessionMode::Create)?;
      s.derivation.reset_initial(start);
      s.skipped.clear();
      Ok(to_session_out(s))
    })
    .await
}
