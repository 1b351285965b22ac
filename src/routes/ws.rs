//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::error::AppError;
use crate::logic;
use crate::protocol::{to_question_out, to_session_out, to_summary, ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "rewrite_lab", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "rewrite_lab", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "rewrite_lab", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "rewrite_lab", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "rewrite_lab", "WebSocket disconnected");
}

/// Dispatch one client message. Errors become a single `error` reply.
#[instrument(level = "info", skip(state))]
pub async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match dispatch(msg, state).await {
    Ok(reply) => reply,
    Err(e) => {
      debug!(target: "session", error = %e, "WS request failed");
      ServerWsMessage::Error { message: e.to_string() }
    }
  }
}

async fn dispatch(msg: ClientWsMessage, state: &AppState) -> Result<ServerWsMessage, AppError> {
  use ClientWsMessage as C;
  use ServerWsMessage as S;

  Ok(match msg {
    C::Ping => S::Pong,

    C::ListQuestions => {
      let all = state.list_questions().await;
      S::Questions { questions: all.iter().map(to_summary).collect() }
    }

    C::GetQuestion { question_id } => {
      let q = state.get_question(&question_id).await?;
      S::Question { question: to_question_out(&q) }
    }

    C::GenerateQuestion { base_question_id, max_steps } => {
      let q = state.generate_question(&base_question_id, max_steps).await?;
      S::Question { question: to_question_out(&q) }
    }

    C::OpenSession { question_id, mode } => {
      let s = state.open_session(&question_id, mode).await?;
      info!(target: "session", id = %s.id, %question_id, "WS session opened");
      S::Session { session: to_session_out(&s) }
    }

    C::ApplyRule { session_id, rule_id, index, count } => S::Session {
      session: logic::apply_rule(state, &session_id, &rule_id, index, count).await?,
    },

    C::Undo { session_id } => S::Session { session: logic::undo(state, &session_id).await? },

    C::Redo { session_id } => S::Session { session: logic::redo(state, &session_id).await? },

    C::Replay { session_id } => S::Session { session: logic::replay(state, &session_id).await? },

    C::Matches { session_id, rule_id } => S::Matches(logic::matches(state, &session_id, &rule_id).await?),

    C::Check { session_id } => S::Check(logic::check(state, &session_id).await?),

    C::AddRule { session_id, id, rule } => S::Session {
      session: logic::add_rule(state, &session_id, &id, &rule).await?,
    },

    C::RemoveRule { session_id, rule_id } => S::Session {
      session: logic::remove_rule(state, &session_id, &rule_id).await?,
    },

    C::ResetStart { session_id, start } => S::Session {
      session: logic::reset_start(state, &session_id, &start).await?,
    },

    C::Save { session_id } => {
      let q = state.save_session(&session_id).await?;
      S::Question { question: to_question_out(&q) }
    }

    C::CloseSession { session_id } => {
      state.close_session(&session_id).await?;
      S::Closed { session_id }
    }
  })
}
