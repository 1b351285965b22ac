//! Rewrite Lab backend binary.
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   QUESTION_BANK_PATH  : path to TOML question bank (optional; built-in seeds always load)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use rewrite_lab_backend::routes::build_router;
use rewrite_lab_backend::state::AppState;
use rewrite_lab_backend::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared application state (question bank, sessions).
  let state = Arc::new(AppState::new());

  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "rewrite_lab", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "rewrite_lab", sessions = state.sessions.read().await.len(), "Server stopped; unsaved sessions discarded");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "rewrite_lab", error = %e, "Failed to listen for shutdown signal");
  }
}
