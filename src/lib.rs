//! Rewrite Lab · grammar-rewriting practice backend
//!
//! Learners and authors work on rewriting questions: an ordered token sequence
//! is rewritten by rules, each application is recorded as a step, and undo/redo
//! rebuild the sequence by replaying steps from the start state.
//!
//! - `engine`: the step/replay engine (`Derivation`)
//! - `state` + `logic`: in-memory question bank and live sessions
//! - `routes`: Axum HTTP + WebSocket surface

pub mod telemetry;
pub mod util;
pub mod domain;
pub mod content;
pub mod notation;
pub mod engine;
pub mod generator;
pub mod config;
pub mod seeds;
pub mod error;
pub mod state;
pub mod protocol;
pub mod logic;
pub mod routes;
