//! Compact text notation for authoring sequences and rules.
//!
//! - Sequence: whitespace-separated symbols, e.g. `"a S b"`. `ε` (or an empty
//!   string) is the empty sequence.
//! - Rule: `"S -> a S b"`. The left-hand side must not be empty.

use thiserror::Error;

use crate::domain::{tokens, Rule, Token};

pub const ARROW: &str = "->";
pub const EPSILON: &str = "ε";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotationError {
  #[error("Rule '{0}' is missing '->'")]
  MissingArrow(String),
  #[error("Rule '{0}' has an empty left-hand side")]
  EmptyLeft(String),
}

/// Parse a sequence. Never fails: every non-blank word is a symbol.
pub fn parse_sequence(text: &str) -> Vec<Token> {
  tokens(text.split_whitespace().filter(|w| *w != EPSILON))
}

/// Parse `"lhs -> rhs"` into a rule with the given id.
pub fn parse_rule(id: impl Into<String>, text: &str) -> Result<Rule, NotationError> {
  let (lhs, rhs) = text
    .split_once(ARROW)
    .ok_or_else(|| NotationError::MissingArrow(text.to_string()))?;
  let before = parse_sequence(lhs);
  if before.is_empty() {
    return Err(NotationError::EmptyLeft(text.to_string()));
  }
  Ok(Rule { id: id.into(), before, after: parse_sequence(rhs) })
}

/// Render a sequence back to notation.
pub fn render_sequence(seq: &[Token]) -> String {
  if seq.is_empty() {
    return EPSILON.to_string();
  }
  seq.iter().map(|t| t.kind.as_str()).collect::<Vec<_>>().join(" ")
}

pub fn render_rule(rule: &Rule) -> String {
  format!("{} {} {}", render_sequence(&rule.before), ARROW, render_sequence(&rule.after))
}
