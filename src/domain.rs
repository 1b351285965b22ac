//! Domain models: tokens, rewrite rules, recorded steps, and questions.

use serde::{Deserialize, Serialize};

use crate::content::CfgContent;
use crate::util::fresh_token_id;

/// Synthetic uniqueness tag carried by every token.
pub type TokenId = u64;

/// One typed symbol in a sequence being rewritten.
/// Only `kind` carries meaning; `id` just keeps tokens distinguishable.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
  #[serde(default)]
  pub id: TokenId,
  #[serde(rename = "type")]
  pub kind: String,
}

impl Token {
  /// New token with a freshly generated id.
  pub fn new(kind: impl Into<String>) -> Self {
    Self { id: fresh_token_id(), kind: kind.into() }
  }

  /// Copy of this token with a fresh id and the same `kind`.
  pub fn refreshed(&self) -> Self {
    Self { id: fresh_token_id(), kind: self.kind.clone() }
  }
}

/// Build a token list from symbol names.
pub fn tokens<I, S>(kinds: I) -> Vec<Token>
where
  I: IntoIterator<Item = S>,
  S: Into<String>,
{
  kinds.into_iter().map(Token::new).collect()
}

/// The `kind` sequence of a token list, ignoring ids.
pub fn kinds(seq: &[Token]) -> Vec<&str> {
  seq.iter().map(|t| t.kind.as_str()).collect()
}

/// Rewrite mapping: a contiguous run matching `before` (by kind, in order) becomes `after`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
  pub id: String,
  #[serde(default)]
  pub before: Vec<Token>,
  #[serde(default)]
  pub after: Vec<Token>,
}

/// Record of one rule application and the full sequence it produced.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Step {
  pub rule_id: String,
  pub index: usize,
  pub replaced_count: usize,
  #[serde(default)]
  pub end_state: Vec<Token>,
}

/// Where did a question come from?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSource {
  LocalBank, // from the TOML bank
  Seed,      // built in
  Created,   // authored through a create session
  Generated, // random walk over another question's rules
}

/// A rewriting question: rules, a start sequence, and the sequence to reach.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
  pub id: String,
  pub title: String,
  pub difficulty: String,
  pub source: QuestionSource,
  pub content: CfgContent,
}

/// What a session does with its question.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
  /// Author edits rules and start state; the reached sequence becomes the target.
  Create,
  /// Learner applies rules from the start state trying to reach the target.
  Solve,
}
