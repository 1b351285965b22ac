//! Question content: the JSON blob a rewriting question carries.
//!
//! Shape (camelCase on the wire):
//!   { "rules": [...], "startState": [...], "endState": [...], "steps": [...] }
//!
//! Missing fields default to empty lists; unknown fields are ignored.
//! Rule ids must be unique: the strict parse rejects repeats, the total parse keeps the first.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::domain::{Rule, Step, Token};
use crate::util::trunc_for_log;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CfgContent {
  #[serde(default)]
  pub rules: Vec<Rule>,
  #[serde(default)]
  pub start_state: Vec<Token>,
  #[serde(default)]
  pub end_state: Vec<Token>,
  #[serde(default)]
  pub steps: Vec<Step>,
}

#[derive(Debug, Error)]
pub enum ContentError {
  #[error("Malformed question content: {0}")]
  Malformed(#[from] serde_json::Error),
  #[error("Rule id appears more than once: {0}")]
  DuplicateRule(String),
}

impl CfgContent {
  pub fn to_json(&self) -> String {
    // Plain structs with string keys; serialization cannot fail.
    serde_json::to_string(self).unwrap_or_else(|_| "{}".into())
  }

  /// First rule id that is used by an earlier rule as well.
  pub fn duplicate_rule_id(&self) -> Option<&str> {
    let mut seen = HashSet::new();
    self.rules.iter().map(|r| r.id.as_str()).find(|id| !seen.insert(*id))
  }

  /// Drop every rule whose id was already used; returns the dropped ids in order.
  pub fn dedup_rules(&mut self) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dropped = Vec::new();
    self.rules.retain(|r| {
      if seen.insert(r.id.clone()) {
        true
      } else {
        dropped.push(r.id.clone());
        false
      }
    });
    dropped
  }
}

/// Strict parse.
pub fn parse_content(raw: &str) -> Result<CfgContent, ContentError> {
  let content: CfgContent = serde_json::from_str(raw)?;
  if let Some(id) = content.duplicate_rule_id() {
    return Err(ContentError::DuplicateRule(id.to_string()));
  }
  Ok(content)
}

/// Total parse: malformed content is logged and replaced by empty content;
/// repeated rule ids are logged and only the first rule with each id is kept.
pub fn parse_content_or_default(raw: &str) -> CfgContent {
  match serde_json::from_str::<CfgContent>(raw) {
    Ok(mut c) => {
      let dropped = c.dedup_rules();
      if !dropped.is_empty() {
        warn!(target: "rewrite_lab", ?dropped, "Dropped rules with repeated ids");
      }
      c
    }
    Err(e) => {
      warn!(target: "rewrite_lab", error = %e, raw = %trunc_for_log(raw, 120), "Falling back to empty question content");
      CfgContent::default()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::kinds;

  const SAMPLE: &str = r#"{
    "rules": [{ "id": "r1", "before": [{ "id": 1, "type": "S" }], "after": [{ "id": 2, "type": "a" }, { "id": 3, "type": "b" }] }],
    "startState": [{ "id": 4, "type": "S" }],
    "endState": [{ "id": 5, "type": "a" }, { "id": 6, "type": "b" }],
    "steps": [{ "ruleId": "r1", "index": 0, "replacedCount": 1, "endState": [] }],
    "extra": "ignored"
  }"#;

  #[test]
  fn parses_camel_case_blob() {
    let c = parse_content(SAMPLE).unwrap();
    assert_eq!(c.rules.len(), 1);
    assert_eq!(kinds(&c.start_state), ["S"]);
    assert_eq!(kinds(&c.end_state), ["a", "b"]);
    assert_eq!(c.steps[0].rule_id, "r1");
  }

  #[test]
  fn missing_fields_default_to_empty() {
    let c = parse_content(r#"{ "startState": [{ "type": "S" }] }"#).unwrap();
    assert!(c.rules.is_empty());
    assert!(c.steps.is_empty());
    assert_eq!(c.start_state[0].id, 0);
  }

  #[test]
  fn malformed_content_falls_back_to_default() {
    assert!(parse_content("not json").is_err());
    assert_eq!(parse_content_or_default("not json"), CfgContent::default());
    assert_eq!(parse_content_or_default(r#"{ "rules": 3 }"#), CfgContent::default());
  }

  const REPEATED_IDS: &str = r#"{
    "rules": [
      { "id": "r", "before": [{ "type": "A" }], "after": [{ "type": "X" }] },
      { "id": "r", "before": [{ "type": "B" }], "after": [{ "type": "Y" }] },
      { "id": "s", "before": [{ "type": "C" }], "after": [] }
    ],
    "startState": [{ "type": "B" }],
    "endState": [{ "type": "Y" }]
  }"#;

  #[test]
  fn strict_parse_rejects_repeated_rule_ids() {
    let err = parse_content(REPEATED_IDS).unwrap_err();
    assert!(matches!(err, ContentError::DuplicateRule(ref id) if id == "r"));
  }

  #[test]
  fn total_parse_keeps_first_rule_per_id() {
    let c = parse_content_or_default(REPEATED_IDS);
    let ids: Vec<&str> = c.rules.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["r", "s"]);
    assert_eq!(kinds(&c.rules[0].before), ["A"]);
    assert_eq!(c.duplicate_rule_id(), None);
    assert_eq!(kinds(&c.start_state), ["B"]);
  }

  #[test]
  fn to_json_parses_back() {
    let c = parse_content(SAMPLE).unwrap();
    assert_eq!(parse_content(&c.to_json()).unwrap(), c);
  }
}
