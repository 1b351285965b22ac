//! Step/replay rewrite engine.
//!
//! A `Derivation` owns one editing or solving run:
//!   - the captured initial sequence (replay always starts here)
//!   - the visible current sequence
//!   - the rule set, addressed by rule id
//!   - a linear step history plus a redo stack
//!
//! Rule applications splice the current sequence in place and record a `Step`
//! with a snapshot of the result. Undo and redo never patch the sequence
//! directly; they move steps between the history and the redo stack and then
//! rebuild the sequence by replaying the history from the initial sequence.

use thiserror::Error;
use tracing::{debug, warn};

use crate::content::CfgContent;
use crate::domain::{Rule, Step, Token};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
  #[error("Unknown rule: {0}")]
  UnknownRule(String),
  #[error("Range {index}..{end} is outside the sequence (length {len})")]
  OutOfRange { index: usize, end: usize, len: usize },
  #[error("Rule id already exists: {0}")]
  DuplicateRule(String),
}

/// Result of replaying the step history from the initial sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Replay {
  pub tokens: Vec<Token>,
  /// Positions (in the step list) of steps whose rule no longer exists.
  pub skipped: Vec<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct Derivation {
  initial: Vec<Token>,
  current: Vec<Token>,
  rules: Vec<Rule>,
  steps: Vec<Step>,
  redo: Vec<Step>,
}

/// Replace `count` tokens at `index` with fresh copies of `after`.
/// Bounds clamp: an index past the end appends, a count past the end stops at the end.
pub(crate) fn splice(seq: &mut Vec<Token>, index: usize, count: usize, after: &[Token]) {
  let start = index.min(seq.len());
  let end = start + count.min(seq.len() - start);
  seq.splice(start..end, after.iter().map(Token::refreshed));
}

impl Derivation {
  /// Start a fresh run with an empty history.
  pub fn new(initial: Vec<Token>, rules: Vec<Rule>) -> Self {
    Self {
      current: initial.clone(),
      initial,
      rules,
      steps: Vec::new(),
      redo: Vec::new(),
    }
  }

  /// Restore a run from question content, replaying its saved steps.
  pub fn from_content(content: CfgContent) -> (Self, Replay) {
    let mut d = Self {
      current: Vec::new(),
      initial: content.start_state,
      rules: content.rules,
      steps: content.steps,
      redo: Vec::new(),
    };
    let replay = d.replay();
    (d, replay)
  }

  /// Serialize this run. `target` becomes `endState`; without one the current sequence is used.
  pub fn to_content(&self, target: Option<&[Token]>) -> CfgContent {
    CfgContent {
      rules: self.rules.clone(),
      start_state: self.initial.clone(),
      end_state: target.map(<[Token]>::to_vec).unwrap_or_else(|| self.current.clone()),
      steps: self.steps.clone(),
    }
  }

  pub fn initial(&self) -> &[Token] { &self.initial }
  pub fn current(&self) -> &[Token] { &self.current }
  pub fn rules(&self) -> &[Rule] { &self.rules }
  pub fn steps(&self) -> &[Step] { &self.steps }
  pub fn redo_stack(&self) -> &[Step] { &self.redo }
  pub fn can_undo(&self) -> bool { !self.steps.is_empty() }
  pub fn can_redo(&self) -> bool { !self.redo.is_empty() }

  pub fn rule(&self, id: &str) -> Option<&Rule> {
    self.rules.iter().find(|r| r.id == id)
  }

  /// Append a step. Any new action invalidates the redo branch.
  pub fn push_step(&mut self, step: Step) {
    self.steps.push(step);
    self.redo.clear();
  }

  /// Move the last step onto the redo stack. The visible sequence is untouched;
  /// call `replay` (or use `undo`) to rebuild it.
  pub fn pop_step(&mut self) -> Option<Step> {
    let step = self.steps.pop()?;
    self.redo.push(step.clone());
    Some(step)
  }

  /// Move the top of the redo stack back onto the history. The visible sequence is untouched.
  pub fn redo_step(&mut self) -> Option<Step> {
    let step = self.redo.pop()?;
    self.steps.push(step.clone());
    Some(step)
  }

  /// Rebuild the sequence from the initial state by re-applying every step in order.
  /// Steps whose rule has vanished are skipped and reported, never treated as errors.
  pub fn replay_from_initial(&self) -> Replay {
    let mut tokens = self.initial.clone();
    let mut skipped = Vec::new();
    for (pos, step) in self.steps.iter().enumerate() {
      match self.rule(&step.rule_id) {
        Some(rule) => splice(&mut tokens, step.index, step.replaced_count, &rule.after),
        None => {
          warn!(target: "engine", step = pos, rule_id = %step.rule_id, "Replay skipped step: rule not found");
          skipped.push(pos);
        }
      }
    }
    debug!(target: "engine", steps = self.steps.len(), skipped = skipped.len(), len = tokens.len(), "Replayed from initial state");
    Replay { tokens, skipped }
  }

  /// Replay and install the result as the current sequence.
  pub fn replay(&mut self) -> Replay {
    let replay = self.replay_from_initial();
    self.current = replay.tokens.clone();
    replay
  }

  /// Pop the last step and rebuild the sequence without it.
  pub fn undo(&mut self) -> Option<(Step, Replay)> {
    let step = self.pop_step()?;
    Some((step, self.replay()))
  }

  /// Restore the most recently undone step and rebuild the sequence with it.
  pub fn redo(&mut self) -> Option<(Step, Replay)> {
    let step = self.redo_step()?;
    Some((step, self.replay()))
  }

  /// Apply `rule_id` at `index`, consuming `count` tokens (default: the rule's `before` length).
  pub fn apply_rule(&mut self, rule_id: &str, index: usize, count: Option<usize>) -> Result<&Step, EngineError> {
    let rule = self
      .rule(rule_id)
      .ok_or_else(|| EngineError::UnknownRule(rule_id.to_string()))?;
    let replaced_count = count.unwrap_or(rule.before.len());
    let len = self.current.len();
    let end = index.checked_add(replaced_count).unwrap_or(usize::MAX);
    if end > len {
      return Err(EngineError::OutOfRange { index, end, len });
    }
    let after = rule.after.clone();

    splice(&mut self.current, index, replaced_count, &after);
    self.push_step(Step {
      rule_id: rule_id.to_string(),
      index,
      replaced_count,
      end_state: self.current.clone(),
    });
    debug!(target: "engine", %rule_id, index, replaced_count, len = self.current.len(), "Applied rule");
    Ok(&self.steps[self.steps.len() - 1])
  }

  /// Every index where the rule's `before` kinds occur contiguously in the current sequence.
  pub fn matches(&self, rule_id: &str) -> Result<Vec<usize>, EngineError> {
    let rule = self
      .rule(rule_id)
      .ok_or_else(|| EngineError::UnknownRule(rule_id.to_string()))?;
    Ok(match_positions(&self.current, &rule.before))
  }

  /// True when the current kinds equal the target's kinds.
  pub fn is_solved(&self, target: &[Token]) -> bool {
    self.current.len() == target.len()
      && self.current.iter().zip(target).all(|(a, b)| a.kind == b.kind)
  }

  pub fn add_rule(&mut self, rule: Rule) -> Result<(), EngineError> {
    if self.rule(&rule.id).is_some() {
      return Err(EngineError::DuplicateRule(rule.id));
    }
    self.rules.push(rule);
    Ok(())
  }

  /// Remove a rule. Steps already recorded with it stay in the history;
  /// later replays skip them.
  pub fn remove_rule(&mut self, rule_id: &str) -> Option<Rule> {
    let pos = self.rules.iter().position(|r| r.id == rule_id)?;
    Some(self.rules.remove(pos))
  }

  /// Replace the initial sequence. History and redo stack are discarded.
  pub fn reset_initial(&mut self, initial: Vec<Token>) {
    self.current = initial.clone();
    self.initial = initial;
    self.steps.clear();
    self.redo.clear();
  }
}

/// Start indices where `pattern` kinds occur contiguously in `seq`.
/// An empty pattern matches at every position, including the end.
pub fn match_positions(seq: &[Token], pattern: &[Token]) -> Vec<usize> {
  if pattern.len() > seq.len() {
    return Vec::new();
  }
  (0..=seq.len() - pattern.len())
    .filter(|&i| {
      seq[i..i + pattern.len()]
        .iter()
        .zip(pattern)
        .all(|(a, b)| a.kind == b.kind)
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{kinds, tokens};

  fn rule(id: &str, before: &[&str], after: &[&str]) -> Rule {
    Rule { id: id.into(), before: tokens(before.iter().copied()), after: tokens(after.iter().copied()) }
  }

  fn abc() -> Derivation {
    Derivation::new(tokens(["A", "B", "C"]), vec![rule("R1", &["A", "B"], &["X"])])
  }

  #[test]
  fn apply_undo_redo_scenario() {
    let mut d = abc();
    d.apply_rule("R1", 0, None).unwrap();
    assert_eq!(kinds(d.current()), ["X", "C"]);
    assert_eq!(d.steps().len(), 1);

    d.undo().unwrap();
    assert_eq!(kinds(d.current()), ["A", "B", "C"]);
    assert!(d.steps().is_empty());

    d.redo().unwrap();
    assert_eq!(kinds(d.current()), ["X", "C"]);
    assert!(!d.can_redo());
  }

  #[test]
  fn step_snapshot_records_arity() {
    let mut d = abc();
    let step = d.apply_rule("R1", 0, None).unwrap().clone();
    assert_eq!(step.replaced_count, 2);
    assert_eq!(step.index, 0);
    assert_eq!(kinds(&step.end_state), ["X", "C"]);
  }

  #[test]
  fn explicit_count_overrides_before_length() {
    let mut d = Derivation::new(tokens(["A", "B", "C", "D"]), vec![rule("R", &["A"], &["Y", "Z"])]);
    d.apply_rule("R", 1, Some(2)).unwrap();
    assert_eq!(kinds(d.current()), ["A", "Y", "Z", "D"]);
    assert_eq!(d.steps()[0].replaced_count, 2);
  }

  #[test]
  fn rewritten_tokens_get_fresh_ids() {
    let r = Rule {
      id: "R".into(),
      before: vec![Token { id: 0, kind: "A".into() }],
      after: vec![Token { id: 0, kind: "B".into() }],
    };
    let mut d = Derivation::new(vec![Token { id: 0, kind: "A".into() }], vec![r]);
    d.apply_rule("R", 0, None).unwrap();
    assert_eq!(d.current()[0].kind, "B");
    assert_ne!(d.current()[0].id, 0);
    assert_ne!(d.replay_from_initial().tokens[0].id, 0);
  }

  #[test]
  fn unknown_rule_is_rejected_without_side_effects() {
    let mut d = abc();
    let err = d.apply_rule("nope", 0, None).unwrap_err();
    assert_eq!(err, EngineError::UnknownRule("nope".into()));
    assert!(d.steps().is_empty());
    assert_eq!(kinds(d.current()), ["A", "B", "C"]);
  }

  #[test]
  fn out_of_range_is_rejected() {
    let mut d = abc();
    let err = d.apply_rule("R1", 2, None).unwrap_err();
    assert_eq!(err, EngineError::OutOfRange { index: 2, end: 4, len: 3 });
    assert!(d.apply_rule("R1", usize::MAX, None).is_err());
  }

  #[test]
  fn new_step_after_undo_clears_redo() {
    let mut d = Derivation::new(
      tokens(["A", "B", "C"]),
      vec![rule("R1", &["A", "B"], &["X"]), rule("R2", &["C"], &["Y"])],
    );
    d.apply_rule("R1", 0, None).unwrap();
    d.undo().unwrap();
    assert!(d.can_redo());
    d.apply_rule("R2", 2, None).unwrap();
    assert!(!d.can_redo());
    assert!(d.redo().is_none());
    assert_eq!(kinds(d.current()), ["A", "B", "Y"]);
  }

  #[test]
  fn pop_step_leaves_sequence_until_replay() {
    let mut d = abc();
    d.apply_rule("R1", 0, None).unwrap();
    d.pop_step().unwrap();
    assert_eq!(kinds(d.current()), ["X", "C"]);
    let replay = d.replay();
    assert_eq!(kinds(&replay.tokens), ["A", "B", "C"]);
    assert_eq!(kinds(d.current()), ["A", "B", "C"]);
  }

  #[test]
  fn replay_skips_steps_with_missing_rules() {
    let mut d = Derivation::new(
      tokens(["A", "B", "C"]),
      vec![rule("R1", &["A", "B"], &["X"]), rule("R2", &["C"], &["Y", "Y"])],
    );
    d.apply_rule("R1", 0, None).unwrap();
    d.apply_rule("R2", 1, None).unwrap();
    d.remove_rule("R1").unwrap();

    let replay = d.replay_from_initial();
    assert_eq!(replay.skipped, vec![0]);
    // R2 still splices at index 1 of the unrewritten sequence.
    assert_eq!(kinds(&replay.tokens), ["A", "Y", "Y", "C"]);
  }

  #[test]
  fn replay_clamps_out_of_bounds_steps() {
    let mut d = Derivation::new(tokens(["A"]), vec![rule("R", &["A"], &["B"])]);
    d.push_step(Step { rule_id: "R".into(), index: 5, replaced_count: 3, end_state: vec![] });
    let replay = d.replay_from_initial();
    assert_eq!(kinds(&replay.tokens), ["A", "B"]);
  }

  #[test]
  fn matches_find_every_occurrence() {
    let d = Derivation::new(tokens(["a", "S", "b", "S"]), vec![rule("r", &["S"], &["x"]), rule("e", &[], &["x"])]);
    assert_eq!(d.matches("r").unwrap(), vec![1, 3]);
    assert_eq!(d.matches("e").unwrap(), vec![0, 1, 2, 3, 4]);
    assert!(d.matches("missing").is_err());
  }

  #[test]
  fn is_solved_compares_kinds_only() {
    let mut d = abc();
    d.apply_rule("R1", 0, None).unwrap();
    assert!(d.is_solved(&tokens(["X", "C"])));
    assert!(!d.is_solved(&tokens(["X"])));
  }

  #[test]
  fn duplicate_rule_ids_are_rejected() {
    let mut d = abc();
    let err = d.add_rule(rule("R1", &["C"], &[])).unwrap_err();
    assert_eq!(err, EngineError::DuplicateRule("R1".into()));
    d.add_rule(rule("R2", &["C"], &[])).unwrap();
    assert_eq!(d.rules().len(), 2);
  }

  #[test]
  fn reset_initial_discards_history() {
    let mut d = abc();
    d.apply_rule("R1", 0, None).unwrap();
    d.undo().unwrap();
    d.reset_initial(tokens(["A", "B"]));
    assert!(!d.can_undo());
    assert!(!d.can_redo());
    assert_eq!(kinds(d.current()), ["A", "B"]);
  }

  #[test]
  fn content_round_trip_replays_steps() {
    let mut d = abc();
    d.apply_rule("R1", 0, None).unwrap();
    let (restored, replay) = Derivation::from_content(d.to_content(None));
    assert!(replay.skipped.is_empty());
    assert_eq!(kinds(restored.current()), ["X", "C"]);
    assert_eq!(restored.steps().len(), 1);
    assert_eq!(kinds(&restored.to_content(None).end_state), ["X", "C"]);
  }
}
