//! Seed data: built-in questions that keep the app useful without a bank file.

use crate::content::CfgContent;
use crate::domain::{Question, QuestionSource, Rule};
use crate::notation::{parse_rule, parse_sequence};

fn rules(pairs: &[(&str, &str)]) -> Vec<Rule> {
  pairs
    .iter()
    .filter_map(|(id, text)| parse_rule(*id, text).ok())
    .collect()
}

fn seed(id: &str, title: &str, difficulty: &str, start: &str, target: &str, rule_text: &[(&str, &str)]) -> Question {
  Question {
    id: id.into(),
    title: title.into(),
    difficulty: difficulty.into(),
    source: QuestionSource::Seed,
    content: CfgContent {
      rules: rules(rule_text),
      start_state: parse_sequence(start),
      end_state: parse_sequence(target),
      steps: Vec::new(),
    },
  }
}

/// Minimal set of built-in questions.
pub fn seed_questions() -> Vec<Question> {
  vec![
    seed(
      "q-collapse",
      "Collapse the pair",
      "intro",
      "A B C",
      "X C",
      &[("R1", "A B -> X")],
    ),
    seed(
      "q-anbn",
      "Equal numbers of a and b",
      "easy",
      "S",
      "a a a b b b",
      &[("grow", "S -> a S b"), ("stop", "S -> ε")],
    ),
    seed(
      "q-parens",
      "Balanced parentheses",
      "medium",
      "S",
      "( ( ) ) ( )",
      &[("wrap", "S -> ( S )"), ("pair", "S -> S S"), ("stop", "S -> ε")],
    ),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::kinds;

  #[test]
  fn every_seed_rule_parses() {
    for q in seed_questions() {
      assert!(!q.content.rules.is_empty(), "{} has no rules", q.id);
      assert!(!q.content.start_state.is_empty());
    }
    let q = &seed_questions()[1];
    assert_eq!(kinds(&q.content.rules[0].after), ["a", "S", "b"]);
  }
}
