//! Random question generation.
//!
//! Flow:
//! 1) Start from a copy of the base question's start state.
//! 2) At every step collect all (rule, index) pairs that match the current sequence.
//! 3) Pick one uniformly and splice it in. Stop after `max_steps` or when nothing matches.
//! 4) The reached sequence becomes the new target; the walk itself is not recorded,
//!    so memory stays proportional to the sequence.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::content::CfgContent;
use crate::domain::{Rule, Token};
use crate::engine::{match_positions, splice};

#[derive(Clone, Debug)]
pub struct Generated {
  pub content: CfgContent,
  /// Steps actually taken by the walk (may be fewer than requested).
  pub walked: usize,
}

pub fn generate<R: Rng + ?Sized>(rules: &[Rule], start: &[Token], max_steps: usize, rng: &mut R) -> Generated {
  let mut seq = start.to_vec();
  let mut walked = 0;

  for _ in 0..max_steps {
    let candidates: Vec<(&Rule, usize)> = rules
      .iter()
      .flat_map(|r| match_positions(&seq, &r.before).into_iter().map(move |i| (r, i)))
      .collect();

    let Some(&(rule, index)) = candidates.choose(rng) else {
      debug!(target: "rewrite_lab", walked, "Generator stopped: no rule matches");
      break;
    };
    splice(&mut seq, index, rule.before.len(), &rule.after);
    walked += 1;
  }

  let content = CfgContent {
    rules: rules.to_vec(),
    start_state: start.to_vec(),
    end_state: seq,
    steps: Vec::new(),
  };
  Generated { content, walked }
}
