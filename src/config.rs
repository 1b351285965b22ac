//! Loading the question bank (and generator settings) from TOML.
//!
//! Example:
//! ```toml
//! [generator]
//! max_steps = 6
//! max_steps_limit = 64
//!
//! [[questions]]
//! id = "anbn"
//! title = "Balanced a/b"
//! difficulty = "easy"
//! start = "S"
//! target = "a a b b"
//! rules = [
//!   { id = "grow", rule = "S -> a S b" },
//!   { id = "stop", rule = "S -> ε" },
//! ]
//! ```
//!
//! A question may instead carry `content_json`: a raw content blob in the wire format.

use serde::Deserialize;
use tracing::{error, info};

pub const DEFAULT_MAX_STEPS: usize = 6;
/// Upper bound on a client-requested walk length.
pub const DEFAULT_MAX_STEPS_LIMIT: usize = 64;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct BankConfig {
  #[serde(default)]
  pub generator: GeneratorCfg,
  #[serde(default)]
  pub questions: Vec<QuestionCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GeneratorCfg {
  #[serde(default = "default_max_steps")]
  pub max_steps: usize,
  #[serde(default = "default_max_steps_limit")]
  pub max_steps_limit: usize,
}

impl Default for GeneratorCfg {
  fn default() -> Self {
    Self { max_steps: DEFAULT_MAX_STEPS, max_steps_limit: DEFAULT_MAX_STEPS_LIMIT }
  }
}

fn default_max_steps() -> usize { DEFAULT_MAX_STEPS }
fn default_max_steps_limit() -> usize { DEFAULT_MAX_STEPS_LIMIT }

/// Question entry accepted in TOML configuration.
/// Either the notation fields (`start`, `target`, `rules`) or `content_json` should be filled.
#[derive(Clone, Debug, Deserialize)]
pub struct QuestionCfg {
  #[serde(default)] pub id: Option<String>,
  #[serde(default)] pub title: Option<String>,
  pub difficulty: String,
  // notation form
  #[serde(default)] pub start: Option<String>,
  #[serde(default)] pub target: Option<String>,
  #[serde(default)] pub rules: Vec<RuleCfg>,
  // raw form
  #[serde(default)] pub content_json: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RuleCfg {
  pub id: String,
  pub rule: String,
}

pub fn parse_bank(text: &str) -> Result<BankConfig, toml::de::Error> {
  toml::from_str::<BankConfig>(text)
}

/// Attempt to load `BankConfig` from QUESTION_BANK_PATH. On any parsing/IO error, returns None.
pub fn load_bank_from_env() -> Option<BankConfig> {
  let path = std::env::var("QUESTION_BANK_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_bank(&s) {
      Ok(cfg) => {
        info!(target: "rewrite_lab", %path, questions = cfg.questions.len(), "Loaded question bank (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "rewrite_lab", %path, error = %e, "Failed to parse TOML question bank");
        None
      }
    },
    Err(e) => {
      error!(target: "rewrite_lab", %path, error = %e, "Failed to read TOML question bank");
      None
    }
  }
}
