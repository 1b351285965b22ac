//! Application state: in-memory question bank and live rewrite sessions.
//!
//! This module owns:
//!   - the question store (by id), filled from the TOML bank and built-in seeds
//!   - the session store (by id); each session owns one `Derivation`
//!   - generator settings
//!
//! Storage is in-memory only. Saving a create session overwrites the question
//! content; concurrent saves are not reconciled (last save wins).

use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{load_bank_from_env, BankConfig, GeneratorCfg, QuestionCfg};
use crate::content::{parse_content_or_default, CfgContent};
use crate::domain::{Question, QuestionSource, SessionMode, Token};
use crate::engine::{Derivation, EngineError};
use crate::error::AppError;
use crate::notation::{parse_rule, parse_sequence, NotationError};
use crate::seeds::seed_questions;

/// One editing or solving run over a question.
#[derive(Clone, Debug)]
pub struct Session {
    pub id: String,
    pub question_id: String,
    pub mode: SessionMode,
    pub derivation: Derivation,
    /// Sequence a solver must reach. Empty for create sessions (their current sequence is the target).
    pub target: Vec<Token>,
    /// Step positions skipped by the most recent replay.
    pub skipped: Vec<usize>,
}

impl Session {
    pub fn require(&self, op: &'static str, mode: SessionMode) -> Result<(), AppError> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(AppError::WrongMode { op, mode: self.mode })
        }
    }

    /// A solve session counts as solved once at least one step has been taken
    /// and the current sequence equals the target.
    pub fn solved(&self) -> bool {
        self.mode == SessionMode::Solve && self.derivation.can_undo() && self.derivation.is_solved(&self.target)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub questions: Arc<RwLock<HashMap<String, Question>>>,
    pub sessions: Arc<RwLock<HashMap<String, Session>>>,
    pub generator: GeneratorCfg,
}

/// Turn a bank entry into a question. Notation errors and repeated rule ids reject the entry.
fn question_from_cfg(qc: &QuestionCfg) -> Result<Question, AppError> {
    let id = qc.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
    let content = match &qc.content_json {
        Some(raw) => parse_content_or_default(raw),
        None => CfgContent {
            rules: qc
                .rules
                .iter()
                .map(|r| parse_rule(r.id.clone(), &r.rule))
                .collect::<Result<Vec<_>, NotationError>>()?,
            start_state: parse_sequence(qc.start.as_deref().unwrap_or_default()),
            end_state: parse_sequence(qc.target.as_deref().unwrap_or_default()),
            steps: Vec::new(),
        },
    };
    if let Some(dup) = content.duplicate_rule_id() {
        return Err(EngineError::DuplicateRule(dup.to_string()).into());
    }
    Ok(Question {
        title: qc.title.clone().unwrap_or_else(|| id.clone()),
        id,
        difficulty: qc.difficulty.clone(),
        source: QuestionSource::LocalBank,
        content,
    })
}

impl AppState {
    /// Build state from env: load the bank, add seeds, build the index.
    pub fn new() -> Self {
        Self::from_bank(load_bank_from_env())
    }

    #[instrument(level = "info", skip_all)]
    pub fn from_bank(cfg: Option<BankConfig>) -> Self {
        let mut by_id = HashMap::<String, Question>::new();

        if let Some(cfg) = &cfg {
            for qc in &cfg.questions {
                match question_from_cfg(qc) {
                    Ok(q) => {
                        by_id.insert(q.id.clone(), q);
                    }
                    Err(e) => {
                        error!(target: "rewrite_lab", id = ?qc.id, difficulty = %qc.difficulty, error = %e, "Skipping bank item");
                    }
                }
            }
        }

        // Always insert built-in seeds, but don't overwrite bank ids.
        for q in seed_questions() {
            by_id.entry(q.id.clone()).or_insert(q);
        }

        // Inventory summary by difficulty/source.
        let mut count_by_diff: HashMap<String, (usize, usize)> = HashMap::new();
        for q in by_id.values() {
            let entry = count_by_diff.entry(q.difficulty.clone()).or_insert((0, 0));
            match q.source {
                QuestionSource::LocalBank => entry.0 += 1,
                _ => entry.1 += 1,
            }
        }
        for (diff, (bank, seed)) in count_by_diff {
            info!(target: "rewrite_lab", %diff, local_bank = bank, seed = seed, "Startup question inventory");
        }

        Self {
            questions: Arc::new(RwLock::new(by_id)),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            generator: cfg.map(|c| c.generator).unwrap_or_default(),
        }
    }

    #[instrument(level = "debug", skip(self, q), fields(id = %q.id))]
    pub async fn insert_question(&self, q: Question) {
        self.questions.write().await.insert(q.id.clone(), q);
    }

    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_question(&self, id: &str) -> Result<Question, AppError> {
        self.questions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::QuestionNotFound(id.to_string()))
    }

    /// All questions, ordered by difficulty then id.
    pub async fn list_questions(&self) -> Vec<Question> {
        let mut all: Vec<Question> = self.questions.read().await.values().cloned().collect();
        all.sort_by(|a, b| (&a.difficulty, &a.id).cmp(&(&b.difficulty, &b.id)));
        all
    }

    /// Store a new authored question. Malformed content becomes empty content.
    #[instrument(level = "info", skip(self, content_raw), fields(%difficulty))]
    pub async fn create_question(&self, title: &str, difficulty: &str, content_raw: Option<&str>) -> Question {
        let q = Question {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            difficulty: difficulty.to_string(),
            source: QuestionSource::Created,
            content: content_raw.map(parse_content_or_default).unwrap_or_default(),
        };
        self.insert_question(q.clone()).await;
        info!(target: "rewrite_lab", id = %q.id, rules = q.content.rules.len(), "Question created");
        q
    }

    /// Open a session. Solve sessions start from the start state with no history;
    /// create sessions restore and replay the saved steps.
    #[instrument(level = "info", skip(self), fields(%question_id, ?mode))]
    pub async fn open_session(&self, question_id: &str, mode: SessionMode) -> Result<Session, AppError> {
        let q = self.get_question(question_id).await?;
        let (derivation, target, skipped) = match mode {
            SessionMode::Solve => {
                let target = q.content.end_state.clone();
                let d = Derivation::new(q.content.start_state, q.content.rules);
                (d, target, Vec::new())
            }
            SessionMode::Create => {
                let (d, replay) = Derivation::from_content(q.content);
                let skipped = replay.skipped;
                if !skipped.is_empty() {
                    warn!(target: "session", %question_id, skipped = skipped.len(), "Saved steps reference missing rules");
                }
                (d, Vec::new(), skipped)
            }
        };
        let session = Session {
            id: Uuid::new_v4().to_string(),
            question_id: question_id.to_string(),
            mode,
            derivation,
            target,
            skipped,
        };
        self.sessions.write().await.insert(session.id.clone(), session.clone());
        info!(target: "session", id = %session.id, %question_id, ?mode, "Session opened");
        Ok(session)
    }

    pub async fn get_session(&self, id: &str) -> Result<Session, AppError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))
    }

    /// Run `f` against a session under the store's write lock, so one session's
    /// operations never interleave.
    pub async fn with_session<T, F>(&self, id: &str, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Session) -> Result<T, AppError>,
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;
        f(session)
    }

    #[instrument(level = "info", skip(self), fields(%id))]
    pub async fn close_session(&self, id: &str) -> Result<(), AppError> {
        if self.sessions.write().await.remove(id).is_none() {
            return Err(AppError::SessionNotFound(id.to_string()));
        }
        info!(target: "session", %id, "Session closed");
        Ok(())
    }

    /// Write a create session's rules, start state, reached sequence and steps back into its question.
    #[instrument(level = "info", skip(self), fields(%id))]
    pub async fn save_session(&self, id: &str) -> Result<Question, AppError> {
        let (question_id, content) = self
            .with_session(id, |s| {
                s.require("save", SessionMode::Create)?;
                Ok((s.question_id.clone(), s.derivation.to_content(None)))
            })
            .await?;

        let mut questions = self.questions.write().await;
        let q = questions
            .get_mut(&question_id)
            .ok_or_else(|| AppError::QuestionNotFound(question_id.clone()))?;
        q.content = content;
        info!(target: "session", %id, %question_id, steps = q.content.steps.len(), "Draft saved");
        Ok(q.clone())
    }

    /// New question whose target is a random walk over a base question's rules.
    /// Requested walks longer than `max_steps_limit` are rejected; the walk runs off the async workers.
    #[instrument(level = "info", skip(self), fields(%base_id))]
    pub async fn generate_question(&self, base_id: &str, max_steps: Option<usize>) -> Result<Question, AppError> {
        let base = self.get_question(base_id).await?;
        let steps = max_steps.unwrap_or(self.generator.max_steps);
        let limit = self.generator.max_steps_limit;
        if steps > limit {
            warn!(target: "rewrite_lab", %base_id, requested = steps, limit, "Generator walk too long");
            return Err(AppError::StepLimit { requested: steps, limit });
        }

        let rules = base.content.rules.clone();
        let start = base.content.start_state.clone();
        let generated = tokio::task::spawn_blocking(move || {
            let mut rng = rand::thread_rng();
            crate::generator::generate(&rules, &start, steps, &mut rng)
        })
        .await
        .map_err(|e| AppError::TaskFailed(e.to_string()))?;

        let q = Question {
            id: Uuid::new_v4().to_string(),
            title: format!("{} (generated)", base.title),
            difficulty: base.difficulty.clone(),
            source: QuestionSource::Generated,
            content: generated.content,
        };
        self.insert_question(q.clone()).await;
        info!(target: "rewrite_lab", %base_id, id = %q.id, walked = generated.walked, "Generated question");
        Ok(q)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_bank(None)
    }
}
