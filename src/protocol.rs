//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::content::CfgContent;
use crate::domain::{Question, QuestionSource, Rule, SessionMode, Step, Token};
use crate::notation::{render_rule, render_sequence};
use crate::state::Session;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    ListQuestions,
    GetQuestion {
        #[serde(rename = "questionId")]
        question_id: String,
    },
    GenerateQuestion {
        #[serde(rename = "baseQuestionId")]
        base_question_id: String,
        #[serde(default, rename = "maxSteps")]
        max_steps: Option<usize>,
    },
    OpenSession {
        #[serde(rename = "questionId")]
        question_id: String,
        mode: SessionMode,
    },
    ApplyRule {
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(rename = "ruleId")]
        rule_id: String,
        index: usize,
        #[serde(default)]
        count: Option<usize>,
    },
    Undo {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Redo {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Replay {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Matches {
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(rename = "ruleId")]
        rule_id: String,
    },
    Check {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    AddRule {
        #[serde(rename = "sessionId")]
        session_id: String,
        id: String,
        rule: String,
    },
    RemoveRule {
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(rename = "ruleId")]
        rule_id: String,
    },
    ResetStart {
        #[serde(rename = "sessionId")]
        session_id: String,
        start: String,
    },
    Save {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    CloseSession {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Questions {
        questions: Vec<QuestionSummary>,
    },
    Question {
        question: QuestionOut,
    },
    Session {
        session: SessionOut,
    },
    Matches(MatchesOut),
    Check(CheckOut),
    Closed {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Error {
        message: String,
    },
}

/// Question listing entry.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSummary {
    pub id: String,
    pub title: String,
    pub difficulty: String,
    pub source: QuestionSource,
    pub rule_count: usize,
}

pub fn to_summary(q: &Question) -> QuestionSummary {
    QuestionSummary {
        id: q.id.clone(),
        title: q.title.clone(),
        difficulty: q.difficulty.clone(),
        source: q.source,
        rule_count: q.content.rules.len(),
    }
}

/// Full question, with the content blob and a readable rendering of it.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOut {
    pub id: String,
    pub title: String,
    pub difficulty: String,
    pub source: QuestionSource,
    pub content: CfgContent,
    pub rules_text: Vec<String>,
    pub start_text: String,
    pub target_text: String,
}

pub fn to_question_out(q: &Question) -> QuestionOut {
    QuestionOut {
        id: q.id.clone(),
        title: q.title.clone(),
        difficulty: q.difficulty.clone(),
        source: q.source,
        content: q.content.clone(),
        rules_text: q.content.rules.iter().map(render_rule).collect(),
        start_text: render_sequence(&q.content.start_state),
        target_text: render_sequence(&q.content.end_state),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RuleOut {
    #[serde(flatten)]
    pub rule: Rule,
    pub text: String,
}

/// Snapshot of a session after any operation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOut {
    pub id: String,
    pub question_id: String,
    pub mode: SessionMode,
    pub current: Vec<Token>,
    pub current_text: String,
    pub target: Vec<Token>,
    pub rules: Vec<RuleOut>,
    pub steps: Vec<Step>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub solved: bool,
    pub skipped_steps: Vec<usize>,
}

pub fn to_session_out(s: &Session) -> SessionOut {
    let d = &s.derivation;
    SessionOut {
        id: s.id.clone(),
        question_id: s.question_id.clone(),
        mode: s.mode,
        current: d.current().to_vec(),
        current_text: render_sequence(d.current()),
        target: s.target.clone(),
        rules: d
            .rules()
            .iter()
            .map(|r| RuleOut { rule: r.clone(), text: render_rule(r) })
            .collect(),
        steps: d.steps().to_vec(),
        can_undo: d.can_undo(),
        can_redo: d.can_redo(),
        solved: s.solved(),
        skipped_steps: s.skipped.clone(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct CreateQuestionIn {
    pub title: String,
    pub difficulty: String,
    /// Raw content blob; malformed content is replaced with empty content.
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateIn {
    pub base_question_id: String,
    #[serde(default)]
    pub max_steps: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionIn {
    pub question_id: String,
    pub mode: SessionMode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyIn {
    pub rule_id: String,
    pub index: usize,
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchesQuery {
    pub rule_id: String,
}
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchesOut {
    pub rule_id: String,
    pub indices: Vec<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckOut {
    pub solved: bool,
    pub steps: usize,
}

#[derive(Debug, Deserialize)]
pub struct AddRuleIn {
    pub id: String,
    /// Rule in notation form, e.g. "S -> a S b".
    pub rule: String,
}

#[derive(Debug, Deserialize)]
pub struct StartIn {
    pub start: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorOut {
    pub error: String,
}
