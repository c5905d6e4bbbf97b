//! Session, slot and report types shared by every stage of the interview engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interview::question_generator::GeneratedQuestion;

/// Opaque session identifier. Generated once, stable for the session lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// CREATED → IN_PROGRESS → COMPLETED → EVALUATED. No transition goes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Created,
    InProgress,
    Completed,
    Evaluated,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Created => "CREATED",
            SessionStatus::InProgress => "IN_PROGRESS",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Evaluated => "EVALUATED",
        }
    }

    /// Whether answers may still be recorded in this status.
    pub fn accepts_answers(&self) -> bool {
        matches!(self, SessionStatus::Created | SessionStatus::InProgress)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One question of the interview plus its answer and evaluation state.
///
/// `user_answer` is written once by answer submission; `score` and `feedback`
/// are written once, together for all slots, by report synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSlot {
    #[serde(rename = "question_index")]
    pub ordinal: usize,
    pub question: String,
    pub category: String,
    pub user_answer: Option<String>,
    pub score: Option<u8>,
    pub feedback: Option<String>,
}

impl QuestionSlot {
    pub fn new(ordinal: usize, question: String, category: String) -> Self {
        Self {
            ordinal,
            question,
            category,
            user_answer: None,
            score: None,
            feedback: None,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.user_answer.is_some()
    }
}

/// A live interview session. Mutated only through the store's `mutate`.
#[derive(Debug, Clone)]
pub struct Session {
    pub(super) id: SessionId,
    pub(super) resume_id: Option<Uuid>,
    pub(super) resume_text: String,
    pub(super) slots: Vec<QuestionSlot>,
    pub(super) cursor: usize,
    pub(super) status: SessionStatus,
    pub(super) report: Option<Report>,
    pub(super) created_at: DateTime<Utc>,
}

impl Session {
    /// Builds a CREATED session whose slots mirror `questions` in order.
    pub fn new(
        id: SessionId,
        resume_text: String,
        resume_id: Option<Uuid>,
        questions: Vec<GeneratedQuestion>,
    ) -> Self {
        let slots = questions
            .into_iter()
            .enumerate()
            .map(|(ordinal, q)| QuestionSlot::new(ordinal, q.question, q.category))
            .collect();

        Self {
            id,
            resume_id,
            resume_text,
            slots,
            cursor: 0,
            status: SessionStatus::Created,
            report: None,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn resume_id(&self) -> Option<Uuid> {
        self.resume_id
    }

    pub fn resume_text(&self) -> &str {
        &self.resume_text
    }

    pub fn slots(&self) -> &[QuestionSlot] {
        &self.slots
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    pub fn question_count(&self) -> usize {
        self.slots.len()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Client-facing view of a session. Omits the résumé text and the report body.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub resume_id: Option<Uuid>,
    pub total_questions: usize,
    pub current_question_index: usize,
    pub status: SessionStatus,
    pub questions: Vec<QuestionSlot>,
    pub has_report: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id.clone(),
            resume_id: session.resume_id,
            total_questions: session.slots.len(),
            current_question_index: session.cursor,
            status: session.status,
            questions: session.slots.clone(),
            has_report: session.report.is_some(),
            created_at: session.created_at,
        }
    }
}

/// Returned after a successful answer submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResult {
    pub has_next_question: bool,
    pub next_question: Option<QuestionSlot>,
    pub current_index: usize,
    pub total_questions: usize,
    pub status: SessionStatus,
}

/// Mean score of all questions sharing one category tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub score: f64,
    pub question_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionEvaluation {
    pub question_index: usize,
    pub question: String,
    pub category: String,
    pub user_answer: String,
    pub score: u8,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceAnswer {
    pub question: String,
    pub reference_answer: String,
    #[serde(default)]
    pub key_points: Vec<String>,
}

/// Final evaluation of a completed interview. Immutable once attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub session_id: SessionId,
    pub total_questions: usize,
    pub overall_score: f64,
    pub category_scores: Vec<CategoryScore>,
    pub question_details: Vec<QuestionEvaluation>,
    pub overall_feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub reference_answers: Vec<ReferenceAnswer>,
    pub generated_at: DateTime<Utc>,
}
