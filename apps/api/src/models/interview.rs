use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewSessionRow {
    pub session_id: String,
    pub resume_id: Option<Uuid>,
    pub total_questions: i32,
    pub current_question_index: i32,
    pub status: String,
    /// Question slots as written at creation time.
    pub questions: Value,
    pub overall_score: Option<f64>,
    pub overall_feedback: Option<String>,
    pub strengths: Option<Value>,
    pub improvements: Option<Value>,
    pub reference_answers: Option<Value>,
    pub category_scores: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewAnswerRow {
    pub id: i64,
    pub session_id: String,
    pub question_index: i32,
    pub question: String,
    pub category: String,
    pub user_answer: String,
    pub score: Option<i16>,
    pub feedback: Option<String>,
    pub answered_at: DateTime<Utc>,
}
