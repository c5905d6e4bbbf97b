use thiserror::Error;

use crate::interview::models::{SessionId, SessionStatus};

/// Every way an interview engine operation can be rejected.
///
/// Validation and not-found errors are local and never worth retrying.
/// `QuestionGeneration` and `Evaluation` come from external capabilities and
/// leave session state untouched, so the caller may retry them.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session {0} already exists")]
    DuplicateSession(SessionId),

    #[error("Session {0} not found")]
    NotFound(SessionId),

    #[error("Question count must be between {min} and {max}, got {requested}")]
    InvalidQuestionCount {
        requested: usize,
        min: usize,
        max: usize,
    },

    #[error("Question index {index} is out of range for a {total}-question interview")]
    InvalidQuestionIndex { index: i64, total: usize },

    #[error("Expected an answer for question {expected}, got question {submitted}")]
    QuestionIndexMismatch { expected: usize, submitted: usize },

    #[error("Session {id} is {status} and no longer accepts answers")]
    SessionTerminal { id: SessionId, status: SessionStatus },

    #[error("Session {0} has no unanswered questions left")]
    AlreadyCompleted(SessionId),

    #[error("Session {id} is {status}; a report requires a completed, unevaluated interview")]
    NotComplete { id: SessionId, status: SessionStatus },

    #[error("No report has been generated for session {0}")]
    ReportNotReady(SessionId),

    #[error("Question generation failed: {0}")]
    QuestionGeneration(String),

    #[error("Answer evaluation failed: {0}")]
    Evaluation(String),
}

impl SessionError {
    /// True for failures of external capabilities, which never mutate state.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessionError::QuestionGeneration(_) | SessionError::Evaluation(_)
        )
    }
}
