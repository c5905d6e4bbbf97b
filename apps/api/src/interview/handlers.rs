//! Axum route handlers for the Interview API.

use std::future::Future;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::controller::CreateSessionRequest;
use crate::interview::error::SessionError;
use crate::interview::models::{QuestionSlot, Report, SessionId, SessionView, SubmissionResult};
use crate::interview::persistence::{
    find_session_history, list_sessions_for_resume, InterviewHistoryEntry,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    /// Signed so a negative index is rejected by the engine's range check.
    pub question_index: i64,
    pub answer: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interviews
///
/// Generates questions for the résumé and opens a new session.
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    if request.resume_text.trim().is_empty() {
        return Err(AppError::Validation(
            "resume_text cannot be empty".to_string(),
        ));
    }

    let view = with_llm_timeout(&state, state.interviews.create_session(request)).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let view = state.interviews.get_session(&SessionId::from(session_id))?;
    Ok(Json(view))
}

/// GET /api/v1/interviews/:id/question
///
/// Returns the next unanswered question, or 204 once every question is answered.
pub async fn handle_current_question(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Result<Json<QuestionSlot>, StatusCode>, AppError> {
    let question = state
        .interviews
        .current_question(&SessionId::from(session_id))?;
    Ok(question.map(Json).ok_or(StatusCode::NO_CONTENT))
}

/// POST /api/v1/interviews/:id/answers
///
/// Answers must arrive in question order; anything else is a 409.
/// Blank answers are accepted and left to the evaluator to score.
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SubmitAnswerRequest>,
) -> Result<Json<SubmissionResult>, AppError> {
    let result = state.interviews.submit_answer(
        &SessionId::from(session_id),
        request.question_index,
        &request.answer,
    )?;
    Ok(Json(result))
}

/// POST /api/v1/interviews/:id/report
///
/// Scores a completed interview. Allowed once per session.
pub async fn handle_generate_report(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Report>, AppError> {
    let session_id = SessionId::from(session_id);
    let report = with_llm_timeout(&state, state.interviews.generate_report(&session_id)).await?;
    Ok(Json(report))
}

/// GET /api/v1/interviews/:id/report
pub async fn handle_get_report(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Report>, AppError> {
    let report = state.interviews.get_report(&SessionId::from(session_id))?;
    Ok(Json(report))
}

/// GET /api/v1/resumes/:id/interviews
///
/// Interview history for a résumé, read from the durable store.
pub async fn handle_resume_interviews(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<Vec<InterviewHistoryEntry>>, AppError> {
    let history = list_sessions_for_resume(&state.db, resume_id).await?;
    Ok(Json(history))
}

/// GET /api/v1/interviews/:id/history
///
/// One interview as persisted, with its answers and report fields.
/// Served from Postgres, so it outlives the in-memory session.
pub async fn handle_session_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<InterviewHistoryEntry>, AppError> {
    let session_id = SessionId::from(session_id);
    let entry = find_session_history(&state.db, &session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No saved interview {session_id}")))?;
    Ok(Json(entry))
}

/// Bounds an external-capability call by the configured LLM timeout.
/// The engine commits nothing until the call returns, so giving up is safe.
async fn with_llm_timeout<T>(
    state: &AppState,
    operation: impl Future<Output = Result<T, SessionError>>,
) -> Result<T, AppError> {
    let limit = state.config.llm_timeout();
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => Err(AppError::Timeout(format!(
            "AI call did not finish within {}s",
            limit.as_secs()
        ))),
    }
}
