//! SessionLifecycleController: the externally facing interview orchestrator.
//!
//! Flow:
//!   create   → validate count → QuestionGenerator → SessionStore::create
//!   submit   → SessionStore::mutate(apply_answer)
//!   report   → AnswerEvaluator → SessionStore::mutate(apply_evaluation)
//!
//! Every accepted transition is queued on the persistence side channel after
//! the session lock is released. Both async operations commit only after
//! their external call returns, so dropping their futures (timeout, client
//! disconnect) leaves the store unchanged.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::interview::answer_evaluator::AnswerEvaluator;
use crate::interview::error::SessionError;
use crate::interview::models::{
    QuestionSlot, Report, Session, SessionId, SessionView, SubmissionResult,
};
use crate::interview::persistence::{
    AnswerRecord, PersistenceEvent, PersistenceHandle, SessionSnapshot,
};
use crate::interview::question_generator::QuestionGenerator;
use crate::interview::store::SessionStore;
use crate::interview::{report, sequencer, submission};

pub const MIN_QUESTIONS: usize = 3;
pub const MAX_QUESTIONS: usize = 20;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionRequest {
    pub resume_text: String,
    pub question_count: usize,
    pub resume_id: Option<Uuid>,
}

pub struct SessionLifecycleController {
    store: SessionStore,
    generator: Arc<dyn QuestionGenerator>,
    evaluator: Arc<dyn AnswerEvaluator>,
    persistence: PersistenceHandle,
}

impl SessionLifecycleController {
    pub fn new(
        generator: Arc<dyn QuestionGenerator>,
        evaluator: Arc<dyn AnswerEvaluator>,
        persistence: PersistenceHandle,
    ) -> Self {
        Self {
            store: SessionStore::new(),
            generator,
            evaluator,
            persistence,
        }
    }

    /// Generates questions and registers a new CREATED session.
    /// Nothing is stored if generation fails or is cancelled.
    pub async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<SessionView, SessionError> {
        validate_question_count(request.question_count)?;

        let session_id = SessionId::generate();
        info!(
            "Creating interview session {}: {} questions, resume_id={:?}",
            session_id, request.question_count, request.resume_id
        );

        let questions = self
            .generator
            .generate(&request.resume_text, request.question_count)
            .await
            .map_err(|e| SessionError::QuestionGeneration(e.to_string()))?;

        if questions.len() != request.question_count {
            return Err(SessionError::QuestionGeneration(format!(
                "requested {} questions, generator returned {}",
                request.question_count,
                questions.len()
            )));
        }

        let session = Session::new(
            session_id,
            request.resume_text,
            request.resume_id,
            questions,
        );
        let view = SessionView::from(&session);
        let snapshot = SessionSnapshot::from(&session);

        self.store.create(session)?;
        self.persistence
            .record(PersistenceEvent::SessionCreated(Box::new(snapshot)));

        Ok(view)
    }

    pub fn get_session(&self, session_id: &SessionId) -> Result<SessionView, SessionError> {
        let session = self.store.get(session_id)?;
        Ok(SessionView::from(&session))
    }

    /// The next unanswered question, or `None` once all are answered. Read-only.
    pub fn current_question(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<QuestionSlot>, SessionError> {
        self.store
            .read(session_id, |session| sequencer::current_slot(session).cloned())
    }

    pub fn submit_answer(
        &self,
        session_id: &SessionId,
        question_index: i64,
        answer: &str,
    ) -> Result<SubmissionResult, SessionError> {
        let applied = submission::submit(&self.store, session_id, question_index, answer)?;

        info!(
            "Session {} answered question {}, {} of {} done",
            session_id,
            question_index,
            applied.result.current_index,
            applied.result.total_questions
        );

        self.persistence
            .record(PersistenceEvent::AnswerRecorded(AnswerRecord {
                session_id: session_id.clone(),
                question_index: applied.answered.ordinal,
                question: applied.answered.question,
                category: applied.answered.category,
                user_answer: applied.answered.user_answer.unwrap_or_default(),
                current_question_index: applied.result.current_index,
                status: applied.result.status,
            }));

        Ok(applied.result)
    }

    /// Scores a COMPLETED session and moves it to EVALUATED.
    pub async fn generate_report(&self, session_id: &SessionId) -> Result<Report, SessionError> {
        let report = match report::synthesize(&self.store, self.evaluator.as_ref(), session_id)
            .await
        {
            Ok(report) => report,
            Err(e) => {
                if e.is_retryable() {
                    warn!("Report for session {session_id} failed and can be retried: {e}");
                }
                return Err(e);
            }
        };

        self.persistence.record(PersistenceEvent::ReportGenerated {
            session_id: session_id.clone(),
            report: Box::new(report.clone()),
        });

        Ok(report)
    }

    /// The report attached by a previous `generate_report`.
    pub fn get_report(&self, session_id: &SessionId) -> Result<Report, SessionError> {
        self.store
            .read(session_id, |session| session.report().cloned())?
            .ok_or_else(|| SessionError::ReportNotReady(session_id.clone()))
    }
}

fn validate_question_count(requested: usize) -> Result<(), SessionError> {
    if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&requested) {
        return Err(SessionError::InvalidQuestionCount {
            requested,
            min: MIN_QUESTIONS,
            max: MAX_QUESTIONS,
        });
    }
    Ok(())
}
