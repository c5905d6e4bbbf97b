//! Durable side channel for interview sessions.
//!
//! The in-memory `SessionStore` is authoritative. Every accepted transition
//! is also queued here as a `PersistenceEvent` and written by one background
//! task, in submission order, so an answer row never races ahead of its
//! session row. Callers only ever enqueue; write failures are logged and
//! dropped.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::interview::models::{QuestionSlot, Report, Session, SessionId, SessionStatus};
use crate::models::interview::{InterviewAnswerRow, InterviewSessionRow};

/// Serializable copy of a session written at creation time.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub resume_id: Option<Uuid>,
    pub status: SessionStatus,
    pub current_question_index: usize,
    pub total_questions: usize,
    pub questions: Vec<QuestionSlot>,
    pub created_at: DateTime<Utc>,
}

impl From<&Session> for SessionSnapshot {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id().clone(),
            resume_id: session.resume_id(),
            status: session.status(),
            current_question_index: session.cursor(),
            total_questions: session.question_count(),
            questions: session.slots().to_vec(),
            created_at: session.created_at(),
        }
    }
}

/// One accepted answer plus the session position it moved to.
#[derive(Debug, Clone)]
pub struct AnswerRecord {
    pub session_id: SessionId,
    pub question_index: usize,
    pub question: String,
    pub category: String,
    pub user_answer: String,
    pub current_question_index: usize,
    pub status: SessionStatus,
}

#[async_trait]
pub trait SessionPersistence: Send + Sync {
    async fn save_session(&self, snapshot: &SessionSnapshot) -> Result<()>;
    async fn append_answer(&self, record: &AnswerRecord) -> Result<()>;
    async fn save_report(&self, session_id: &SessionId, report: &Report) -> Result<()>;
}

#[derive(Debug)]
pub enum PersistenceEvent {
    SessionCreated(Box<SessionSnapshot>),
    AnswerRecorded(AnswerRecord),
    ReportGenerated {
        session_id: SessionId,
        report: Box<Report>,
    },
}

impl PersistenceEvent {
    fn session_id(&self) -> &SessionId {
        match self {
            PersistenceEvent::SessionCreated(snapshot) => &snapshot.session_id,
            PersistenceEvent::AnswerRecorded(record) => &record.session_id,
            PersistenceEvent::ReportGenerated { session_id, .. } => session_id,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            PersistenceEvent::SessionCreated(_) => "session",
            PersistenceEvent::AnswerRecorded(_) => "answer",
            PersistenceEvent::ReportGenerated { .. } => "report",
        }
    }

    async fn write(&self, sink: &dyn SessionPersistence) -> Result<()> {
        match self {
            PersistenceEvent::SessionCreated(snapshot) => sink.save_session(snapshot).await,
            PersistenceEvent::AnswerRecorded(record) => sink.append_answer(record).await,
            PersistenceEvent::ReportGenerated { session_id, report } => {
                sink.save_report(session_id, report).await
            }
        }
    }
}

/// Non-blocking sender for persistence events.
#[derive(Clone)]
pub struct PersistenceHandle {
    tx: mpsc::UnboundedSender<PersistenceEvent>,
}

impl PersistenceHandle {
    /// Spawns the writer task. It stops once every handle has been dropped
    /// and the queue is drained.
    pub fn spawn(sink: Arc<dyn SessionPersistence>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(writer_task(sink, rx));
        (Self { tx }, writer)
    }

    /// Queues an event. Never blocks and never fails the caller.
    pub fn record(&self, event: PersistenceEvent) {
        if let Err(e) = self.tx.send(event) {
            error!(
                "Persistence writer is gone, dropping {} event for session {}",
                e.0.kind(),
                e.0.session_id()
            );
        }
    }
}

async fn writer_task(
    sink: Arc<dyn SessionPersistence>,
    mut rx: mpsc::UnboundedReceiver<PersistenceEvent>,
) {
    debug!("Interview persistence writer started");

    while let Some(event) = rx.recv().await {
        if let Err(e) = event.write(sink.as_ref()).await {
            warn!(
                "Failed to persist {} for session {}: {e:#}",
                event.kind(),
                event.session_id()
            );
        }
    }

    debug!("Interview persistence writer stopped");
}

/// Sink used when durable persistence is switched off.
pub struct NoopPersistence;

#[async_trait]
impl SessionPersistence for NoopPersistence {
    async fn save_session(&self, _snapshot: &SessionSnapshot) -> Result<()> {
        Ok(())
    }

    async fn append_answer(&self, _record: &AnswerRecord) -> Result<()> {
        Ok(())
    }

    async fn save_report(&self, _session_id: &SessionId, _report: &Report) -> Result<()> {
        Ok(())
    }
}

/// PostgreSQL sink. Tables are created by `db::ensure_schema`.
pub struct PgSessionPersistence {
    pool: PgPool,
}

impl PgSessionPersistence {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionPersistence for PgSessionPersistence {
    async fn save_session(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let questions = serde_json::to_value(&snapshot.questions)?;

        sqlx::query(
            r#"
            INSERT INTO interview_sessions
                (session_id, resume_id, total_questions, current_question_index,
                 status, questions, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (session_id) DO UPDATE
            SET current_question_index = EXCLUDED.current_question_index,
                status = EXCLUDED.status,
                questions = EXCLUDED.questions
            "#,
        )
        .bind(snapshot.session_id.as_str())
        .bind(snapshot.resume_id)
        .bind(pg_int(snapshot.total_questions))
        .bind(pg_int(snapshot.current_question_index))
        .bind(snapshot.status.as_str())
        .bind(&questions)
        .bind(snapshot.created_at)
        .execute(&self.pool)
        .await
        .context("insert interview_sessions")?;

        info!(
            "Interview session saved: session_id={}, resume_id={:?}",
            snapshot.session_id, snapshot.resume_id
        );
        Ok(())
    }

    async fn append_answer(&self, record: &AnswerRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO interview_answers
                (session_id, question_index, question, category, user_answer)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (session_id, question_index) DO NOTHING
            "#,
        )
        .bind(record.session_id.as_str())
        .bind(pg_int(record.question_index))
        .bind(&record.question)
        .bind(&record.category)
        .bind(&record.user_answer)
        .execute(&mut *tx)
        .await
        .context("insert interview_answers")?;

        sqlx::query(
            r#"
            UPDATE interview_sessions
            SET current_question_index = $2,
                status = $3,
                completed_at = CASE WHEN $3 = 'COMPLETED' THEN now() ELSE completed_at END
            WHERE session_id = $1
            "#,
        )
        .bind(record.session_id.as_str())
        .bind(pg_int(record.current_question_index))
        .bind(record.status.as_str())
        .execute(&mut *tx)
        .await
        .context("update interview_sessions cursor")?;

        tx.commit().await?;

        debug!(
            "Interview answer saved: session_id={}, question_index={}",
            record.session_id, record.question_index
        );
        Ok(())
    }

    async fn save_report(&self, session_id: &SessionId, report: &Report) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE interview_sessions
            SET overall_score = $2,
                overall_feedback = $3,
                strengths = $4,
                improvements = $5,
                reference_answers = $6,
                category_scores = $7,
                status = 'EVALUATED',
                completed_at = COALESCE(completed_at, now())
            WHERE session_id = $1
            "#,
        )
        .bind(session_id.as_str())
        .bind(report.overall_score)
        .bind(&report.overall_feedback)
        .bind(serde_json::to_value(&report.strengths)?)
        .bind(serde_json::to_value(&report.improvements)?)
        .bind(serde_json::to_value(&report.reference_answers)?)
        .bind(serde_json::to_value(&report.category_scores)?)
        .execute(&mut *tx)
        .await
        .context("update interview_sessions report")?;

        for detail in &report.question_details {
            sqlx::query(
                r#"
                UPDATE interview_answers
                SET score = $3, feedback = $4
                WHERE session_id = $1 AND question_index = $2
                "#,
            )
            .bind(session_id.as_str())
            .bind(pg_int(detail.question_index))
            .bind(i16::from(detail.score))
            .bind(&detail.feedback)
            .execute(&mut *tx)
            .await
            .context("update interview_answers score")?;
        }

        tx.commit().await?;

        info!(
            "Interview report saved: session_id={}, score={:.1}",
            session_id, report.overall_score
        );
        Ok(())
    }
}

/// A persisted interview with its answers, newest first in listings.
#[derive(Debug, Serialize)]
pub struct InterviewHistoryEntry {
    #[serde(flatten)]
    pub session: InterviewSessionRow,
    pub answers: Vec<InterviewAnswerRow>,
}

const SESSION_COLUMNS: &str = "session_id, resume_id, total_questions, current_question_index, \
     status, questions, overall_score, overall_feedback, strengths, improvements, \
     reference_answers, category_scores, created_at, completed_at";

/// Interview history for one résumé, read from the durable copy.
pub async fn list_sessions_for_resume(
    pool: &PgPool,
    resume_id: Uuid,
) -> Result<Vec<InterviewHistoryEntry>> {
    let sessions = sqlx::query_as::<_, InterviewSessionRow>(&format!(
        "SELECT {SESSION_COLUMNS} FROM interview_sessions \
         WHERE resume_id = $1 ORDER BY created_at DESC"
    ))
    .bind(resume_id)
    .fetch_all(pool)
    .await?;

    with_answers(pool, sessions).await
}

/// One persisted interview with its answers, or `None` if it was never saved.
pub async fn find_session_history(
    pool: &PgPool,
    session_id: &SessionId,
) -> Result<Option<InterviewHistoryEntry>> {
    let session = sqlx::query_as::<_, InterviewSessionRow>(&format!(
        "SELECT {SESSION_COLUMNS} FROM interview_sessions WHERE session_id = $1"
    ))
    .bind(session_id.as_str())
    .fetch_optional(pool)
    .await?;

    let Some(session) = session else {
        return Ok(None);
    };
    Ok(with_answers(pool, vec![session]).await?.into_iter().next())
}

async fn with_answers(
    pool: &PgPool,
    sessions: Vec<InterviewSessionRow>,
) -> Result<Vec<InterviewHistoryEntry>> {
    let ids: Vec<String> = sessions.iter().map(|s| s.session_id.clone()).collect();
    let answers = sqlx::query_as::<_, InterviewAnswerRow>(
        r#"
        SELECT id, session_id, question_index, question, category, user_answer,
               score, feedback, answered_at
        FROM interview_answers
        WHERE session_id = ANY($1)
        ORDER BY session_id, question_index
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    Ok(group_history(sessions, answers))
}

fn group_history(
    sessions: Vec<InterviewSessionRow>,
    answers: Vec<InterviewAnswerRow>,
) -> Vec<InterviewHistoryEntry> {
    let mut by_session: HashMap<String, Vec<InterviewAnswerRow>> = HashMap::new();
    for answer in answers {
        by_session
            .entry(answer.session_id.clone())
            .or_default()
            .push(answer);
    }

    sessions
        .into_iter()
        .map(|session| {
            let answers = by_session.remove(&session.session_id).unwrap_or_default();
            InterviewHistoryEntry { session, answers }
        })
        .collect()
}

fn pg_int(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
