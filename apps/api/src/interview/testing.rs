//! Deterministic test doubles for the interview engine.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::interview::answer_evaluator::{
    AnswerEvaluator, AnsweredQuestion, EvaluationError, EvaluationOutcome, QuestionScore,
};
use crate::interview::models::{Report, Session, SessionId};
use crate::interview::persistence::{AnswerRecord, SessionPersistence, SessionSnapshot};
use crate::interview::question_generator::{GeneratedQuestion, GenerationError, QuestionGenerator};
use crate::interview::sequencer;
use crate::interview::submission::apply_answer;

const CATEGORIES: [&str; 3] = ["project_experience", "fundamentals", "system_design"];

pub fn generated_questions(count: usize) -> Vec<GeneratedQuestion> {
    (0..count)
        .map(|i| GeneratedQuestion {
            question: format!("Question {i}"),
            category: CATEGORIES[i % CATEGORIES.len()].to_string(),
        })
        .collect()
}

pub fn sample_session(id: &str, count: usize) -> Session {
    Session::new(
        SessionId::from(id),
        format!("Résumé for {id}"),
        None,
        generated_questions(count),
    )
}

/// A session with every question answered as `answer {i}`.
pub fn completed_session(id: &str, count: usize) -> Session {
    let mut session = sample_session(id, count);
    while let Some(ordinal) = sequencer::current_slot(&session).map(|s| s.ordinal) {
        let index = i64::try_from(ordinal).unwrap();
        apply_answer(&mut session, index, &format!("answer {ordinal}")).unwrap();
    }
    session
}

/// Returns `count` canned questions and counts calls.
#[derive(Default)]
pub struct StaticQuestionGenerator {
    calls: AtomicUsize,
}

impl StaticQuestionGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionGenerator for StaticQuestionGenerator {
    async fn generate(
        &self,
        _resume_text: &str,
        count: usize,
    ) -> Result<Vec<GeneratedQuestion>, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(generated_questions(count))
    }
}

/// Always returns a fixed number of questions regardless of the request.
pub struct FixedCountGenerator(pub usize);

#[async_trait]
impl QuestionGenerator for FixedCountGenerator {
    async fn generate(
        &self,
        _resume_text: &str,
        _count: usize,
    ) -> Result<Vec<GeneratedQuestion>, GenerationError> {
        Ok(generated_questions(self.0))
    }
}

pub struct FailingGenerator;

#[async_trait]
impl QuestionGenerator for FailingGenerator {
    async fn generate(
        &self,
        _resume_text: &str,
        _count: usize,
    ) -> Result<Vec<GeneratedQuestion>, GenerationError> {
        Err(GenerationError::InvalidOutput("model unavailable".into()))
    }
}

/// Never completes. Used to exercise caller-side timeouts.
pub struct PendingGenerator;

#[async_trait]
impl QuestionGenerator for PendingGenerator {
    async fn generate(
        &self,
        _resume_text: &str,
        _count: usize,
    ) -> Result<Vec<GeneratedQuestion>, GenerationError> {
        std::future::pending().await
    }
}

/// Scores question `i` with `scores[i]`.
pub struct ScriptedEvaluator {
    scores: Vec<i32>,
    calls: AtomicUsize,
}

impl ScriptedEvaluator {
    pub fn new(scores: Vec<i32>) -> Self {
        Self {
            scores,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnswerEvaluator for ScriptedEvaluator {
    async fn evaluate(
        &self,
        _resume_text: &str,
        answered: &[AnsweredQuestion],
    ) -> Result<EvaluationOutcome, EvaluationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(EvaluationOutcome {
            question_scores: answered
                .iter()
                .zip(&self.scores)
                .map(|(a, &score)| QuestionScore {
                    question_index: a.question_index,
                    score,
                    feedback: format!("feedback for {}", a.question_index),
                })
                .collect(),
            overall_feedback: "Good structure, thin on depth.".to_string(),
            strengths: vec!["communication".to_string()],
            improvements: vec!["quantify impact".to_string()],
            reference_answers: vec![],
        })
    }
}

pub struct FailingEvaluator;

#[async_trait]
impl AnswerEvaluator for FailingEvaluator {
    async fn evaluate(
        &self,
        _resume_text: &str,
        _answered: &[AnsweredQuestion],
    ) -> Result<EvaluationOutcome, EvaluationError> {
        Err(EvaluationError::InvalidOutput("model unavailable".into()))
    }
}

pub struct PendingEvaluator;

#[async_trait]
impl AnswerEvaluator for PendingEvaluator {
    async fn evaluate(
        &self,
        _resume_text: &str,
        _answered: &[AnsweredQuestion],
    ) -> Result<EvaluationOutcome, EvaluationError> {
        std::future::pending().await
    }
}

/// Records `kind:session[:index]` for every write it receives.
#[derive(Default)]
pub struct RecordingPersistence {
    events: Mutex<Vec<String>>,
}

impl RecordingPersistence {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl SessionPersistence for RecordingPersistence {
    async fn save_session(&self, snapshot: &SessionSnapshot) -> Result<()> {
        self.events
            .lock()
            .push(format!("session:{}", snapshot.session_id));
        Ok(())
    }

    async fn append_answer(&self, record: &AnswerRecord) -> Result<()> {
        self.events.lock().push(format!(
            "answer:{}:{}",
            record.session_id, record.question_index
        ));
        Ok(())
    }

    async fn save_report(&self, session_id: &SessionId, _report: &Report) -> Result<()> {
        self.events.lock().push(format!("report:{session_id}"));
        Ok(())
    }
}

/// Fails every write and counts attempts.
#[derive(Default)]
pub struct FailingPersistence {
    attempts: AtomicUsize,
}

impl FailingPersistence {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn fail(&self) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("database unavailable"))
    }
}

#[async_trait]
impl SessionPersistence for FailingPersistence {
    async fn save_session(&self, _snapshot: &SessionSnapshot) -> Result<()> {
        self.fail()
    }

    async fn append_answer(&self, _record: &AnswerRecord) -> Result<()> {
        self.fail()
    }

    async fn save_report(&self, _session_id: &SessionId, _report: &Report) -> Result<()> {
        self.fail()
    }
}
