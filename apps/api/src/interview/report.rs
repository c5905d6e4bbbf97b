//! Report synthesis: turns a COMPLETED session into a terminal EVALUATED one.
//!
//! Synthesis is split around the external evaluator call:
//! 1. `build_evaluation_request` snapshots the answers under the session lock.
//! 2. The evaluator runs with no lock held.
//! 3. `apply_evaluation` rechecks status and commits scores, aggregates and
//!    the report in one locked step.
//!
//! A dropped or failed evaluation never reaches step 3, so the session stays
//! COMPLETED and synthesis can be retried.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{info, warn};

use crate::interview::answer_evaluator::{AnswerEvaluator, AnsweredQuestion, EvaluationOutcome};
use crate::interview::error::SessionError;
use crate::interview::models::{
    CategoryScore, QuestionEvaluation, QuestionSlot, Report, Session, SessionId, SessionStatus,
};
use crate::interview::store::SessionStore;

const MIN_SCORE: i32 = 0;
const MAX_SCORE: i32 = 100;

/// Input for the external evaluator, captured from a COMPLETED session.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub resume_text: String,
    pub answered: Vec<AnsweredQuestion>,
}

pub fn build_evaluation_request(session: &Session) -> Result<EvaluationRequest, SessionError> {
    ensure_completed(session)?;

    let answered = session
        .slots
        .iter()
        .map(|slot| AnsweredQuestion {
            question_index: slot.ordinal,
            question: slot.question.clone(),
            category: slot.category.clone(),
            answer: slot.user_answer.clone().unwrap_or_default(),
        })
        .collect();

    Ok(EvaluationRequest {
        resume_text: session.resume_text().to_string(),
        answered,
    })
}

/// Writes the evaluator's verdict into the session and marks it EVALUATED.
pub fn apply_evaluation(
    session: &mut Session,
    outcome: EvaluationOutcome,
) -> Result<Report, SessionError> {
    ensure_completed(session)?;

    if outcome.question_scores.len() != session.slots.len() {
        return Err(SessionError::Evaluation(format!(
            "evaluator scored {} questions, session has {}",
            outcome.question_scores.len(),
            session.slots.len()
        )));
    }

    if let Some((slot, scored)) = session
        .slots
        .iter()
        .zip(&outcome.question_scores)
        .find(|(slot, scored)| slot.ordinal != scored.question_index)
    {
        return Err(SessionError::Evaluation(format!(
            "score for question {} returned where question {} was expected",
            scored.question_index, slot.ordinal
        )));
    }

    for (slot, scored) in session.slots.iter_mut().zip(&outcome.question_scores) {
        slot.score = Some(clamp_score(scored.score, slot.ordinal));
        slot.feedback = Some(scored.feedback.clone());
    }

    let question_details = session
        .slots
        .iter()
        .map(|slot| QuestionEvaluation {
            question_index: slot.ordinal,
            question: slot.question.clone(),
            category: slot.category.clone(),
            user_answer: slot.user_answer.clone().unwrap_or_default(),
            score: slot.score.unwrap_or_default(),
            feedback: slot.feedback.clone().unwrap_or_default(),
        })
        .collect();

    let report = Report {
        session_id: session.id.clone(),
        total_questions: session.slots.len(),
        overall_score: overall_score(&session.slots),
        category_scores: aggregate_by_category(&session.slots),
        question_details,
        overall_feedback: outcome.overall_feedback,
        strengths: outcome.strengths,
        improvements: outcome.improvements,
        reference_answers: outcome.reference_answers,
        generated_at: Utc::now(),
    };

    session.report = Some(report.clone());
    session.status = SessionStatus::Evaluated;

    Ok(report)
}

/// Runs the full synthesis for one stored session.
pub async fn synthesize(
    store: &SessionStore,
    evaluator: &dyn AnswerEvaluator,
    session_id: &SessionId,
) -> Result<Report, SessionError> {
    let request = store.read(session_id, build_evaluation_request)??;

    info!(
        "Evaluating {} answers for session {}",
        request.answered.len(),
        session_id
    );

    let outcome = evaluator
        .evaluate(&request.resume_text, &request.answered)
        .await
        .map_err(|e| SessionError::Evaluation(e.to_string()))?;

    let report = store.mutate(session_id, |session| apply_evaluation(session, outcome))?;

    info!(
        "Session {} evaluated: overall score {:.1}",
        session_id, report.overall_score
    );
    Ok(report)
}

/// Mean score per distinct category, each question weighted equally.
/// Categories keep the order in which they first appear.
pub fn aggregate_by_category(slots: &[QuestionSlot]) -> Vec<CategoryScore> {
    let mut order: Vec<&str> = Vec::new();
    let mut totals: HashMap<&str, (u32, usize)> = HashMap::new();

    for slot in slots {
        let Some(score) = slot.score else { continue };
        let entry = totals.entry(slot.category.as_str()).or_insert_with(|| {
            order.push(slot.category.as_str());
            (0, 0)
        });
        entry.0 += u32::from(score);
        entry.1 += 1;
    }

    order
        .into_iter()
        .map(|category| {
            let (sum, count) = totals[category];
            CategoryScore {
                category: category.to_string(),
                score: f64::from(sum) / count as f64,
                question_count: count,
            }
        })
        .collect()
}

/// Mean of all per-question scores. Zero when nothing has been scored.
pub fn overall_score(slots: &[QuestionSlot]) -> f64 {
    let scores: Vec<f64> = slots
        .iter()
        .filter_map(|s| s.score)
        .map(f64::from)
        .collect();
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

fn ensure_completed(session: &Session) -> Result<(), SessionError> {
    if session.status != SessionStatus::Completed {
        return Err(SessionError::NotComplete {
            id: session.id.clone(),
            status: session.status,
        });
    }
    Ok(())
}

fn clamp_score(raw: i32, ordinal: usize) -> u8 {
    let clamped = raw.clamp(MIN_SCORE, MAX_SCORE);
    if clamped != raw {
        warn!("Score {raw} for question {ordinal} is outside 0-100, clamped to {clamped}");
    }
    clamped as u8
}
