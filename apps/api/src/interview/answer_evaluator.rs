//! Answer evaluation: pluggable capability that scores a finished interview in one batch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::interview::models::ReferenceAnswer;
use crate::interview::prompts::{render, EVALUATION_PROMPT_TEMPLATE, EVALUATION_SYSTEM};
use crate::llm_client::{LlmClient, LlmError};

const MAX_RESUME_CHARS: usize = 8_000;

/// One answered question as sent to the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    pub question_index: usize,
    pub question: String,
    pub category: String,
    pub answer: String,
}

/// Score and feedback for one question. `score` is nominally 0–100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionScore {
    pub question_index: usize,
    pub score: i32,
    #[serde(default)]
    pub feedback: String,
}

/// Everything the evaluator returns for one interview.
///
/// `question_scores` is ordered like the submitted questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub question_scores: Vec<QuestionScore>,
    #[serde(default)]
    pub overall_feedback: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub reference_answers: Vec<ReferenceAnswer>,
}

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Evaluator returned unusable output: {0}")]
    InvalidOutput(String),
}

#[async_trait]
pub trait AnswerEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        resume_text: &str,
        answered: &[AnsweredQuestion],
    ) -> Result<EvaluationOutcome, EvaluationError>;
}

/// Claude-backed evaluator.
pub struct LlmAnswerEvaluator {
    llm: LlmClient,
}

impl LlmAnswerEvaluator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl AnswerEvaluator for LlmAnswerEvaluator {
    async fn evaluate(
        &self,
        resume_text: &str,
        answered: &[AnsweredQuestion],
    ) -> Result<EvaluationOutcome, EvaluationError> {
        let prompt = build_evaluation_prompt(resume_text, answered)?;
        let mut outcome: EvaluationOutcome =
            self.llm.call_json(&prompt, EVALUATION_SYSTEM).await?;

        // The model does not always keep input order.
        outcome.question_scores.sort_by_key(|s| s.question_index);
        check_coverage(&outcome, answered)?;

        info!("Evaluated {} answers", outcome.question_scores.len());
        Ok(outcome)
    }
}

fn build_evaluation_prompt(
    resume_text: &str,
    answered: &[AnsweredQuestion],
) -> Result<String, EvaluationError> {
    let answers_json = serde_json::to_string_pretty(answered)
        .map_err(|e| EvaluationError::InvalidOutput(format!("cannot serialize answers: {e}")))?;
    let resume: String = resume_text.chars().take(MAX_RESUME_CHARS).collect();

    Ok(render(
        EVALUATION_PROMPT_TEMPLATE,
        &[
            ("count", answered.len().to_string().as_str()),
            ("resume_text", resume.as_str()),
            ("answers_json", answers_json.as_str()),
        ],
    ))
}

/// Every submitted question must come back with exactly one score.
fn check_coverage(
    outcome: &EvaluationOutcome,
    answered: &[AnsweredQuestion],
) -> Result<(), EvaluationError> {
    let returned: Vec<usize> = outcome
        .question_scores
        .iter()
        .map(|s| s.question_index)
        .collect();
    let expected: Vec<usize> = answered.iter().map(|a| a.question_index).collect();

    if returned != expected {
        return Err(EvaluationError::InvalidOutput(format!(
            "scored questions {returned:?}, expected {expected:?}"
        )));
    }
    Ok(())
}
