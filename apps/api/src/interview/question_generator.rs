//! Question generation: pluggable capability that turns résumé text into questions.
//!
//! The engine only sees the `QuestionGenerator` trait. `LlmQuestionGenerator`
//! is the production backend; tests use deterministic doubles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::interview::prompts::{
    render, QUESTION_GENERATION_PROMPT_TEMPLATE, QUESTION_GENERATION_SYSTEM,
};
use crate::llm_client::{LlmClient, LlmError};

/// Résumé text longer than this is cut before it goes into the prompt.
const MAX_RESUME_CHARS: usize = 12_000;

/// One generated interview question and the category it probes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub category: String,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Generator returned unusable output: {0}")]
    InvalidOutput(String),
}

/// Produces an ordered list of exactly `count` questions for a résumé.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(
        &self,
        resume_text: &str,
        count: usize,
    ) -> Result<Vec<GeneratedQuestion>, GenerationError>;
}

#[derive(Debug, Deserialize)]
struct GeneratedQuestionSet {
    questions: Vec<GeneratedQuestion>,
}

/// Claude-backed generator.
pub struct LlmQuestionGenerator {
    llm: LlmClient,
}

impl LlmQuestionGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl QuestionGenerator for LlmQuestionGenerator {
    async fn generate(
        &self,
        resume_text: &str,
        count: usize,
    ) -> Result<Vec<GeneratedQuestion>, GenerationError> {
        let prompt = build_generation_prompt(resume_text, count);
        let set: GeneratedQuestionSet = self
            .llm
            .call_json(&prompt, QUESTION_GENERATION_SYSTEM)
            .await?;

        let questions = normalize_questions(set.questions, count)?;
        info!("Generated {} interview questions", questions.len());
        Ok(questions)
    }
}

fn build_generation_prompt(resume_text: &str, count: usize) -> String {
    let resume: String = resume_text.chars().take(MAX_RESUME_CHARS).collect();
    render(
        QUESTION_GENERATION_PROMPT_TEMPLATE,
        &[
            ("count", count.to_string().as_str()),
            ("resume_text", resume.as_str()),
        ],
    )
}

/// Drops blank questions, fills blank categories and trims to `count`.
fn normalize_questions(
    raw: Vec<GeneratedQuestion>,
    count: usize,
) -> Result<Vec<GeneratedQuestion>, GenerationError> {
    let mut questions: Vec<GeneratedQuestion> = raw
        .into_iter()
        .filter(|q| !q.question.trim().is_empty())
        .map(|q| GeneratedQuestion {
            question: q.question.trim().to_string(),
            category: match q.category.trim() {
                "" => "general".to_string(),
                other => other.to_lowercase(),
            },
        })
        .collect();

    if questions.len() < count {
        return Err(GenerationError::InvalidOutput(format!(
            "expected {count} questions, got {}",
            questions.len()
        )));
    }

    if questions.len() > count {
        warn!(
            "Generator returned {} questions, keeping the first {count}",
            questions.len()
        );
        questions.truncate(count);
    }

    Ok(questions)
}
