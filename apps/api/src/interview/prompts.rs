// Prompt templates for the interview question generator and answer evaluator.
// Placeholders in braces are filled by `render` before the call.

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

pub const QUESTION_GENERATION_SYSTEM: &str = JSON_ONLY_SYSTEM;

pub const QUESTION_GENERATION_PROMPT_TEMPLATE: &str = r#"
You are a senior technical interviewer preparing a mock interview for the candidate whose résumé is below.

Write exactly {count} interview questions. Rules:
- Ground each question in something the résumé actually claims (a project, a technology, a role).
- Mix categories: project_experience, fundamentals, system_design, debugging, behavioral.
- Order the questions from warm-up to hardest.
- One question per entry. No multi-part questions.

Return a JSON object of this shape:
{"questions": [{"question": "...", "category": "..."}]}

RÉSUMÉ:
{resume_text}
"#;

pub const EVALUATION_SYSTEM: &str = JSON_ONLY_SYSTEM;

pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"
You are grading a completed mock interview. The candidate's résumé and every question with its answer are below.

Score all {count} questions. For each one give an integer score from 0 to 100 and two or three sentences of feedback.
An empty or evasive answer scores below 20. Do not reward length on its own.

Then give:
- overall_feedback: one paragraph.
- strengths: up to five short items.
- improvements: up to five short, actionable items.
- reference_answers: for each question, a model answer and its key points.

Return a JSON object of this shape:
{
  "question_scores": [{"question_index": 0, "score": 0, "feedback": "..."}],
  "overall_feedback": "...",
  "strengths": ["..."],
  "improvements": ["..."],
  "reference_answers": [{"question": "...", "reference_answer": "...", "key_points": ["..."]}]
}

RÉSUMÉ:
{resume_text}

QUESTIONS AND ANSWERS:
{answers_json}
"#;

/// Fills `{key}` placeholders in a single pass. Substituted text is never
/// rescanned, so user content that looks like a placeholder stays literal.
/// Braces that do not name a known key are kept as-is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let filled = vars.iter().find_map(|(key, value)| {
            let remainder = after.strip_prefix(key)?.strip_prefix('}')?;
            Some((*value, remainder))
        });
        match filled {
            Some((value, remainder)) => {
                out.push_str(value);
                rest = remainder;
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
