//! Answer submission: validates one answer against the live cursor and applies it.
//!
//! Acceptance requires `question_index == cursor`, which gives a total order
//! over answers without a caller-supplied sequence number. A client retrying
//! a submission whose response it never saw gets a mismatch instead of a
//! second write.

use tracing::debug;

use crate::interview::error::SessionError;
use crate::interview::models::{QuestionSlot, Session, SessionId, SubmissionResult};
use crate::interview::sequencer;
use crate::interview::store::SessionStore;

/// What a successful submission changed, for the response and for persistence.
#[derive(Debug, Clone)]
pub struct AppliedAnswer {
    pub result: SubmissionResult,
    /// The slot as it stands after recording the answer.
    pub answered: QuestionSlot,
}

/// Validates and records `answer` for `question_index` on one session.
///
/// Checks run in a fixed order: range, cursor match, then status.
pub fn apply_answer(
    session: &mut Session,
    question_index: i64,
    answer: &str,
) -> Result<AppliedAnswer, SessionError> {
    let total = session.slots.len();

    let Some(ordinal) = usize::try_from(question_index)
        .ok()
        .filter(|&ordinal| ordinal < total)
    else {
        return Err(SessionError::InvalidQuestionIndex {
            index: question_index,
            total,
        });
    };

    if ordinal != session.cursor {
        return Err(SessionError::QuestionIndexMismatch {
            expected: session.cursor,
            submitted: ordinal,
        });
    }

    if !session.status.accepts_answers() {
        return Err(SessionError::SessionTerminal {
            id: session.id.clone(),
            status: session.status,
        });
    }

    let slot = &mut session.slots[ordinal];
    debug_assert!(!slot.is_answered(), "slot at the cursor is never answered");
    slot.user_answer = Some(answer.to_string());
    let answered = slot.clone();

    sequencer::advance(session)?;

    let next_question = sequencer::current_slot(session).cloned();
    Ok(AppliedAnswer {
        result: SubmissionResult {
            has_next_question: next_question.is_some(),
            next_question,
            current_index: session.cursor,
            total_questions: total,
            status: session.status,
        },
        answered,
    })
}

/// Applies an answer to a stored session under that session's lock.
pub fn submit(
    store: &SessionStore,
    session_id: &SessionId,
    question_index: i64,
    answer: &str,
) -> Result<AppliedAnswer, SessionError> {
    let applied = store.mutate(session_id, |session| {
        apply_answer(session, question_index, answer)
    })?;

    debug!(
        "Session {} accepted answer {}, {} remaining",
        session_id,
        question_index,
        applied.result.total_questions - applied.result.current_index
    );

    Ok(applied)
}
