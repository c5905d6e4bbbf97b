//! Question sequencing: cursor and status transitions for one session.
//!
//! Pure functions over `Session`. No I/O, no clock, no randomness.

use crate::interview::error::SessionError;
use crate::interview::models::{QuestionSlot, Session, SessionStatus};

/// The next unanswered slot, or `None` once every question has been answered.
pub fn current_slot(session: &Session) -> Option<&QuestionSlot> {
    session.slots.get(session.cursor)
}

/// Moves the cursor forward by exactly one slot.
///
/// Reaching the end marks the session COMPLETED. Otherwise the first advance
/// moves a CREATED session to IN_PROGRESS.
pub fn advance(session: &mut Session) -> Result<(), SessionError> {
    if session.cursor >= session.slots.len() {
        return Err(SessionError::AlreadyCompleted(session.id.clone()));
    }

    session.cursor += 1;

    if session.cursor == session.slots.len() {
        session.status = SessionStatus::Completed;
    } else if session.status == SessionStatus::Created {
        session.status = SessionStatus::InProgress;
    }

    Ok(())
}
