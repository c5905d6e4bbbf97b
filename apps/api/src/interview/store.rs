//! SessionStore: the in-memory registry of live interview sessions.
//!
//! The registry is a `DashMap` of per-session `Mutex`es. The map's shard lock
//! is only held long enough to clone an entry handle, so sessions never
//! contend with one another. All writes go through `mutate`, which runs the
//! transition against a copy and swaps the copy in only when it succeeds.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::interview::error::SessionError;
use crate::interview::models::{Session, SessionId};

type SessionHandle = Arc<Mutex<Session>>;

#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, SessionHandle>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a freshly built session. Fails if the identifier is taken.
    pub fn create(&self, session: Session) -> Result<SessionId, SessionError> {
        let id = session.id().clone();
        match self.sessions.entry(id.clone()) {
            Entry::Occupied(_) => Err(SessionError::DuplicateSession(id)),
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(Mutex::new(session)));
                Ok(id)
            }
        }
    }

    /// Returns a snapshot copy of the session.
    pub fn get(&self, id: &SessionId) -> Result<Session, SessionError> {
        self.read(id, Session::clone)
    }

    /// Runs `f` against the session under its lock without copying it.
    pub fn read<T>(&self, id: &SessionId, f: impl FnOnce(&Session) -> T) -> Result<T, SessionError> {
        let handle = self.handle(id)?;
        let guard = handle.lock();
        Ok(f(&*guard))
    }

    /// Applies a transition to one session under that session's lock.
    ///
    /// `f` works on a copy. If it returns an error the live session is left
    /// exactly as it was.
    pub fn mutate<T, F>(&self, id: &SessionId, f: F) -> Result<T, SessionError>
    where
        F: FnOnce(&mut Session) -> Result<T, SessionError>,
    {
        let handle = self.handle(id)?;
        let mut guard = handle.lock();
        let mut draft = guard.clone();
        let output = f(&mut draft)?;
        *guard = draft;
        Ok(output)
    }

    fn handle(&self, id: &SessionId) -> Result<SessionHandle, SessionError> {
        self.sessions
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }
}

#[cfg(test)]
impl SessionStore {
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
