//! Username registry.
//!
//! One `RwLock` guards both the session table and the username index, so a
//! fan-out never observes a half-applied rename and a rename can check
//! uniqueness and apply itself atomically.

use std::collections::HashMap;
use std::sync::Arc;

use chadt_proto::Message;
use parking_lot::RwLock;

use super::{ClientSession, SessionId};
use crate::error::HandlerError;

#[derive(Debug, Default)]
struct Inner {
    sessions: HashMap<SessionId, Arc<ClientSession>>,
    by_name: HashMap<String, SessionId>,
}

/// Live sessions keyed by id and by current username.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    inner: RwLock<Inner>,
}

impl SessionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its current username.
    ///
    /// Returns `false` if the username or id is already taken.
    pub fn insert(&self, session: Arc<ClientSession>) -> bool {
        let mut inner = self.inner.write();
        let username = session.username();
        if inner.by_name.contains_key(&username) || inner.sessions.contains_key(&session.id()) {
            return false;
        }
        inner.by_name.insert(username, session.id());
        inner.sessions.insert(session.id(), session);
        true
    }

    /// Remove a session, returning it if it was registered.
    pub fn remove(&self, id: SessionId) -> Option<Arc<ClientSession>> {
        let mut inner = self.inner.write();
        let session = inner.sessions.remove(&id)?;
        inner.by_name.retain(|_, owner| *owner != id);
        Some(session)
    }

    /// Session registered under `id`.
    pub fn get(&self, id: SessionId) -> Option<Arc<ClientSession>> {
        self.inner.read().sessions.get(&id).cloned()
    }

    /// Whether some session currently holds `username`.
    pub fn contains_name(&self, username: &str) -> bool {
        self.inner.read().by_name.contains_key(username)
    }

    /// Move session `id` to `username`, returning the name it had before.
    pub fn rename(&self, id: SessionId, username: &str) -> Result<String, HandlerError> {
        let mut inner = self.inner.write();
        if inner.by_name.contains_key(username) {
            return Err(HandlerError::UsernameInUse(username.to_owned()));
        }
        let session = inner
            .sessions
            .get(&id)
            .cloned()
            .ok_or(HandlerError::UnknownSession(id))?;
        let old = session
            .rename(username)
            .ok_or(HandlerError::SessionClosed(id))?;

        inner.by_name.remove(&old);
        inner.by_name.insert(username.to_owned(), id);
        Ok(old)
    }

    /// Snapshot of registered usernames, sorted.
    pub fn usernames(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.read().by_name.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Queue `message` for every session whose username passes `filter`.
    ///
    /// Returns the number of sessions the message was queued for.
    pub fn deliver<F>(&self, message: &Message, mut filter: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let inner = self.inner.read();
        let mut delivered = 0;
        for (username, id) in &inner.by_name {
            if !filter(username) {
                continue;
            }
            if let Some(session) = inner.sessions.get(id)
                && session.enqueue(message.clone())
            {
                delivered += 1;
            }
        }
        delivered
    }

    /// Remove and return every session.
    pub fn drain(&self) -> Vec<Arc<ClientSession>> {
        let mut inner = self.inner.write();
        inner.by_name.clear();
        inner.sessions.drain().map(|(_, session)| session).collect()
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.inner.read().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SessionState;
    use chadt_proto::{Connection, ConnectionOptions};

    fn session(id: u64, username: &str) -> Arc<ClientSession> {
        let conn = Connection::outbound("127.0.0.1", 1, ConnectionOptions::default());
        ClientSession::new(SessionId::new(id), username, conn)
    }

    #[test]
    fn test_insert_rejects_duplicate_name() {
        let registry = SessionRegistry::new();
        assert!(registry.insert(session(0, "user0")));
        assert!(!registry.insert(session(1, "user0")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_rename_rekeys() {
        let registry = SessionRegistry::new();
        registry.insert(session(0, "user0"));

        assert_eq!(registry.rename(SessionId::new(0), "alice").unwrap(), "user0");
        assert!(!registry.contains_name("user0"));
        assert_eq!(registry.usernames(), vec!["alice"]);
        let alice = registry.get(SessionId::new(0)).unwrap();
        assert_eq!(alice.username(), "alice");
        assert_eq!(alice.state(), SessionState::Named);
    }

    #[test]
    fn test_rename_to_taken_name_changes_nothing() {
        let registry = SessionRegistry::new();
        registry.insert(session(0, "alice"));
        registry.insert(session(1, "user1"));

        let err = registry.rename(SessionId::new(1), "alice").unwrap_err();
        assert_eq!(err, HandlerError::UsernameInUse("alice".into()));
        assert_eq!(registry.usernames(), vec!["alice", "user1"]);
        assert_eq!(registry.get(SessionId::new(1)).unwrap().username(), "user1");
    }

    #[test]
    fn test_rename_unknown_session() {
        let registry = SessionRegistry::new();
        assert_eq!(
            registry.rename(SessionId::new(9), "alice"),
            Err(HandlerError::UnknownSession(SessionId::new(9)))
        );
    }

    #[test]
    fn test_usernames_stay_unique_across_renames() {
        let registry = SessionRegistry::new();
        for i in 0..4 {
            registry.insert(session(i, &format!("user{i}")));
        }
        for (i, name) in ["a", "b", "a", "c", "b", "a"].iter().enumerate() {
            let _ = registry.rename(SessionId::new(i as u64 % 4), name);
        }
        let names = registry.usernames();
        let mut deduped = names.clone();
        deduped.dedup();
        assert_eq!(names, deduped);
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_remove_frees_name() {
        let registry = SessionRegistry::new();
        registry.insert(session(0, "alice"));
        assert!(registry.remove(SessionId::new(0)).is_some());
        assert!(registry.remove(SessionId::new(0)).is_none());
        assert!(registry.insert(session(1, "alice")));
    }

    #[test]
    fn test_deliver_applies_filter() {
        let registry = SessionRegistry::new();
        registry.insert(session(0, "alice"));
        registry.insert(session(1, "bob"));
        registry.insert(session(2, "carol"));

        let msg = Message::text("hi", "alice", "bob");
        assert_eq!(registry.deliver(&msg, |name| name == "bob"), 1);
        assert_eq!(registry.deliver(&msg, |_| true), 3);
        assert_eq!(registry.deliver(&msg, |name| name == "dave"), 0);
    }

    #[test]
    fn test_drain_empties() {
        let registry = SessionRegistry::new();
        registry.insert(session(0, "alice"));
        registry.insert(session(1, "bob"));
        assert_eq!(registry.drain().len(), 2);
        assert!(registry.is_empty());
        assert!(registry.usernames().is_empty());
    }
}
