//! Session registry: the process-wide index of live sessions.
//!
//! Two indexes are published atomically under one lock: session id → session
//! and normalized screen name → session id. Relay operations snapshot the
//! registry under the read lock and enqueue outside it, so a slow session
//! can never stall an unrelated broadcast.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use warble_proto::SnacMessage;

use crate::{
    screen_name::{IdentScreenName, ScreenName},
    session::Session,
};

#[derive(Debug, Default)]
struct Inner {
    by_id: HashMap<String, Arc<Session>>,
    by_name: HashMap<IdentScreenName, String>,
}

/// Registry of live sessions, keyed by id and by screen name.
///
/// The main service holds one; every chat room holds its own.
///
/// # Invariants
///
/// - At most one session per normalized screen name. Adding a second login
///   for a name displaces (closes) the first.
/// - `add` is idempotent on session id.
/// - Removal closes the session's outbound stream exactly once; close itself
///   is idempotent, so displacement plus removal is safe.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    inner: RwLock<Inner>,
}

impl SessionRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Create (or return) the session for this id.
    ///
    /// Idempotent on id. If another session already holds the screen name,
    /// that session is displaced: closed and unindexed, its reader expected
    /// to exit when the writer drains the terminate marker.
    pub fn add(
        &self,
        session_id: impl Into<String>,
        screen_name: ScreenName,
        signon_time: u64,
    ) -> Arc<Session> {
        let session_id = session_id.into();
        let (session, displaced) = {
            let mut inner = self.write();

            if let Some(existing) = inner.by_id.get(&session_id) {
                return Arc::clone(existing);
            }

            let ident = screen_name.ident();
            let displaced = match inner.by_name.remove(&ident) {
                Some(prior_id) => inner.by_id.remove(&prior_id),
                None => None,
            };

            let session = Arc::new(Session::new(session_id.clone(), screen_name, signon_time));
            inner.by_id.insert(session_id, Arc::clone(&session));
            inner.by_name.insert(ident, session.id().to_string());
            (session, displaced)
        };

        // Close outside the lock; close enqueues on the prior session's FIFO.
        if let Some(prior) = displaced {
            tracing::info!(screen_name = %prior.ident(), "displacing prior login");
            prior.close();
        }
        session
    }

    /// Session by id.
    #[must_use]
    pub fn retrieve(&self, session_id: &str) -> Option<Arc<Session>> {
        self.read().by_id.get(session_id).cloned()
    }

    /// Session by normalized screen name.
    #[must_use]
    pub fn retrieve_by_screen_name(&self, ident: &IdentScreenName) -> Option<Arc<Session>> {
        let inner = self.read();
        let id = inner.by_name.get(ident)?;
        inner.by_id.get(id).cloned()
    }

    /// Remove and close a session. Returns it if it was present.
    pub fn remove(&self, session_id: &str) -> Option<Arc<Session>> {
        let session = {
            let mut inner = self.write();
            let session = inner.by_id.remove(session_id)?;
            // Only unindex the name if it still points at this login; a
            // displaced session must not evict its replacement.
            if inner.by_name.get(session.ident()).is_some_and(|id| id == session_id) {
                inner.by_name.remove(session.ident());
            }
            session
        };
        session.close();
        Some(session)
    }

    /// Snapshot of every session.
    #[must_use]
    pub fn all_sessions(&self) -> Vec<Arc<Session>> {
        self.read().by_id.values().cloned().collect()
    }

    /// Snapshot of every session except the given one.
    #[must_use]
    pub fn all_except(&self, except: &Session) -> Vec<Arc<Session>> {
        self.read()
            .by_id
            .values()
            .filter(|s| s.id() != except.id())
            .cloned()
            .collect()
    }

    /// Best-effort unicast by screen name; silently dropped if absent.
    pub fn relay_to_screen_name(&self, ident: &IdentScreenName, msg: SnacMessage) {
        if let Some(session) = self.retrieve_by_screen_name(ident) {
            session.relay(msg);
        }
    }

    /// Best-effort relay to each named session; drops are per-recipient.
    pub fn relay_to_screen_names(&self, idents: &[IdentScreenName], msg: &SnacMessage) {
        for ident in idents {
            self.relay_to_screen_name(ident, msg.clone());
        }
    }

    /// Relay to every session except the given one.
    pub fn relay_to_all_except(&self, except: &Session, msg: &SnacMessage) {
        for session in self.all_except(except) {
            session.relay(msg.clone());
        }
    }

    /// Whether no sessions remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().by_id.is_empty()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().by_id.len()
    }
}

#[cfg(test)]
mod tests {
    use warble_proto::SnacBody;

    use super::*;
    use crate::session::Outbound;

    fn msg() -> SnacMessage {
        SnacMessage::push(SnacBody::FeedbagQuery)
    }

    #[test]
    fn add_and_lookup_both_indexes() {
        let registry = SessionRegistry::new();
        let session = registry.add("sid-1", ScreenName::new("Chatting Chuck"), 100);

        assert_eq!(registry.retrieve("sid-1").unwrap().id(), session.id());
        let by_name = registry
            .retrieve_by_screen_name(&IdentScreenName::from("chattingchuck"))
            .unwrap();
        assert_eq!(by_name.id(), "sid-1");
    }

    #[test]
    fn add_is_idempotent_on_id() {
        let registry = SessionRegistry::new();
        let first = registry.add("sid-1", ScreenName::new("alice"), 100);
        let second = registry.add("sid-1", ScreenName::new("alice"), 200);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn second_login_displaces_first() {
        let registry = SessionRegistry::new();
        let first = registry.add("sid-1", ScreenName::new("alice"), 100);
        let second = registry.add("sid-2", ScreenName::new("ALICE"), 200);

        assert!(first.is_closed());
        assert!(!second.is_closed());
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.retrieve_by_screen_name(&IdentScreenName::from("alice")).unwrap().id(),
            "sid-2"
        );
        assert!(registry.retrieve("sid-1").is_none());
    }

    #[test]
    fn remove_closes_and_unindexes() {
        let registry = SessionRegistry::new();
        registry.add("sid-1", ScreenName::new("alice"), 100);

        let removed = registry.remove("sid-1").unwrap();
        assert!(removed.is_closed());
        assert!(registry.retrieve("sid-1").is_none());
        assert!(registry.retrieve_by_screen_name(&IdentScreenName::from("alice")).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_unknown_is_none() {
        let registry = SessionRegistry::new();
        assert!(registry.remove("nope").is_none());
    }

    #[test]
    fn relay_to_screen_name_drops_silently_when_absent() {
        let registry = SessionRegistry::new();
        // No panic, no error.
        registry.relay_to_screen_name(&IdentScreenName::from("ghost"), msg());
    }

    #[test]
    fn relay_to_all_except_skips_sender() {
        let registry = SessionRegistry::new();
        let alice = registry.add("sid-1", ScreenName::new("alice"), 100);
        let bob = registry.add("sid-2", ScreenName::new("bob"), 100);

        let mut alice_rx = alice.take_outbound().unwrap();
        let mut bob_rx = bob.take_outbound().unwrap();

        registry.relay_to_all_except(&alice, &msg());

        assert!(alice_rx.try_recv().is_err());
        assert_eq!(bob_rx.try_recv().unwrap(), Outbound::Message(msg()));
    }

    #[test]
    fn relay_to_screen_names_is_per_recipient() {
        let registry = SessionRegistry::new();
        let alice = registry.add("sid-1", ScreenName::new("alice"), 100);
        let mut alice_rx = alice.take_outbound().unwrap();

        registry.relay_to_screen_names(
            &[IdentScreenName::from("alice"), IdentScreenName::from("ghost")],
            &msg(),
        );

        assert_eq!(alice_rx.try_recv().unwrap(), Outbound::Message(msg()));
    }
}
