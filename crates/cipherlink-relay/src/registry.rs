//! Session registry: username to live-connection mapping
//!
//! Exactly one session exists per username at any time. All mutation goes
//! through one lock over the whole registry so that uniqueness checks, the
//! connection binding, and the online roster can never disagree.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::{debug, info};

use cipherlink_core::{ConnectionId, PublicKey, Timestamp, Username};

use crate::connection::ConnectionHandle;
use crate::error::{RelayError, Result};

/// A live registered user
#[derive(Clone, Debug)]
pub struct Session {
    /// Claimed username
    pub username: Username,
    /// Published public key, opaque to the relay
    pub public_key: PublicKey,
    /// Push target for live delivery
    pub handle: ConnectionHandle,
    /// When the session was registered
    pub joined_at: Timestamp,
}

#[derive(Default)]
struct RegistryInner {
    sessions: HashMap<Username, Session>,
    /// connection -> username, consulted on disconnect
    bindings: HashMap<ConnectionId, Username>,
    /// Registration order; drives the `onlineUsers` roster
    join_order: Vec<Username>,
}

/// Process-wide registry of online sessions
#[derive(Default)]
pub struct SessionRegistry {
    inner: RwLock<RegistryInner>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a username with its public key and connection
    ///
    /// Fails with [`RelayError::UsernameTaken`] without mutating anything if
    /// the username already has a session. On success returns the online
    /// roster in join order, including the new user.
    pub fn register(
        &self,
        username: Username,
        public_key: PublicKey,
        handle: ConnectionHandle,
    ) -> Result<Vec<Username>> {
        let mut inner = self.inner.write();

        if inner.sessions.contains_key(&username) {
            debug!(%username, "Registration rejected, username taken");
            return Err(RelayError::UsernameTaken(username));
        }

        let session = Session {
            username: username.clone(),
            public_key,
            handle: handle.clone(),
            joined_at: Timestamp::now(),
        };

        inner.bindings.insert(handle.id(), username.clone());
        inner.join_order.push(username.clone());
        inner.sessions.insert(username.clone(), session);

        info!(%username, connection = %handle.id(), "User registered");
        Ok(inner.join_order.clone())
    }

    /// Look up a user's published public key
    pub fn public_key(&self, username: &Username) -> Result<PublicKey> {
        self.inner
            .read()
            .sessions
            .get(username)
            .map(|session| session.public_key.clone())
            .ok_or_else(|| RelayError::UserNotFound(username.clone()))
    }

    /// Remove the session bound to a connection, if any
    ///
    /// At most one session matches, by the uniqueness invariant. Returns the
    /// removed session so the caller can broadcast the departure; a second
    /// call for the same connection returns `None`.
    pub fn remove(&self, connection: ConnectionId) -> Option<Session> {
        let mut inner = self.inner.write();

        let username = inner.bindings.remove(&connection)?;
        let session = inner.sessions.remove(&username);
        inner.join_order.retain(|name| name != &username);

        info!(%username, %connection, "User removed");
        session
    }

    /// Whether a username currently has a live session
    pub fn is_online(&self, username: &Username) -> bool {
        self.inner.read().sessions.contains_key(username)
    }

    /// Push target for a username, if online
    pub fn handle_of(&self, username: &Username) -> Option<ConnectionHandle> {
        self.inner
            .read()
            .sessions
            .get(username)
            .map(|session| session.handle.clone())
    }

    /// Snapshot of every live handle except the given connection
    ///
    /// Broadcasts iterate this snapshot, never the live map.
    pub fn handles_except(&self, connection: ConnectionId) -> Vec<ConnectionHandle> {
        self.inner
            .read()
            .sessions
            .values()
            .filter(|session| session.handle.id() != connection)
            .map(|session| session.handle.clone())
            .collect()
    }

    /// Number of online sessions
    pub fn online_count(&self) -> usize {
        self.inner.read().sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(registry: &SessionRegistry, name: &str) -> ConnectionHandle {
        let (handle, _rx) = ConnectionHandle::channel();
        registry
            .register(Username::from(name), PublicKey::from("pk"), handle.clone())
            .unwrap();
        handle
    }

    #[test]
    fn roster_includes_new_user_in_join_order() {
        let registry = SessionRegistry::new();
        register(&registry, "alice");

        let (handle, _rx) = ConnectionHandle::channel();
        let roster = registry
            .register(Username::from("bob"), PublicKey::from("pk"), handle)
            .unwrap();

        assert_eq!(roster, vec![Username::from("alice"), Username::from("bob")]);
    }

    #[test]
    fn duplicate_username_fails_without_mutation() {
        let registry = SessionRegistry::new();
        let first = register(&registry, "alice");

        let (handle, _rx) = ConnectionHandle::channel();
        let err = registry
            .register(Username::from("alice"), PublicKey::from("other"), handle)
            .unwrap_err();

        assert_eq!(err, RelayError::UsernameTaken(Username::from("alice")));
        assert_eq!(registry.online_count(), 1);
        // The original session is untouched
        assert_eq!(
            registry.handle_of(&Username::from("alice")).unwrap().id(),
            first.id()
        );
        assert_eq!(
            registry.public_key(&Username::from("alice")).unwrap(),
            PublicKey::from("pk")
        );
    }

    #[test]
    fn remove_by_connection_is_idempotent() {
        let registry = SessionRegistry::new();
        let handle = register(&registry, "alice");

        let removed = registry.remove(handle.id()).unwrap();
        assert_eq!(removed.username, Username::from("alice"));
        assert!(!registry.is_online(&Username::from("alice")));

        assert!(registry.remove(handle.id()).is_none());
    }

    #[test]
    fn unknown_user_has_no_key() {
        let registry = SessionRegistry::new();
        let err = registry.public_key(&Username::from("ghost")).unwrap_err();
        assert_eq!(err, RelayError::UserNotFound(Username::from("ghost")));
    }

    #[test]
    fn broadcast_snapshot_excludes_the_origin() {
        let registry = SessionRegistry::new();
        let alice = register(&registry, "alice");
        register(&registry, "bob");
        register(&registry, "carol");

        let peers = registry.handles_except(alice.id());
        assert_eq!(peers.len(), 2);
        assert!(peers.iter().all(|peer| peer.id() != alice.id()));
    }

    #[test]
    fn username_is_reusable_after_removal() {
        let registry = SessionRegistry::new();
        let handle = register(&registry, "alice");
        registry.remove(handle.id());

        let (handle, _rx) = ConnectionHandle::channel();
        let roster = registry
            .register(Username::from("alice"), PublicKey::from("pk2"), handle)
            .unwrap();
        assert_eq!(roster, vec![Username::from("alice")]);
    }
}
