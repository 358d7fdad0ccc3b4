//! Per-connection handles and lifecycle state
//!
//! A [`ConnectionHandle`] is the push target the registry stores for each
//! session; a [`ConnectionContext`] carries the state machine for one
//! transport connection and is passed explicitly to every router handler.

use tokio::sync::mpsc;
use tracing::debug;

use cipherlink_core::{ConnectionId, ServerEvent, Username};

/// Cloneable push target for one transport connection
///
/// Wraps the outbound event channel. The transport side owns the receiver
/// and forwards events onto the wire in order.
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
    /// Create a handle around an existing sender
    pub fn new(tx: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            id: ConnectionId::new(),
            tx,
        }
    }

    /// Create a handle together with its outbound receiver
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Connection identifier
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Push an event to this connection
    ///
    /// Fails soft: a push to a torn-down connection is logged and dropped,
    /// never an error. Returns whether the event was accepted.
    pub fn push(&self, event: ServerEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(_) => {
                debug!(connection = %self.id, "Dropped push to closed connection");
                false
            }
        }
    }
}

/// Lifecycle state of one connection
///
/// `Unattached -> Registered -> Disconnected`, with `Disconnected` terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// Attached, no identity bound yet
    Unattached,
    /// Identity bound by a successful `register`
    Registered(Username),
    /// Torn down; no further transitions
    Disconnected,
}

/// Explicit per-connection context passed to every handler
#[derive(Debug)]
pub struct ConnectionContext {
    handle: ConnectionHandle,
    state: ConnectionState,
}

impl ConnectionContext {
    /// Context for a freshly attached connection
    pub fn new(handle: ConnectionHandle) -> Self {
        Self {
            handle,
            state: ConnectionState::Unattached,
        }
    }

    /// Connection identifier
    pub fn id(&self) -> ConnectionId {
        self.handle.id()
    }

    /// Push target for this connection
    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    /// Current lifecycle state
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Bound username, if registered
    pub fn username(&self) -> Option<&Username> {
        match &self.state {
            ConnectionState::Registered(username) => Some(username),
            _ => None,
        }
    }

    /// Whether the connection has reached its terminal state
    pub fn is_disconnected(&self) -> bool {
        self.state == ConnectionState::Disconnected
    }

    pub(crate) fn bind(&mut self, username: Username) {
        self.state = ConnectionState::Registered(username);
    }

    pub(crate) fn close(&mut self) {
        self.state = ConnectionState::Disconnected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_to_dropped_receiver_fails_soft() {
        let (handle, rx) = ConnectionHandle::channel();
        drop(rx);
        assert!(!handle.push(ServerEvent::UserJoined(Username::from("alice"))));
    }

    #[test]
    fn context_starts_unattached() {
        let (handle, _rx) = ConnectionHandle::channel();
        let ctx = ConnectionContext::new(handle);
        assert_eq!(ctx.state(), &ConnectionState::Unattached);
        assert!(ctx.username().is_none());
        assert!(!ctx.is_disconnected());
    }

    #[test]
    fn bind_then_close_is_terminal() {
        let (handle, _rx) = ConnectionHandle::channel();
        let mut ctx = ConnectionContext::new(handle);
        ctx.bind(Username::from("alice"));
        assert_eq!(ctx.username(), Some(&Username::from("alice")));
        ctx.close();
        assert!(ctx.is_disconnected());
        assert!(ctx.username().is_none());
    }
}
