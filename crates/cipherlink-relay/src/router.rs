//! Event routing and presence protocol
//!
//! One handler per inbound event, each taking the explicit
//! [`ConnectionContext`] of the originating connection. Protocol errors are
//! answered to the caller as in-band events and never broadcast; an event
//! that is invalid in the connection's current state is logged and dropped.

use tracing::{debug, warn};

use cipherlink_core::{ClientEvent, Envelope, PublicKey, ServerEvent, Timestamp, Username};

use crate::config::RelayConfig;
use crate::connection::ConnectionContext;
use crate::mailbox::MailboxStore;
use crate::registry::SessionRegistry;

/// The relay's protocol engine
///
/// Owns the session registry and the mailbox store; shared across all
/// connection tasks behind an `Arc`.
pub struct Router {
    registry: SessionRegistry,
    mailbox: MailboxStore,
}

impl Router {
    /// Create a router from configuration
    pub fn new(config: RelayConfig) -> Self {
        Self {
            registry: SessionRegistry::new(),
            mailbox: MailboxStore::new(config.drain_mode),
        }
    }

    /// The session registry
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// The mailbox store
    pub fn mailbox(&self) -> &MailboxStore {
        &self.mailbox
    }

    /// Dispatch one inbound event for a connection
    pub fn handle_event(&self, ctx: &mut ConnectionContext, event: ClientEvent) {
        if ctx.is_disconnected() {
            debug!(connection = %ctx.id(), "Event after disconnect dropped");
            return;
        }

        match event {
            ClientEvent::Register {
                username,
                public_key,
            } => self.handle_register(ctx, username, public_key),
            ClientEvent::RequestPublicKey { username } => {
                self.handle_request_public_key(ctx, username)
            }
            ClientEvent::SendMessage {
                recipient,
                encrypted_message,
                encrypted_key,
            } => self.handle_send_message(ctx, recipient, encrypted_message, encrypted_key),
            ClientEvent::GetMessages => self.handle_get_messages(ctx),
        }
    }

    /// Bind a username to the connection and announce the arrival
    fn handle_register(
        &self,
        ctx: &mut ConnectionContext,
        username: Username,
        public_key: PublicKey,
    ) {
        if let Some(bound) = ctx.username() {
            warn!(connection = %ctx.id(), %bound, "Register on already-registered connection ignored");
            return;
        }

        match self
            .registry
            .register(username.clone(), public_key, ctx.handle().clone())
        {
            Ok(online_users) => {
                ctx.bind(username.clone());
                ctx.handle().push(ServerEvent::RegistrationSuccess {
                    username: username.clone(),
                    online_users,
                });
                self.broadcast_except(ctx, ServerEvent::UserJoined(username));
            }
            Err(err) => {
                // Caller only; the connection stays Unattached.
                ctx.handle().push(ServerEvent::RegistrationFailed {
                    message: err.to_string(),
                });
            }
        }
    }

    /// Answer a key discovery request, caller only
    fn handle_request_public_key(&self, ctx: &ConnectionContext, username: Username) {
        if ctx.username().is_none() {
            debug!(connection = %ctx.id(), "Key request from unregistered connection ignored");
            return;
        }

        let event = match self.registry.public_key(&username) {
            Ok(public_key) => ServerEvent::ReceivePublicKey {
                username,
                public_key,
            },
            Err(err) => ServerEvent::PublicKeyError {
                message: err.to_string(),
            },
        };
        ctx.handle().push(event);
    }

    /// Store an envelope and push it live if the recipient is online
    fn handle_send_message(
        &self,
        ctx: &ConnectionContext,
        recipient: Username,
        encrypted_message: String,
        encrypted_key: String,
    ) {
        let Some(sender) = ctx.username() else {
            debug!(connection = %ctx.id(), "Send from unregistered connection ignored");
            return;
        };

        // One timestamp for both the stored and the pushed copy.
        let envelope = Envelope::new(
            sender.clone(),
            encrypted_message,
            encrypted_key,
            Timestamp::now(),
        );

        // Stored unconditionally, even for online recipients.
        self.mailbox.append(&recipient, envelope.clone());

        if let Some(handle) = self.registry.handle_of(&recipient) {
            handle.push(ServerEvent::NewMessage(envelope));
        }
    }

    /// Send the caller its stored mailbox
    fn handle_get_messages(&self, ctx: &ConnectionContext) {
        let Some(username) = ctx.username() else {
            debug!(connection = %ctx.id(), "Mailbox fetch from unregistered connection ignored");
            return;
        };

        let envelopes = self.mailbox.drain(username);
        ctx.handle().push(ServerEvent::LoadMessages(envelopes));
    }

    /// Tear down a connection, announcing the departure if it was registered
    ///
    /// Idempotent: a second call for the same connection is a no-op.
    pub fn disconnect(&self, ctx: &mut ConnectionContext) {
        if ctx.is_disconnected() {
            return;
        }

        if let Some(session) = self.registry.remove(ctx.id()) {
            self.broadcast_except(ctx, ServerEvent::UserLeft(session.username));
        }
        ctx.close();
    }

    /// Push an event to every live connection except the originator
    fn broadcast_except(&self, ctx: &ConnectionContext, event: ServerEvent) {
        // Snapshot taken before iterating; handlers registering concurrently
        // are not part of this broadcast.
        for peer in self.registry.handles_except(ctx.id()) {
            peer.push(event.clone());
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(RelayConfig::default())
    }
}
