//! Relay core for CipherLink end-to-end-encrypted messaging
//!
//! The relay never sees plaintext: clients exchange public keys through it,
//! encrypt client-side, and submit opaque envelopes. This crate implements
//! the server-side core behind any message-oriented transport:
//!
//! - [`registry::SessionRegistry`] — username to live-connection mapping
//!   with published public keys and presence
//! - [`mailbox::MailboxStore`] — per-recipient FIFO queues of envelopes
//!   awaiting fetch
//! - [`router::Router`] — the event protocol tying registry and mailboxes
//!   together: registration, key discovery, message submission, delivery,
//!   and disconnect notification
//! - [`connection`] — per-connection handles and the lifecycle state machine
//!
//! State lives for the process lifetime only; restarts reset everything.

pub mod config;
pub mod connection;
pub mod error;
pub mod mailbox;
pub mod registry;
pub mod router;

pub use config::{DrainMode, RelayConfig};
pub use connection::{ConnectionContext, ConnectionHandle, ConnectionState};
pub use error::{RelayError, Result};
pub use mailbox::{MailboxStats, MailboxStore};
pub use registry::{Session, SessionRegistry};
pub use router::Router;
