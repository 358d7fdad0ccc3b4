//! Wire-level protocol types for the CipherLink E2E messaging relay
//!
//! This crate defines everything that crosses the wire between a client and
//! the relay: identifier newtypes, the encrypted message envelope, and the
//! tagged event records of the routing/presence protocol. The relay treats
//! public keys and message payloads as opaque blobs; nothing in this crate
//! parses or validates ciphertext.

pub mod envelope;
pub mod error;
pub mod event;
pub mod types;

pub use envelope::Envelope;
pub use error::{Result, WireError};
pub use event::{ClientEvent, ServerEvent};
pub use types::{ConnectionId, PublicKey, Timestamp, Username};
