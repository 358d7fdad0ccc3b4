//! Encrypted message envelope

use serde::{Deserialize, Serialize};

use crate::types::{Timestamp, Username};

/// A single encrypted message in flight or at rest in a mailbox
///
/// The payload and the per-message key are both ciphertext produced by the
/// sender for the recipient; the relay never inspects either. Envelopes are
/// immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Username of the sender
    pub sender: Username,
    /// Ciphertext of the message body
    pub encrypted_message: String,
    /// Message key, encrypted for the recipient
    pub encrypted_key: String,
    /// Server-assigned creation instant
    pub timestamp: Timestamp,
}

impl Envelope {
    /// Create a new envelope stamped with the given instant
    pub fn new(
        sender: Username,
        encrypted_message: impl Into<String>,
        encrypted_key: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            sender,
            encrypted_message: encrypted_message.into(),
            encrypted_key: encrypted_key.into(),
            timestamp,
        }
    }
}
