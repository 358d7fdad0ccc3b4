//! Per-recipient offline mailboxes
//!
//! Every submitted envelope lands here, whether or not the recipient is
//! online at the time; live delivery is an additional push, not a
//! replacement, so an online recipient gets both the push and a stored
//! copy. Queues are created lazily, append in arrival order, and are
//! unbounded.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use cipherlink_core::{Envelope, Username};

use crate::config::DrainMode;

/// Mailbox counters for logging and introspection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MailboxStats {
    /// Recipients with at least one stored envelope
    pub recipients: usize,
    /// Envelopes stored across all recipients
    pub envelopes: usize,
}

/// Process-wide store of per-recipient envelope queues
pub struct MailboxStore {
    queues: RwLock<HashMap<Username, Vec<Envelope>>>,
    drain_mode: DrainMode,
}

impl MailboxStore {
    /// Create an empty store with the given read behavior
    pub fn new(drain_mode: DrainMode) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            drain_mode,
        }
    }

    /// Configured read behavior
    pub fn drain_mode(&self) -> DrainMode {
        self.drain_mode
    }

    /// Append an envelope to a recipient's queue, creating it if absent
    ///
    /// Always succeeds; no size bound is enforced.
    pub fn append(&self, recipient: &Username, envelope: Envelope) {
        let mut queues = self.queues.write();
        let queue = queues.entry(recipient.clone()).or_default();
        queue.push(envelope);
        debug!(%recipient, queued = queue.len(), "Envelope stored");
    }

    /// Read a recipient's queue in arrival order
    ///
    /// Under [`DrainMode::Snapshot`] the queue stays in place; under
    /// [`DrainMode::Consume`] it is removed. Empty for unknown recipients.
    pub fn drain(&self, recipient: &Username) -> Vec<Envelope> {
        match self.drain_mode {
            DrainMode::Snapshot => self
                .queues
                .read()
                .get(recipient)
                .cloned()
                .unwrap_or_default(),
            DrainMode::Consume => self
                .queues
                .write()
                .remove(recipient)
                .unwrap_or_default(),
        }
    }

    /// Whether a recipient has any stored envelopes
    pub fn has(&self, recipient: &Username) -> bool {
        self.queues
            .read()
            .get(recipient)
            .is_some_and(|queue| !queue.is_empty())
    }

    /// Current counters
    pub fn stats(&self) -> MailboxStats {
        let queues = self.queues.read();
        MailboxStats {
            recipients: queues.len(),
            envelopes: queues.values().map(Vec::len).sum(),
        }
    }
}

impl Default for MailboxStore {
    fn default() -> Self {
        Self::new(DrainMode::default())
    }
}
