//! Relay configuration

use serde::{Deserialize, Serialize};

/// What `get_messages` does to the stored mailbox
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrainMode {
    /// Return a copy and leave the queue in place; a re-read sees the same
    /// envelopes again. The default, at the cost of unbounded growth.
    #[default]
    Snapshot,
    /// Return the queue and clear it; each envelope is fetched at most once.
    Consume,
}

/// Relay core configuration
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Mailbox read behavior
    pub drain_mode: DrainMode,
}

impl RelayConfig {
    /// Configuration with consuming mailbox reads
    pub fn consuming() -> Self {
        Self {
            drain_mode: DrainMode::Consume,
        }
    }
}
