//! Anchor events: the immutable records folded into a chain.

use serde::{Deserialize, Serialize};

use super::digest::{self, HashMode};

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorEvent {
    /// Zero-based position in the chain.
    pub sequence: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    /// RFC 3339 UTC, microsecond precision.
    pub timestamp: String,
    #[serde(rename = "hash")]
    pub event_hash: String,
}

impl AnchorEvent {
    pub(crate) fn seal(event_type: &str, timestamp: String, sequence: u64, mode: HashMode) -> Self {
        let event_hash = digest::event_hash(event_type, &timestamp, sequence, mode);
        Self {
            sequence,
            event_type: event_type.to_string(),
            timestamp,
            event_hash,
        }
    }

    /// Hash of the recorded fields, ignoring the stored `event_hash`.
    pub fn recompute_hash(&self, mode: HashMode) -> String {
        digest::event_hash(&self.event_type, &self.timestamp, self.sequence, mode)
    }

    /// Does the stored hash match the recorded fields?
    pub fn is_intact(&self, mode: HashMode) -> bool {
        self.recompute_hash(mode) == self.event_hash
    }
}
