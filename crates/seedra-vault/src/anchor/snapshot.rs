//! Snapshots: immutable exports of a chain for publication.

use serde::{Deserialize, Serialize};

use super::digest::HashMode;
use super::event::AnchorEvent;
use super::verify::{verify_snapshot, SnapshotVerification};

/// Subject id, root, and the full ordered event log at one point in time.
///
/// This is the payload handed to a publisher. Field names match the
/// published JSON record (`sid`, `root_hash`, `events`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorSnapshot {
    #[serde(rename = "sid")]
    pub subject_id: String,
    #[serde(rename = "root_hash")]
    pub root: String,
    #[serde(default)]
    pub hash_mode: HashMode,
    pub events: Vec<AnchorEvent>,
}

impl AnchorSnapshot {
    /// Replay this snapshot and compare against its recorded root.
    pub fn verify(&self) -> SnapshotVerification {
        verify_snapshot(self)
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::VaultError::SerializationError(e.to_string()))
    }

    /// Parse from JSON. Does not verify.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| crate::VaultError::InvalidFileFormat(format!("anchor snapshot: {e}")))
    }
}
