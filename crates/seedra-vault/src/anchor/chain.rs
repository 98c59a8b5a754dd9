//! Anchor chain: append-only, hash-folded event log for one subject.
//!
//! The root after N events is a strict left fold of the subject id and
//! the N event hashes in submission order. Any reordering, insertion,
//! deletion, or edit of a past event changes every later root.

use std::sync::Arc;

use crate::error::{Result, VaultError};
use crate::time::{micros_to_rfc3339, Clock};

use super::digest::{self, HashMode};
use super::event::AnchorEvent;
use super::snapshot::AnchorSnapshot;
use super::verify::verify_snapshot;

/// Rolling tamper-evident record of a subject's events.
pub struct AnchorChain {
    subject_id: String,
    events: Vec<AnchorEvent>,
    root: String,
    mode: HashMode,
    clock: Arc<dyn Clock>,
}

impl AnchorChain {
    /// Start a chain for `subject_id` using the default hash mode.
    ///
    /// Two chains started for the same subject begin with the same root.
    pub fn new(subject_id: &str, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::with_mode(subject_id, HashMode::default(), clock)
    }

    /// Start a chain with an explicit hash mode.
    pub fn with_mode(subject_id: &str, mode: HashMode, clock: Arc<dyn Clock>) -> Result<Self> {
        if subject_id.is_empty() {
            return Err(VaultError::InvalidInput("subject id must not be empty".into()));
        }
        Ok(Self {
            subject_id: subject_id.to_string(),
            events: Vec::new(),
            root: digest::genesis_root(subject_id),
            mode,
            clock,
        })
    }

    /// Rebuild a chain from a snapshot so it can keep growing.
    ///
    /// # Errors
    ///
    /// `VaultError::TamperDetected` if the snapshot does not replay to its
    /// own root, `VaultError::InvalidInput` if its subject id is empty.
    pub fn from_snapshot(snapshot: AnchorSnapshot, clock: Arc<dyn Clock>) -> Result<Self> {
        if snapshot.subject_id.is_empty() {
            return Err(VaultError::InvalidInput("subject id must not be empty".into()));
        }
        let verification = verify_snapshot(&snapshot);
        if !verification.is_valid {
            return Err(VaultError::TamperDetected(format!(
                "snapshot for '{}' does not replay to root {}",
                snapshot.subject_id, snapshot.root
            )));
        }
        Ok(Self {
            subject_id: snapshot.subject_id,
            events: snapshot.events,
            root: snapshot.root,
            mode: snapshot.hash_mode,
            clock,
        })
    }

    /// Record an event and fold it into the root.
    ///
    /// # Errors
    ///
    /// `VaultError::InvalidInput` if `event_type` is empty.
    pub fn append_event(&mut self, event_type: &str) -> Result<&AnchorEvent> {
        if event_type.is_empty() {
            return Err(VaultError::InvalidInput("event type must not be empty".into()));
        }

        let timestamp = micros_to_rfc3339(self.clock.now_micros());
        let sequence = self.events.len() as u64;
        let event = AnchorEvent::seal(event_type, timestamp, sequence, self.mode);

        self.root = digest::fold_root(&self.root, &event.event_hash);
        self.events.push(event);

        let last = self.events.len() - 1;
        Ok(&self.events[last])
    }

    /// Immutable export of the current state.
    pub fn snapshot(&self) -> AnchorSnapshot {
        AnchorSnapshot {
            subject_id: self.subject_id.clone(),
            root: self.root.clone(),
            hash_mode: self.mode,
            events: self.events.clone(),
        }
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Current root digest (hex).
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn events(&self) -> &[AnchorEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn hash_mode(&self) -> HashMode {
        self.mode
    }
}

impl std::fmt::Debug for AnchorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnchorChain")
            .field("subject_id", &self.subject_id)
            .field("root", &self.root)
            .field("events", &self.events.len())
            .field("mode", &self.mode)
            .finish()
    }
}
