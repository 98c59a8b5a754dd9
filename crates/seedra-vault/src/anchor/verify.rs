//! Snapshot verification by replay.
//!
//! Verification checks:
//! 1. Sequence numbers match positions (no gaps, no reordering)
//! 2. Each event's stored hash matches its recorded fields
//! 3. The fold from `H(subject_id)` over recomputed hashes reproduces the root

use super::digest::{self, HashMode};
use super::event::AnchorEvent;
use super::snapshot::AnchorSnapshot;

/// Result of verifying a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotVerification {
    /// Do sequence numbers run 0, 1, 2, ... ?
    pub sequence_valid: bool,
    /// Per-event: does the stored hash match the recorded fields?
    pub events_intact: Vec<bool>,
    /// Root recomputed from the subject id and recorded event fields.
    pub computed_root: String,
    /// Does the recomputed root equal the snapshot's root?
    pub root_matches: bool,
    /// Overall validity.
    pub is_valid: bool,
}

impl SnapshotVerification {
    /// Position of the first event whose stored hash is wrong.
    pub fn first_tampered_event(&self) -> Option<usize> {
        self.events_intact.iter().position(|ok| !ok)
    }
}

/// Fold the recorded event fields from the subject's genesis root.
///
/// Event hashes are recomputed rather than trusted, so editing a type or
/// timestamp changes the result even if the stored hash is left alone.
pub fn replay_root(subject_id: &str, events: &[AnchorEvent], mode: HashMode) -> String {
    events
        .iter()
        .fold(digest::genesis_root(subject_id), |root, event| {
            digest::fold_root(&root, &event.recompute_hash(mode))
        })
}

/// Verify a snapshot against its own recorded root.
///
/// Pure: the result depends only on the snapshot, never on the clock.
pub fn verify_snapshot(snapshot: &AnchorSnapshot) -> SnapshotVerification {
    let mode = snapshot.hash_mode;

    let sequence_valid = snapshot
        .events
        .iter()
        .enumerate()
        .all(|(i, e)| e.sequence == i as u64);

    let events_intact: Vec<bool> = snapshot.events.iter().map(|e| e.is_intact(mode)).collect();

    let computed_root = replay_root(&snapshot.subject_id, &snapshot.events, mode);
    let root_matches = computed_root == snapshot.root;

    let is_valid = sequence_valid && root_matches && events_intact.iter().all(|&ok| ok);

    SnapshotVerification {
        sequence_valid,
        events_intact,
        computed_root,
        root_matches,
        is_valid,
    }
}
