//! Anchor chain: tamper-evident, hash-folded event history.

pub mod chain;
pub mod digest;
pub mod event;
pub mod snapshot;
pub mod verify;

pub use chain::AnchorChain;
pub use digest::HashMode;
pub use event::AnchorEvent;
pub use snapshot::AnchorSnapshot;
pub use verify::{replay_root, verify_snapshot, SnapshotVerification};
