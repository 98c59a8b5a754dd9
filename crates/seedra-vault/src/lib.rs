//! SEEDRA Vault: tiered trust gate and tamper-evident anchor chain.
//!
//! A vault unlocks only after every declared proof tier has been verified
//! and an external consent authority has accepted a token. Each step is
//! folded into a SHA3-256 anchor chain whose root can be published and
//! independently replayed.

pub mod anchor;
pub mod config;
pub mod crypto;
pub mod error;
pub mod gate;
pub mod guardian;
pub mod publish;
pub mod session;
pub mod storage;
pub mod time;
pub mod vault;

// Re-export primary types
pub use anchor::{AnchorChain, AnchorEvent, AnchorSnapshot, HashMode, SnapshotVerification};
pub use config::VaultConfig;
pub use error::{Result, VaultError};
pub use gate::{
    AllowListAuthority, ConsentAuthority, ConsentToken, DenialReason, StaticProof, Tier, TierGate,
    UnlockController, UnlockOutcome, Verifiable,
};
pub use guardian::{GuardianApproval, GuardianKey, GuardianQuorum, OverrideAuthority};
pub use publish::{AnchorMetadata, AnchorPublisher, ContentAddress, DirectoryPublisher};
pub use session::{FlowEvent, FlowObserver, FlowReport, VaultSession};
pub use storage::SnapshotStore;
pub use time::{Clock, ManualClock, SystemClock};
pub use vault::EncryptedVault;
