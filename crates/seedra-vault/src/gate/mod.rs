//! Tiered trust gate: proofs per tier, then consent.
//!
//! The gate module provides:
//! - Capability traits for external provers and consent authorities
//! - Per-tier verification state with timestamps
//! - The unlock controller that enforces "all tiers, then consent"

pub mod capability;
pub mod tier;
pub mod unlock;

pub use capability::{AllowListAuthority, ConsentAuthority, ConsentToken, StaticProof, Verifiable};
pub use tier::{Tier, TierGate};
pub use unlock::{DenialReason, UnlockController, UnlockOutcome};
