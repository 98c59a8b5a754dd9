//! Unlock controller: couples tier completeness with a consent check.
//!
//! The order is fixed: the local tier check runs first, and the consent
//! authority is only consulted once every tier is verified.

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::capability::{ConsentAuthority, ConsentToken, Verifiable};
use super::tier::TierGate;

/// Why an unlock was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DenialReason {
    /// At least one declared tier has no passing proof yet.
    IncompleteTiers,
    /// The consent authority rejected the token.
    ConsentRejected,
}

impl DenialReason {
    /// Return a stable string tag.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::IncompleteTiers => "incomplete_tiers",
            Self::ConsentRejected => "consent_rejected",
        }
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Result of a single unlock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnlockOutcome {
    Granted,
    Denied(DenialReason),
}

impl UnlockOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    /// The denial reason, if any.
    pub fn denial(&self) -> Option<DenialReason> {
        match self {
            Self::Granted => None,
            Self::Denied(reason) => Some(*reason),
        }
    }
}

/// Single entry point for authorizing an unlock.
///
/// Owns its [`TierGate`] exclusively. One call to
/// [`request_unlock`](Self::request_unlock) yields exactly one outcome;
/// retrying is up to the caller.
pub struct UnlockController<A> {
    gate: TierGate,
    authority: A,
}

impl<A: ConsentAuthority> UnlockController<A> {
    pub fn new(gate: TierGate, authority: A) -> Self {
        Self { gate, authority }
    }

    /// Submit a proof for a tier. Same contract as [`TierGate::submit_proof`].
    pub fn submit_proof(&mut self, tier_name: &str, proof: &dyn Verifiable) -> Result<bool> {
        self.gate.submit_proof(tier_name, proof)
    }

    /// Ask for the vault to be unlocked.
    ///
    /// # Errors
    ///
    /// Faults raised by the consent authority propagate unchanged; a
    /// negative answer is `Ok(UnlockOutcome::Denied(ConsentRejected))`.
    pub fn request_unlock(&self, token: &ConsentToken) -> Result<UnlockOutcome> {
        if !self.gate.all_satisfied() {
            return Ok(UnlockOutcome::Denied(DenialReason::IncompleteTiers));
        }

        if self.authority.validate_consent(token)? {
            Ok(UnlockOutcome::Granted)
        } else {
            Ok(UnlockOutcome::Denied(DenialReason::ConsentRejected))
        }
    }

    /// Read-only view of the wrapped gate.
    pub fn gate(&self) -> &TierGate {
        &self.gate
    }

    pub fn authority(&self) -> &A {
        &self.authority
    }
}
