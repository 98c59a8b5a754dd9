//! Tier gate: which proof tiers have been satisfied for one subject.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};
use crate::time::Clock;

use super::capability::Verifiable;

/// State of one declared tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub name: String,
    pub verified: bool,
    /// Microseconds since the Unix epoch of the latest successful proof.
    pub last_verified_at: Option<u64>,
}

impl Tier {
    fn new(name: String) -> Self {
        Self {
            name,
            verified: false,
            last_verified_at: None,
        }
    }
}

/// Per-subject record of verified tiers.
///
/// Tiers are declared once, start unverified, and flip to verified the
/// first time a proof for them passes. Nothing un-verifies a tier.
pub struct TierGate {
    tiers: Vec<Tier>,
    clock: Arc<dyn Clock>,
}

impl TierGate {
    /// Declare the tiers this gate requires.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Configuration` if no tiers are given, a name is
    /// empty, or a name appears twice.
    pub fn declare<I, S>(tier_names: I, clock: Arc<dyn Clock>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut tiers = Vec::new();

        for name in tier_names {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(VaultError::Configuration("tier name must not be empty".into()));
            }
            if !seen.insert(name.clone()) {
                return Err(VaultError::Configuration(format!(
                    "duplicate tier name: {name}"
                )));
            }
            tiers.push(Tier::new(name));
        }

        if tiers.is_empty() {
            return Err(VaultError::Configuration(
                "at least one tier must be declared".into(),
            ));
        }

        Ok(Self { tiers, clock })
    }

    /// Submit a proof for a tier.
    ///
    /// Returns `Ok(true)` and marks the tier verified if the proof checks
    /// out, `Ok(false)` with no state change otherwise. Resubmitting for a
    /// verified tier refreshes its timestamp.
    ///
    /// # Errors
    ///
    /// `VaultError::UnknownTier` for an undeclared tier (the proof is not
    /// consulted). Faults from the proof itself propagate unchanged.
    pub fn submit_proof(&mut self, tier_name: &str, proof: &dyn Verifiable) -> Result<bool> {
        let index = self
            .tiers
            .iter()
            .position(|t| t.name == tier_name)
            .ok_or_else(|| VaultError::UnknownTier(tier_name.to_string()))?;

        if !proof.verify()? {
            return Ok(false);
        }

        let now = self.clock.now_micros();
        let tier = &mut self.tiers[index];
        tier.verified = true;
        tier.last_verified_at = Some(now);
        Ok(true)
    }

    /// True iff every declared tier is verified.
    pub fn all_satisfied(&self) -> bool {
        self.tiers.iter().all(|t| t.verified)
    }

    /// Look up a tier by name.
    pub fn tier(&self, name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.name == name)
    }

    /// All tiers in declaration order.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Names of tiers still waiting for a passing proof.
    pub fn pending(&self) -> Vec<&str> {
        self.tiers
            .iter()
            .filter(|t| !t.verified)
            .map(|t| t.name.as_str())
            .collect()
    }
}

impl std::fmt::Debug for TierGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TierGate")
            .field("tiers", &self.tiers)
            .finish_non_exhaustive()
    }
}
