//! Guardian override: a threshold of signed approvals after a denial.
//!
//! When an unlock is denied, the orchestration may ask an
//! [`OverrideAuthority`] whether enough guardians approved a fallback
//! action. [`GuardianQuorum`] answers with Ed25519 signatures over a
//! challenge bound to the subject, the action, and the current anchor root,
//! so an approval cannot be replayed against a later chain state.

use std::collections::{BTreeMap, HashSet};

use base64::Engine as _;
use ed25519_dalek::{SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::crypto::random::random_bytes;
use crate::crypto::signing;
use crate::error::{Result, VaultError};

/// Message a guardian signs to approve `action` for `subject_id` at `root`.
pub fn override_challenge(subject_id: &str, action: &str, root: &str) -> String {
    format!("guardian-override:{subject_id}:{action}:{root}")
}

/// A guardian's signed approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianApproval {
    pub guardian_id: String,
    /// Base64 Ed25519 signature over the override challenge.
    pub signature: String,
}

/// Decides whether a fallback action may proceed.
pub trait OverrideAuthority: Send + Sync {
    /// `challenge` is the text approvals must be signed over.
    fn authorize(&self, challenge: &str, approvals: &[GuardianApproval]) -> Result<bool>;
}

/// A guardian's signing key.
///
/// `SigningKey` zeroizes its own secret bytes when dropped.
pub struct GuardianKey {
    guardian_id: String,
    signing_key: SigningKey,
}

impl GuardianKey {
    /// Generate a fresh key for `guardian_id`.
    pub fn generate(guardian_id: impl Into<String>) -> Self {
        let mut seed: [u8; 32] = random_bytes();
        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();
        Self {
            guardian_id: guardian_id.into(),
            signing_key,
        }
    }

    pub fn guardian_id(&self) -> &str {
        &self.guardian_id
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Public key as base64, for quorum configuration.
    pub fn public_key_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.verifying_key().to_bytes())
    }

    /// Sign an override challenge.
    pub fn approve(&self, challenge: &str) -> GuardianApproval {
        GuardianApproval {
            guardian_id: self.guardian_id.clone(),
            signature: signing::sign_to_base64(&self.signing_key, challenge.as_bytes()),
        }
    }
}

impl std::fmt::Debug for GuardianKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardianKey")
            .field("guardian_id", &self.guardian_id)
            .finish_non_exhaustive()
    }
}

/// Threshold-of-N Ed25519 quorum.
///
/// Only distinct, registered guardians with valid signatures count.
/// Unknown guardians and bad signatures are ignored rather than failing
/// the whole request.
#[derive(Debug, Clone)]
pub struct GuardianQuorum {
    threshold: usize,
    guardians: BTreeMap<String, VerifyingKey>,
}

impl GuardianQuorum {
    /// # Errors
    ///
    /// `VaultError::Configuration` if `threshold` is zero or exceeds the
    /// number of guardians, or a guardian id repeats.
    pub fn new<I>(threshold: usize, guardians: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, VerifyingKey)>,
    {
        let mut map = BTreeMap::new();
        for (id, key) in guardians {
            if map.insert(id.clone(), key).is_some() {
                return Err(VaultError::Configuration(format!(
                    "duplicate guardian id: {id}"
                )));
            }
        }
        if threshold == 0 || threshold > map.len() {
            return Err(VaultError::Configuration(format!(
                "quorum threshold {threshold} must be between 1 and {}",
                map.len()
            )));
        }
        Ok(Self {
            threshold,
            guardians: map,
        })
    }

    /// Build a quorum from `(id, base64 public key)` pairs.
    pub fn from_base64_keys<I>(threshold: usize, guardians: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let keys = guardians
            .into_iter()
            .map(|(id, key)| Ok((id, signing::verifying_key_from_base64(&key)?)))
            .collect::<Result<Vec<_>>>()?;
        Self::new(threshold, keys)
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn guardian_count(&self) -> usize {
        self.guardians.len()
    }

    /// Number of distinct guardians whose approval verifies.
    pub fn count_valid(&self, challenge: &str, approvals: &[GuardianApproval]) -> usize {
        let mut counted = HashSet::new();
        for approval in approvals {
            let Some(key) = self.guardians.get(&approval.guardian_id) else {
                continue;
            };
            if counted.contains(approval.guardian_id.as_str()) {
                continue;
            }
            if signing::verify_from_base64(key, challenge.as_bytes(), &approval.signature).is_ok()
            {
                counted.insert(approval.guardian_id.as_str());
            }
        }
        counted.len()
    }
}

impl OverrideAuthority for GuardianQuorum {
    fn authorize(&self, challenge: &str, approvals: &[GuardianApproval]) -> Result<bool> {
        Ok(self.count_valid(challenge, approvals) >= self.threshold)
    }
}
