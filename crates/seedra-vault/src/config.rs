//! Vault configuration, loadable from a JSON file.
//!
//! ```json
//! {
//!     "tiers": ["biometric", "device", "consent"],
//!     "hash_mode": "timestamped",
//!     "guardian_threshold": 3,
//!     "consent_tokens": ["tok-..."]
//! }
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::anchor::HashMode;
use crate::error::{Result, VaultError};

/// Tiers required when none are configured.
pub const DEFAULT_TIERS: [&str; 3] = ["biometric", "device", "consent"];

/// Guardian approvals required for an override when not configured.
pub const DEFAULT_GUARDIAN_THRESHOLD: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Tier names in the order they are declared.
    pub tiers: Vec<String>,
    pub hash_mode: HashMode,
    pub guardian_threshold: usize,
    /// Tokens accepted by the allow-list consent authority.
    pub consent_tokens: Vec<String>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            tiers: DEFAULT_TIERS.iter().map(|t| t.to_string()).collect(),
            hash_mode: HashMode::default(),
            guardian_threshold: DEFAULT_GUARDIAN_THRESHOLD,
            consent_tokens: Vec::new(),
        }
    }
}

impl VaultConfig {
    /// Read and validate a config file.
    ///
    /// # Errors
    ///
    /// `VaultError::Io` if the file cannot be read,
    /// `VaultError::Configuration` if it does not parse or validate.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes).map_err(|e| {
            VaultError::Configuration(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| VaultError::SerializationError(e.to_string()))?;
        std::fs::write(path, json.as_bytes())?;
        Ok(())
    }

    /// Check the constraints that do not need a live gate.
    pub fn validate(&self) -> Result<()> {
        if self.tiers.is_empty() {
            return Err(VaultError::Configuration("no tiers configured".into()));
        }
        if self.guardian_threshold == 0 {
            return Err(VaultError::Configuration(
                "guardian_threshold must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
