//! Encrypted entry vault: the resource an unlock opens.
//!
//! Entries are sealed with ChaCha20-Poly1305 under a 32-byte key that is
//! either random or derived from a passphrase. The vault itself applies
//! no access policy; [`crate::session::VaultSession`] only reads it after
//! a granted unlock.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::crypto::encryption::{derive_passphrase_key, open, seal};
use crate::crypto::random::random_bytes;
use crate::error::{Result, VaultError};

/// One sealed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedEntry {
    /// Base64 nonce.
    pub nonce: String,
    /// Base64 ciphertext including the authentication tag.
    pub ciphertext: String,
}

impl SealedEntry {
    fn decode(&self) -> Result<([u8; 12], Vec<u8>)> {
        let b64 = &base64::engine::general_purpose::STANDARD;
        let nonce: [u8; 12] = b64
            .decode(&self.nonce)
            .map_err(|e| VaultError::DecryptionFailed(format!("nonce: {e}")))?
            .try_into()
            .map_err(|_| VaultError::DecryptionFailed("nonce must be 12 bytes".into()))?;
        let ciphertext = b64
            .decode(&self.ciphertext)
            .map_err(|e| VaultError::DecryptionFailed(format!("ciphertext: {e}")))?;
        Ok((nonce, ciphertext))
    }
}

/// Symmetric-key vault of sealed text entries.
///
/// The key is zeroized on drop.
pub struct EncryptedVault {
    key: [u8; 32],
    entries: Vec<SealedEntry>,
}

impl EncryptedVault {
    /// Create an empty vault with a fresh random key.
    pub fn new() -> Self {
        Self::with_key(random_bytes())
    }

    pub fn with_key(key: [u8; 32]) -> Self {
        Self {
            key,
            entries: Vec::new(),
        }
    }

    /// Create an empty vault keyed from a passphrase (Argon2id).
    pub fn from_passphrase(passphrase: &str, salt: &[u8; 16]) -> Result<Self> {
        Ok(Self::with_key(derive_passphrase_key(passphrase.as_bytes(), salt)?))
    }

    /// Seal and store a new entry.
    pub fn store_entry(&mut self, plaintext: &str) -> Result<&SealedEntry> {
        let (nonce, ciphertext) = seal(&self.key, plaintext.as_bytes())?;
        let b64 = &base64::engine::general_purpose::STANDARD;
        self.entries.push(SealedEntry {
            nonce: b64.encode(nonce),
            ciphertext: b64.encode(ciphertext),
        });
        let last = self.entries.len() - 1;
        Ok(&self.entries[last])
    }

    /// Decrypt one entry. `None` selects the latest.
    ///
    /// Returns `Ok(None)` when the vault is empty or the index is out of range.
    pub fn retrieve_entry(&self, index: Option<usize>) -> Result<Option<String>> {
        let entry = match index {
            Some(i) => self.entries.get(i),
            None => self.entries.last(),
        };
        entry.map(|e| self.decrypt(e)).transpose()
    }

    /// Decrypt every entry in insertion order.
    pub fn entries(&self) -> Result<Vec<String>> {
        self.entries.iter().map(|e| self.decrypt(e)).collect()
    }

    /// Sealed entries without decrypting.
    pub fn sealed_entries(&self) -> &[SealedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export the key as base64.
    pub fn export_key(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.key)
    }

    /// Replace the key with one exported by [`export_key`](Self::export_key).
    ///
    /// Entries sealed under the previous key stay as they are and will only
    /// open again under that key.
    pub fn import_key(&mut self, key_b64: &str) -> Result<()> {
        let mut bytes = base64::engine::general_purpose::STANDARD
            .decode(key_b64)
            .map_err(|e| VaultError::InvalidKey(format!("invalid base64 key: {e}")))?;
        let key: Result<[u8; 32]> = bytes
            .as_slice()
            .try_into()
            .map_err(|_| VaultError::InvalidKey("vault key must be 32 bytes".into()));
        bytes.zeroize();
        let key = key?;
        self.key.zeroize();
        self.key = key;
        Ok(())
    }

    fn decrypt(&self, entry: &SealedEntry) -> Result<String> {
        let (nonce, ciphertext) = entry.decode()?;
        let plaintext = open(&self.key, &nonce, &ciphertext)?;
        String::from_utf8(plaintext)
            .map_err(|e| VaultError::DecryptionFailed(format!("entry is not UTF-8: {e}")))
    }
}

impl Default for EncryptedVault {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EncryptedVault {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl std::fmt::Debug for EncryptedVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedVault")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}
