//! Ed25519 signatures carried as base64 text.

use base64::Engine as _;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::error::{Result, VaultError};

/// Sign a message and return the signature as base64.
pub fn sign_to_base64(signing_key: &SigningKey, message: &[u8]) -> String {
    let sig = signing_key.sign(message);
    base64::engine::general_purpose::STANDARD.encode(sig.to_bytes())
}

/// Verify a base64-encoded signature.
pub fn verify_from_base64(
    verifying_key: &VerifyingKey,
    message: &[u8],
    signature_b64: &str,
) -> Result<()> {
    let sig_bytes = base64::engine::general_purpose::STANDARD
        .decode(signature_b64)
        .map_err(|e| VaultError::InvalidKey(format!("invalid base64 signature: {e}")))?;

    let sig_array: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| VaultError::InvalidKey("signature must be 64 bytes".into()))?;

    verifying_key
        .verify(message, &Signature::from_bytes(&sig_array))
        .map_err(|_| VaultError::SignatureInvalid)
}

/// Decode a base64 Ed25519 public key.
pub fn verifying_key_from_base64(key_b64: &str) -> Result<VerifyingKey> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(key_b64)
        .map_err(|e| VaultError::InvalidKey(format!("invalid base64 key: {e}")))?;
    let array: [u8; 32] = bytes
        .try_into()
        .map_err(|_| VaultError::InvalidKey("verifying key must be 32 bytes".into()))?;
    VerifyingKey::from_bytes(&array)
        .map_err(|e| VaultError::InvalidKey(format!("invalid verifying key: {e}")))
}
