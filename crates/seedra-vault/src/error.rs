//! Error types for SEEDRA vaults.
//!
//! All errors are strongly typed and propagated without panicking.
//! Key material is never included in error messages. Unlock denials are
//! not errors; see [`crate::gate::UnlockOutcome`].

/// Vault error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    #[error("Authority unavailable: {0}")]
    AuthorityUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Tamper detected: {0}")]
    TamperDetected(String),

    #[error("Vault is locked")]
    VaultLocked,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Signature verification failed")]
    SignatureInvalid,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, VaultError>;
