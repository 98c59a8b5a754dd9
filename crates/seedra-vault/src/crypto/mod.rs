//! Cryptographic primitives used by the vault adapters.
//!
//! - ChaCha20-Poly1305 sealing for vault entries
//! - Argon2id passphrase-based key derivation
//! - Ed25519 signatures for guardian approvals
//! - OS-backed random bytes

pub mod encryption;
pub mod random;
pub mod signing;
