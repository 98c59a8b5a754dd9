//! Capabilities the gate consumes from outside collaborators.
//!
//! The gate never inspects proof contents or consent tokens. It only asks
//! the collaborator for a yes/no answer. A collaborator that cannot answer
//! reports `VaultError::AuthorityUnavailable` instead of returning `false`,
//! so "denied" and "could not check" stay distinct.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Something that can be checked for validity, such as a zero-knowledge
/// predicate evaluated by an external prover.
pub trait Verifiable {
    /// Check the proof.
    fn verify(&self) -> Result<bool>;
}

impl<T: Verifiable + ?Sized> Verifiable for &T {
    fn verify(&self) -> Result<bool> {
        (**self).verify()
    }
}

impl<T: Verifiable + ?Sized> Verifiable for Box<T> {
    fn verify(&self) -> Result<bool> {
        (**self).verify()
    }
}

/// An opaque consent token. Treated as an identifier, never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsentToken(pub String);

impl ConsentToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Display for ConsentToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External authority that validates a consent token against policy.
pub trait ConsentAuthority {
    fn validate_consent(&self, token: &ConsentToken) -> Result<bool>;
}

impl<T: ConsentAuthority + ?Sized> ConsentAuthority for &T {
    fn validate_consent(&self, token: &ConsentToken) -> Result<bool> {
        (**self).validate_consent(token)
    }
}

impl<T: ConsentAuthority + ?Sized> ConsentAuthority for Box<T> {
    fn validate_consent(&self, token: &ConsentToken) -> Result<bool> {
        (**self).validate_consent(token)
    }
}

impl<T: ConsentAuthority + ?Sized> ConsentAuthority for std::sync::Arc<T> {
    fn validate_consent(&self, token: &ConsentToken) -> Result<bool> {
        (**self).validate_consent(token)
    }
}

/// A proof with a fixed answer.
///
/// Stands in for a real prover in demos and tests. It carries no security
/// property of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticProof(pub bool);

impl Verifiable for StaticProof {
    fn verify(&self) -> Result<bool> {
        Ok(self.0)
    }
}

/// Consent authority that accepts a fixed set of tokens.
#[derive(Debug, Clone, Default)]
pub struct AllowListAuthority {
    accepted: std::collections::HashSet<ConsentToken>,
}

impl AllowListAuthority {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepted: tokens
                .into_iter()
                .map(|t| ConsentToken(t.into()))
                .collect(),
        }
    }

    /// Accept one more token.
    pub fn allow(&mut self, token: ConsentToken) {
        self.accepted.insert(token);
    }
}

impl ConsentAuthority for AllowListAuthority {
    fn validate_consent(&self, token: &ConsentToken) -> Result<bool> {
        Ok(self.accepted.contains(token))
    }
}
