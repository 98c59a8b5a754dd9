//! Vault session: one subject's unlock flow, end to end.
//!
//! A session owns the subject's [`UnlockController`], [`AnchorChain`], and
//! [`EncryptedVault`]. Every proof and unlock attempt is anchored, and each
//! attempt ends with the chain snapshot being published. A denied attempt
//! always anchors `guardian_fallback`, but only a consent rejection can be
//! overridden by the guardian quorum. Missing tiers keep the vault locked
//! until the proofs are resubmitted.
//!
//! Anchored event types:
//!
//! | event                    | when                                   |
//! |--------------------------|----------------------------------------|
//! | `proof_verified:{tier}`  | a proof passed                         |
//! | `proof_rejected:{tier}`  | a proof did not pass                   |
//! | `unlock_attempted`       | before the controller is asked         |
//! | `vault_unlocked`         | the controller granted the unlock      |
//! | `guardian_fallback`      | the controller denied the unlock       |
//! | `guardian_override`      | guardians overrode a consent rejection |

use std::sync::{Arc, Mutex};

use crate::anchor::{AnchorChain, AnchorSnapshot, HashMode};
use crate::config::VaultConfig;
use crate::error::{Result, VaultError};
use crate::gate::{
    ConsentAuthority, ConsentToken, DenialReason, TierGate, UnlockController, UnlockOutcome,
    Verifiable,
};
use crate::guardian::{override_challenge, GuardianApproval, OverrideAuthority};
use crate::publish::{AnchorMetadata, AnchorPublisher, ContentAddress, MemoryPublisher};
use crate::time::{micros_to_rfc3339, system_clock, Clock};
use crate::vault::EncryptedVault;

pub const EVENT_UNLOCK_ATTEMPTED: &str = "unlock_attempted";
pub const EVENT_VAULT_UNLOCKED: &str = "vault_unlocked";
pub const EVENT_GUARDIAN_FALLBACK: &str = "guardian_fallback";
pub const EVENT_GUARDIAN_OVERRIDE: &str = "guardian_override";

/// Action name guardians approve when overriding a denial.
pub const OVERRIDE_ACTION: &str = "guardian_override";

/// Structured notifications emitted while a session runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    ProofAccepted { tier: String },
    ProofRejected { tier: String },
    UnlockGranted,
    UnlockDenied { reason: DenialReason },
    OverrideDecided { accepted: bool },
    AnchorPublished { address: ContentAddress, root: String },
}

/// Receives [`FlowEvent`]s. Owned by whoever drives the session.
pub trait FlowObserver: Send + Sync {
    fn notify(&self, event: &FlowEvent);
}

/// Writes flow events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl FlowObserver for LogObserver {
    fn notify(&self, event: &FlowEvent) {
        match event {
            FlowEvent::ProofAccepted { tier } => log::info!("proof accepted for tier {tier}"),
            FlowEvent::ProofRejected { tier } => log::warn!("proof rejected for tier {tier}"),
            FlowEvent::UnlockGranted => log::info!("vault unlocked"),
            FlowEvent::UnlockDenied { reason } => log::warn!("unlock denied: {reason}"),
            FlowEvent::OverrideDecided { accepted } => {
                log::info!("guardian override accepted: {accepted}")
            }
            FlowEvent::AnchorPublished { address, root } => {
                log::info!("anchor published at {address} (root {root})")
            }
        }
    }
}

/// Keeps every flow event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<FlowEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<FlowEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl FlowObserver for RecordingObserver {
    fn notify(&self, event: &FlowEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

impl<T: FlowObserver + ?Sized> FlowObserver for Arc<T> {
    fn notify(&self, event: &FlowEvent) {
        (**self).notify(event)
    }
}

/// What one unlock attempt produced.
#[derive(Debug, Clone)]
pub struct FlowReport {
    pub outcome: UnlockOutcome,
    /// `None` when granted outright, denied for missing tiers, or no
    /// override authority is configured.
    pub override_accepted: Option<bool>,
    /// Whether the vault may now be read in this session.
    pub vault_open: bool,
    pub address: ContentAddress,
    pub metadata: AnchorMetadata,
}

/// Builder for [`VaultSession`].
pub struct SessionBuilder<A> {
    subject_id: String,
    authority: A,
    tiers: Vec<String>,
    hash_mode: HashMode,
    clock: Arc<dyn Clock>,
    vault: Option<EncryptedVault>,
    guardian: Option<Box<dyn OverrideAuthority>>,
    publisher: Box<dyn AnchorPublisher>,
    observer: Box<dyn FlowObserver>,
    resume: Option<AnchorSnapshot>,
}

impl<A: ConsentAuthority> SessionBuilder<A> {
    fn new(subject_id: impl Into<String>, authority: A) -> Self {
        let defaults = VaultConfig::default();
        Self {
            subject_id: subject_id.into(),
            authority,
            tiers: defaults.tiers,
            hash_mode: defaults.hash_mode,
            clock: system_clock(),
            vault: None,
            guardian: None,
            publisher: Box::new(MemoryPublisher::new()),
            observer: Box::new(LogObserver),
            resume: None,
        }
    }

    /// Apply tier names and hash mode from a config.
    pub fn config(mut self, config: &VaultConfig) -> Self {
        self.tiers = config.tiers.clone();
        self.hash_mode = config.hash_mode;
        self
    }

    pub fn tiers<I, S>(mut self, tiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tiers = tiers.into_iter().map(Into::into).collect();
        self
    }

    pub fn hash_mode(mut self, mode: HashMode) -> Self {
        self.hash_mode = mode;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn vault(mut self, vault: EncryptedVault) -> Self {
        self.vault = Some(vault);
        self
    }

    pub fn guardian(mut self, guardian: impl OverrideAuthority + 'static) -> Self {
        self.guardian = Some(Box::new(guardian));
        self
    }

    pub fn publisher(mut self, publisher: impl AnchorPublisher + 'static) -> Self {
        self.publisher = Box::new(publisher);
        self
    }

    pub fn observer(mut self, observer: impl FlowObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Continue an existing chain instead of starting a new one.
    pub fn resume(mut self, snapshot: AnchorSnapshot) -> Self {
        self.resume = Some(snapshot);
        self
    }

    /// # Errors
    ///
    /// `VaultError::Configuration` for a bad tier list,
    /// `VaultError::InvalidInput` for an empty subject id,
    /// `VaultError::TamperDetected` if the resumed snapshot does not verify
    /// or belongs to another subject.
    pub fn build(self) -> Result<VaultSession<A>> {
        let gate = TierGate::declare(self.tiers, self.clock.clone())?;

        let chain = match self.resume {
            Some(snapshot) => {
                if snapshot.subject_id != self.subject_id {
                    return Err(VaultError::TamperDetected(format!(
                        "snapshot belongs to '{}', not '{}'",
                        snapshot.subject_id, self.subject_id
                    )));
                }
                AnchorChain::from_snapshot(snapshot, self.clock.clone())?
            }
            None => AnchorChain::with_mode(&self.subject_id, self.hash_mode, self.clock.clone())?,
        };

        Ok(VaultSession {
            controller: UnlockController::new(gate, self.authority),
            chain,
            vault: self.vault.unwrap_or_default(),
            guardian: self.guardian,
            publisher: self.publisher,
            observer: self.observer,
            clock: self.clock,
            unlocked: false,
        })
    }
}

/// One subject's gate, chain, and vault under a single owner.
pub struct VaultSession<A> {
    controller: UnlockController<A>,
    chain: AnchorChain,
    vault: EncryptedVault,
    guardian: Option<Box<dyn OverrideAuthority>>,
    publisher: Box<dyn AnchorPublisher>,
    observer: Box<dyn FlowObserver>,
    clock: Arc<dyn Clock>,
    unlocked: bool,
}

impl<A: ConsentAuthority> VaultSession<A> {
    pub fn builder(subject_id: impl Into<String>, authority: A) -> SessionBuilder<A> {
        SessionBuilder::new(subject_id, authority)
    }

    /// Submit a proof and anchor the result.
    ///
    /// Unknown tiers and prover faults propagate without anchoring anything.
    pub fn submit_proof(&mut self, tier: &str, proof: &dyn Verifiable) -> Result<bool> {
        let accepted = self.controller.submit_proof(tier, proof)?;
        if accepted {
            self.chain.append_event(&format!("proof_verified:{tier}"))?;
            self.observer.notify(&FlowEvent::ProofAccepted {
                tier: tier.to_string(),
            });
        } else {
            self.chain.append_event(&format!("proof_rejected:{tier}"))?;
            self.observer.notify(&FlowEvent::ProofRejected {
                tier: tier.to_string(),
            });
        }
        Ok(accepted)
    }

    /// The text guardians must sign to override a denial of the next attempt.
    ///
    /// Bound to the current root, so it changes with every anchored event.
    pub fn override_challenge(&self) -> String {
        override_challenge(self.chain.subject_id(), OVERRIDE_ACTION, self.chain.root())
    }

    /// Request an unlock, run the fallback on denial, and publish the chain.
    ///
    /// `approvals` are only consulted if consent was rejected and a guardian
    /// authority is configured. They must be signed over
    /// [`override_challenge`](Self::override_challenge) as it read before
    /// this call.
    ///
    /// # Errors
    ///
    /// Consent-authority and override-authority faults propagate; the
    /// `unlock_attempted` event stays anchored in that case.
    pub fn attempt_unlock(
        &mut self,
        token: &ConsentToken,
        approvals: &[GuardianApproval],
    ) -> Result<FlowReport> {
        let challenge = self.override_challenge();
        self.chain.append_event(EVENT_UNLOCK_ATTEMPTED)?;

        let outcome = self.controller.request_unlock(token)?;
        let override_accepted = match outcome {
            UnlockOutcome::Granted => {
                self.unlocked = true;
                self.chain.append_event(EVENT_VAULT_UNLOCKED)?;
                self.observer.notify(&FlowEvent::UnlockGranted);
                None
            }
            UnlockOutcome::Denied(reason) => {
                self.observer.notify(&FlowEvent::UnlockDenied { reason });
                self.vault.store_entry(&format!(
                    "fallback trigger: {reason} at {}",
                    micros_to_rfc3339(self.clock.now_micros())
                ))?;
                self.run_fallback(reason, &challenge, approvals)?
            }
        };

        let snapshot = self.chain.snapshot();
        let address = self.publisher.publish(&snapshot)?;
        let metadata = AnchorMetadata::new(address.clone(), &snapshot, self.clock.as_ref());
        self.observer.notify(&FlowEvent::AnchorPublished {
            address: address.clone(),
            root: snapshot.root,
        });

        Ok(FlowReport {
            outcome,
            override_accepted,
            vault_open: self.unlocked,
            address,
            metadata,
        })
    }

    /// Anchor the fallback and, after a consent rejection only, ask the
    /// override authority. Missing tiers are never overridden.
    fn run_fallback(
        &mut self,
        reason: DenialReason,
        challenge: &str,
        approvals: &[GuardianApproval],
    ) -> Result<Option<bool>> {
        let decision = match (&self.guardian, reason) {
            (Some(guardian), DenialReason::ConsentRejected) => {
                Some(guardian.authorize(challenge, approvals)?)
            }
            _ => None,
        };

        self.chain.append_event(EVENT_GUARDIAN_FALLBACK)?;
        if let Some(accepted) = decision {
            self.observer.notify(&FlowEvent::OverrideDecided { accepted });
            if accepted {
                self.unlocked = true;
                self.chain.append_event(EVENT_GUARDIAN_OVERRIDE)?;
            }
        }
        Ok(decision)
    }

    /// Seal an entry into the vault. Writing never requires an unlock.
    pub fn store_entry(&mut self, plaintext: &str) -> Result<()> {
        self.vault.store_entry(plaintext)?;
        Ok(())
    }

    /// Decrypt the vault's entries.
    ///
    /// # Errors
    ///
    /// `VaultError::VaultLocked` unless an unlock was granted (or overridden)
    /// in this session.
    pub fn open_vault(&self) -> Result<Vec<String>> {
        if !self.unlocked {
            return Err(VaultError::VaultLocked);
        }
        self.vault.entries()
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn subject_id(&self) -> &str {
        self.chain.subject_id()
    }

    pub fn gate(&self) -> &TierGate {
        self.controller.gate()
    }

    pub fn chain(&self) -> &AnchorChain {
        &self.chain
    }

    pub fn snapshot(&self) -> AnchorSnapshot {
        self.chain.snapshot()
    }
}
