//! Integration test: full end-to-end workflow.
//!
//! Tests the complete lifecycle:
//! 1. Declare tiers and submit proofs
//! 2. Request unlock through the consent authority
//! 3. Fold each step into the anchor chain
//! 4. Fall back to the guardian quorum when consent is rejected
//! 5. Publish, persist, reload, and verify the chain

use std::cell::Cell;
use std::sync::Arc;

use seedra_vault::anchor::digest::{event_hash, fold_root, genesis_root, sha3_hex};
use seedra_vault::anchor::{verify_snapshot, AnchorChain, HashMode};
use seedra_vault::gate::{
    ConsentAuthority, ConsentToken, DenialReason, StaticProof, TierGate, UnlockController,
    UnlockOutcome,
};
use seedra_vault::guardian::{GuardianKey, GuardianQuorum};
use seedra_vault::publish::{AnchorPublisher, DirectoryPublisher, MemoryPublisher};
use seedra_vault::session::{FlowEvent, RecordingObserver, VaultSession};
use seedra_vault::storage::SnapshotStore;
use seedra_vault::time::{micros_to_rfc3339, ManualClock};
use seedra_vault::{AllowListAuthority, Result, VaultError};

// 2026-10-19T08:00:00Z
const T0: u64 = 1_792_396_800_000_000;

const TIERS: [&str; 3] = ["biometric", "device", "consent"];

/// Consent authority with a fixed answer that counts how often it is asked.
struct SpyAuthority {
    answer: bool,
    calls: Cell<usize>,
}

impl SpyAuthority {
    fn new(answer: bool) -> Self {
        Self {
            answer,
            calls: Cell::new(0),
        }
    }
}

impl ConsentAuthority for SpyAuthority {
    fn validate_consent(&self, _token: &ConsentToken) -> Result<bool> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.answer)
    }
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(T0))
}

fn controller(authority: SpyAuthority) -> UnlockController<SpyAuthority> {
    let gate = TierGate::declare(TIERS, clock()).expect("tiers should declare");
    UnlockController::new(gate, authority)
}

#[test]
fn scenario_a_all_tiers_and_consent_granted() {
    let mut ctl = controller(SpyAuthority::new(true));
    for tier in TIERS {
        assert!(ctl.submit_proof(tier, &StaticProof(true)).unwrap());
    }

    let outcome = ctl.request_unlock(&ConsentToken::new("tok")).unwrap();
    assert_eq!(outcome, UnlockOutcome::Granted);
    assert_eq!(ctl.authority().calls.get(), 1);
}

#[test]
fn scenario_b_missing_tier_denied_without_consulting_authority() {
    let mut ctl = controller(SpyAuthority::new(true));
    ctl.submit_proof("biometric", &StaticProof(true)).unwrap();
    ctl.submit_proof("device", &StaticProof(true)).unwrap();

    let outcome = ctl.request_unlock(&ConsentToken::new("tok")).unwrap();
    assert_eq!(outcome, UnlockOutcome::Denied(DenialReason::IncompleteTiers));
    assert_eq!(ctl.authority().calls.get(), 0, "authority must not be asked");
    assert_eq!(ctl.gate().pending(), vec!["consent"]);
}

#[test]
fn scenario_c_consent_rejected() {
    let mut ctl = controller(SpyAuthority::new(false));
    for tier in TIERS {
        ctl.submit_proof(tier, &StaticProof(true)).unwrap();
    }

    let outcome = ctl.request_unlock(&ConsentToken::new("tok")).unwrap();
    assert_eq!(outcome, UnlockOutcome::Denied(DenialReason::ConsentRejected));
    assert_eq!(ctl.authority().calls.get(), 1);
}

#[test]
fn scenario_d_two_event_fold() {
    let clock = clock();
    let mut chain = AnchorChain::new("s1", clock.clone()).unwrap();
    chain.append_event("vault_unlocked").unwrap();
    clock.advance(250);
    chain.append_event("guardian_fallback").unwrap();

    let h1 = sha3_hex(format!("vault_unlocked|{}", micros_to_rfc3339(T0)).as_bytes());
    let h2 = sha3_hex(format!("guardian_fallback|{}", micros_to_rfc3339(T0 + 250)).as_bytes());
    let r0 = sha3_hex(b"s1");
    let r1 = sha3_hex(format!("{r0}{h1}").as_bytes());
    let r2 = sha3_hex(format!("{r1}{h2}").as_bytes());

    let snapshot = chain.snapshot();
    assert_eq!(snapshot.root, r2);
    assert_eq!(snapshot.events[0].event_hash, h1);
    assert_eq!(snapshot.events[1].event_hash, h2);
    assert!(verify_snapshot(&snapshot).is_valid);
}

#[test]
fn digest_helpers_compose_the_fold() {
    let ts = micros_to_rfc3339(T0);
    let h = event_hash("unlock_attempted", &ts, 0, HashMode::Timestamped);
    assert_eq!(fold_root(&genesis_root("s1"), &h).len(), 64);

    // same type, same tick: only sequenced hashing tells them apart
    let a = event_hash("x", &ts, 0, HashMode::Sequenced);
    let b = event_hash("x", &ts, 1, HashMode::Sequenced);
    assert_ne!(a, b);
    assert_eq!(
        event_hash("x", &ts, 0, HashMode::Timestamped),
        event_hash("x", &ts, 1, HashMode::Timestamped)
    );
}

#[test]
fn session_granted_flow_anchors_every_step() {
    let observer = Arc::new(RecordingObserver::new());
    let publisher = Arc::new(MemoryPublisher::new());
    let mut session = VaultSession::builder("user-1", AllowListAuthority::new(["tok-ok"]))
        .clock(clock())
        .observer(observer.clone())
        .publisher(publisher.clone())
        .build()
        .unwrap();

    for tier in TIERS {
        session.submit_proof(tier, &StaticProof(true)).unwrap();
    }
    session.store_entry("recovery phrase").unwrap();
    assert!(matches!(session.open_vault(), Err(VaultError::VaultLocked)));

    let report = session
        .attempt_unlock(&ConsentToken::new("tok-ok"), &[])
        .unwrap();
    assert!(report.outcome.is_granted());
    assert!(report.vault_open);
    assert_eq!(report.override_accepted, None);
    assert_eq!(session.open_vault().unwrap(), vec!["recovery phrase"]);

    let types: Vec<&str> = session
        .chain()
        .events()
        .iter()
        .map(|e| e.event_type.as_str())
        .collect();
    assert_eq!(
        types,
        vec![
            "proof_verified:biometric",
            "proof_verified:device",
            "proof_verified:consent",
            "unlock_attempted",
            "vault_unlocked",
        ]
    );

    let published = publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, report.address);
    assert_eq!(published[0].1.root, session.chain().root());
    assert_eq!(report.metadata.event_count, 5);

    let events = observer.events();
    assert!(events.contains(&FlowEvent::UnlockGranted));
    assert!(matches!(events.last(), Some(FlowEvent::AnchorPublished { .. })));
}

#[test]
fn session_denied_flow_with_guardian_override() {
    let keys: Vec<GuardianKey> = (1..=5)
        .map(|i| GuardianKey::generate(format!("node_{i:02}")))
        .collect();
    let quorum = GuardianQuorum::new(
        3,
        keys.iter()
            .map(|k| (k.guardian_id().to_string(), k.verifying_key())),
    )
    .unwrap();

    let mut session = VaultSession::builder("user-2", AllowListAuthority::default())
        .clock(clock())
        .guardian(quorum)
        .build()
        .unwrap();
    for tier in TIERS {
        session.submit_proof(tier, &StaticProof(true)).unwrap();
    }

    let challenge = session.override_challenge();
    let approvals: Vec<_> = keys[..3].iter().map(|k| k.approve(&challenge)).collect();
    let report = session
        .attempt_unlock(&ConsentToken::new("unknown"), &approvals)
        .unwrap();

    assert_eq!(report.outcome.denial(), Some(DenialReason::ConsentRejected));
    assert_eq!(report.override_accepted, Some(true));
    assert!(session.is_unlocked());

    // the fallback trigger is sealed before the override opens the vault
    let entries = session.open_vault().unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].starts_with("fallback trigger: consent_rejected at 2026-10-19T"));

    let tail: Vec<&str> = session.chain().events()[3..]
        .iter()
        .map(|e| e.event_type.as_str())
        .collect();
    assert_eq!(
        tail,
        vec!["unlock_attempted", "guardian_fallback", "guardian_override"]
    );
}

#[test]
fn session_denied_flow_with_too_few_approvals_stays_locked() {
    let keys: Vec<GuardianKey> = (1..=5)
        .map(|i| GuardianKey::generate(format!("node_{i:02}")))
        .collect();
    let quorum = GuardianQuorum::new(
        3,
        keys.iter()
            .map(|k| (k.guardian_id().to_string(), k.verifying_key())),
    )
    .unwrap();

    let mut session = VaultSession::builder("user-3", AllowListAuthority::new(["tok"]))
        .clock(clock())
        .guardian(quorum)
        .build()
        .unwrap();
    for tier in TIERS {
        session.submit_proof(tier, &StaticProof(true)).unwrap();
    }

    let challenge = session.override_challenge();
    // the same guardian twice still counts once
    let approvals = vec![keys[0].approve(&challenge), keys[0].approve(&challenge)];
    let report = session
        .attempt_unlock(&ConsentToken::new("wrong"), &approvals)
        .unwrap();

    assert_eq!(report.outcome.denial(), Some(DenialReason::ConsentRejected));
    assert_eq!(report.override_accepted, Some(false));
    assert!(!report.vault_open);
    assert!(matches!(session.open_vault(), Err(VaultError::VaultLocked)));
    assert_eq!(
        session.chain().events().last().unwrap().event_type,
        "guardian_fallback"
    );
}

#[test]
fn session_missing_tiers_stay_locked_despite_full_quorum() {
    let keys: Vec<GuardianKey> = (1..=5)
        .map(|i| GuardianKey::generate(format!("node_{i:02}")))
        .collect();
    let quorum = GuardianQuorum::new(
        3,
        keys.iter()
            .map(|k| (k.guardian_id().to_string(), k.verifying_key())),
    )
    .unwrap();

    let mut session = VaultSession::builder("user-7", AllowListAuthority::new(["tok"]))
        .clock(clock())
        .guardian(quorum)
        .build()
        .unwrap();
    session.store_entry("secret").unwrap();
    for tier in TIERS {
        session.submit_proof(tier, &StaticProof(false)).unwrap();
    }

    let challenge = session.override_challenge();
    let approvals: Vec<_> = keys.iter().map(|k| k.approve(&challenge)).collect();
    let report = session
        .attempt_unlock(&ConsentToken::new("tok"), &approvals)
        .unwrap();

    assert_eq!(report.outcome.denial(), Some(DenialReason::IncompleteTiers));
    assert_eq!(report.override_accepted, None);
    assert!(!report.vault_open);
    assert!(matches!(session.open_vault(), Err(VaultError::VaultLocked)));
    assert_eq!(session.gate().pending(), TIERS.to_vec());

    // resubmitting the proofs is the way back in
    for tier in TIERS {
        session.submit_proof(tier, &StaticProof(true)).unwrap();
    }
    let report = session.attempt_unlock(&ConsentToken::new("tok"), &[]).unwrap();
    assert!(report.outcome.is_granted());
    assert!(session.open_vault().unwrap().contains(&"secret".to_string()));
}

#[test]
fn publish_persist_reload_and_verify() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("chains")).unwrap();
    let publisher = DirectoryPublisher::new(dir.path().join("anchors")).unwrap();
    let clock = clock();

    let mut session = VaultSession::builder("user-4", AllowListAuthority::new(["tok"]))
        .clock(clock.clone())
        .hash_mode(HashMode::Sequenced)
        .build()
        .unwrap();
    for tier in TIERS {
        session.submit_proof(tier, &StaticProof(true)).unwrap();
    }
    session.attempt_unlock(&ConsentToken::new("tok"), &[]).unwrap();

    let snapshot = session.snapshot();
    store.save(&snapshot).unwrap();
    let address = publisher.publish(&snapshot).unwrap();
    assert_eq!(publisher.fetch(&address).unwrap(), snapshot);

    // A later session picks up the stored chain with a fresh gate.
    clock.advance(1_000_000);
    let stored = store.load("user-4").unwrap();
    let mut resumed = VaultSession::builder("user-4", AllowListAuthority::new(["tok"]))
        .clock(clock.clone())
        .resume(stored)
        .build()
        .unwrap();
    assert_eq!(resumed.chain().root(), snapshot.root);
    assert_eq!(resumed.chain().hash_mode(), HashMode::Sequenced);
    assert_eq!(resumed.gate().pending().len(), 3);

    let report = resumed.attempt_unlock(&ConsentToken::new("tok"), &[]).unwrap();
    assert_eq!(report.outcome.denial(), Some(DenialReason::IncompleteTiers));
    assert_eq!(resumed.chain().len(), snapshot.events.len() + 2);
    assert!(verify_snapshot(&resumed.snapshot()).is_valid);

    // Resuming someone else's chain is refused.
    let other = store.load("user-4").unwrap();
    let err = VaultSession::builder("user-5", AllowListAuthority::default())
        .resume(other)
        .build()
        .err()
        .expect("foreign snapshot must be rejected");
    assert!(matches!(err, VaultError::TamperDetected(_)));
}

#[test]
fn authority_fault_propagates_after_attempt_is_anchored() {
    struct Offline;
    impl ConsentAuthority for Offline {
        fn validate_consent(&self, _token: &ConsentToken) -> Result<bool> {
            Err(VaultError::AuthorityUnavailable("policy service offline".into()))
        }
    }

    let mut session = VaultSession::builder("user-6", Offline)
        .clock(clock())
        .tiers(["device"])
        .build()
        .unwrap();
    session.submit_proof("device", &StaticProof(true)).unwrap();

    let err = session
        .attempt_unlock(&ConsentToken::new("tok"), &[])
        .err()
        .expect("fault should propagate");
    assert!(matches!(err, VaultError::AuthorityUnavailable(_)));
    assert!(!session.is_unlocked());
    assert_eq!(
        session.chain().events().last().unwrap().event_type,
        "unlock_attempted"
    );
}
