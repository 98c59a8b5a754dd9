//! Edge case tests: tier declaration, proof ordering and retries, consent
//! ordering, authority faults, and guardian quorum bounds.

use std::cell::Cell;
use std::sync::Arc;

use seedra_vault::gate::{
    ConsentAuthority, ConsentToken, DenialReason, StaticProof, TierGate, UnlockController,
    UnlockOutcome, Verifiable,
};
use seedra_vault::guardian::{GuardianKey, GuardianQuorum, OverrideAuthority};
use seedra_vault::time::ManualClock;
use seedra_vault::{Result, VaultError};

const T0: u64 = 1_792_396_800_000_000;

struct Counting {
    answer: bool,
    calls: Cell<usize>,
}

impl ConsentAuthority for Counting {
    fn validate_consent(&self, _token: &ConsentToken) -> Result<bool> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.answer)
    }
}

struct UnreachableProver;

impl Verifiable for UnreachableProver {
    fn verify(&self) -> Result<bool> {
        Err(VaultError::AuthorityUnavailable("prover offline".into()))
    }
}

fn gate(tiers: &[&str]) -> TierGate {
    TierGate::declare(tiers.iter().copied(), Arc::new(ManualClock::new(T0))).unwrap()
}

// === Tier Declaration ===

#[test]
fn edge_declare_rejects_bad_tier_sets() {
    let clock = || Arc::new(ManualClock::new(T0));
    assert!(matches!(
        TierGate::declare(Vec::<String>::new(), clock()),
        Err(VaultError::Configuration(_))
    ));
    assert!(matches!(
        TierGate::declare(["a", "a"], clock()),
        Err(VaultError::Configuration(_))
    ));
    assert!(matches!(
        TierGate::declare(["a", " "], clock()),
        Err(VaultError::Configuration(_))
    ));
}

#[test]
fn edge_single_tier_gate() {
    let mut g = gate(&["only"]);
    assert!(!g.all_satisfied());
    g.submit_proof("only", &StaticProof(true)).unwrap();
    assert!(g.all_satisfied());
}

#[test]
fn edge_many_tiers() {
    let names: Vec<String> = (0..256).map(|i| format!("tier_{i}")).collect();
    let mut g = TierGate::declare(names.clone(), Arc::new(ManualClock::new(T0))).unwrap();
    for name in &names[..255] {
        g.submit_proof(name, &StaticProof(true)).unwrap();
    }
    assert_eq!(g.pending(), vec!["tier_255"]);
    g.submit_proof("tier_255", &StaticProof(true)).unwrap();
    assert!(g.all_satisfied());
}

// === Proof Submission ===

#[test]
fn edge_unknown_tier_changes_nothing() {
    let mut g = gate(&["biometric"]);
    assert!(matches!(
        g.submit_proof("retina", &StaticProof(true)),
        Err(VaultError::UnknownTier(_))
    ));
    assert_eq!(g.pending(), vec!["biometric"]);
}

#[test]
fn edge_failed_proof_does_not_clear_earlier_success() {
    let mut g = gate(&["device"]);
    assert!(g.submit_proof("device", &StaticProof(true)).unwrap());
    let first = g.tier("device").unwrap().last_verified_at;
    assert!(!g.submit_proof("device", &StaticProof(false)).unwrap());
    assert!(g.all_satisfied());
    assert_eq!(g.tier("device").unwrap().last_verified_at, first);
}

#[test]
fn edge_retry_after_failure() {
    let mut g = gate(&["device"]);
    assert!(!g.submit_proof("device", &StaticProof(false)).unwrap());
    assert!(!g.all_satisfied());
    assert!(g.submit_proof("device", &StaticProof(true)).unwrap());
    assert!(g.all_satisfied());
}

#[test]
fn edge_proof_order_does_not_matter() {
    let mut g = gate(&["a", "b", "c"]);
    for tier in ["c", "a", "b"] {
        g.submit_proof(tier, &StaticProof(true)).unwrap();
    }
    assert!(g.all_satisfied());
}

#[test]
fn edge_prover_fault_propagates() {
    let mut g = gate(&["biometric"]);
    assert!(matches!(
        g.submit_proof("biometric", &UnreachableProver),
        Err(VaultError::AuthorityUnavailable(_))
    ));
    assert!(!g.all_satisfied());
}

// === Unlock Ordering ===

#[test]
fn edge_repeated_unlock_requests_each_ask_authority() {
    let mut ctl = UnlockController::new(
        gate(&["a"]),
        Counting {
            answer: false,
            calls: Cell::new(0),
        },
    );
    ctl.submit_proof("a", &StaticProof(true)).unwrap();

    for _ in 0..3 {
        assert_eq!(
            ctl.request_unlock(&ConsentToken::new("t")).unwrap(),
            UnlockOutcome::Denied(DenialReason::ConsentRejected)
        );
    }
    assert_eq!(ctl.authority().calls.get(), 3);
}

#[test]
fn edge_empty_token_is_passed_through() {
    let ctl = {
        let mut ctl = UnlockController::new(
            gate(&["a"]),
            Counting {
                answer: true,
                calls: Cell::new(0),
            },
        );
        ctl.submit_proof("a", &StaticProof(true)).unwrap();
        ctl
    };
    assert!(ctl.request_unlock(&ConsentToken::new("")).unwrap().is_granted());
}

// === Guardian Quorum ===

fn quorum(threshold: usize, keys: &[GuardianKey]) -> Result<GuardianQuorum> {
    GuardianQuorum::new(
        threshold,
        keys.iter()
            .map(|k| (k.guardian_id().to_string(), k.verifying_key())),
    )
}

#[test]
fn edge_quorum_bounds() {
    let keys: Vec<GuardianKey> = (0..3).map(|i| GuardianKey::generate(format!("g{i}"))).collect();
    assert!(quorum(0, &keys).is_err());
    assert!(quorum(4, &keys).is_err());
    assert!(quorum(3, &keys).is_ok());

    let dup = vec![GuardianKey::generate("g"), GuardianKey::generate("g")];
    assert!(matches!(quorum(1, &dup), Err(VaultError::Configuration(_))));
}

#[test]
fn edge_approvals_for_another_challenge_do_not_count() {
    let keys: Vec<GuardianKey> = (0..3).map(|i| GuardianKey::generate(format!("g{i}"))).collect();
    let q = quorum(2, &keys).unwrap();

    let stale: Vec<_> = keys.iter().map(|k| k.approve("old challenge")).collect();
    assert!(!q.authorize("new challenge", &stale).unwrap());

    let fresh: Vec<_> = keys[..2].iter().map(|k| k.approve("new challenge")).collect();
    assert!(q.authorize("new challenge", &fresh).unwrap());
}

#[test]
fn edge_unknown_guardian_ignored() {
    let keys: Vec<GuardianKey> = (0..2).map(|i| GuardianKey::generate(format!("g{i}"))).collect();
    let q = quorum(2, &keys).unwrap();
    let outsider = GuardianKey::generate("intruder");

    let approvals = vec![keys[0].approve("c"), outsider.approve("c")];
    assert_eq!(q.count_valid("c", &approvals), 1);
    assert!(!q.authorize("c", &approvals).unwrap());
}
