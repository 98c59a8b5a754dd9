//! Unlock Flow: submit tier proofs, have consent rejected, let the guardian
//! quorum override the rejection, and verify the published anchor.
//!
//! Run with:
//!   cargo run --example unlock_flow -p seedra-vault

use std::sync::Arc;

use seedra_vault::anchor::verify_snapshot;
use seedra_vault::gate::{AllowListAuthority, ConsentToken, StaticProof};
use seedra_vault::guardian::{GuardianKey, GuardianQuorum};
use seedra_vault::publish::MemoryPublisher;
use seedra_vault::session::VaultSession;

fn main() {
    // ── 1. Enroll five guardians, any three of which may override ───────────
    let guardians: Vec<GuardianKey> = (1..=5)
        .map(|i| GuardianKey::generate(format!("node_{i:02}")))
        .collect();
    let quorum = GuardianQuorum::new(
        3,
        guardians
            .iter()
            .map(|g| (g.guardian_id().to_string(), g.verifying_key())),
    )
    .expect("quorum should be valid");

    let publisher = Arc::new(MemoryPublisher::new());
    let mut session = VaultSession::builder("user_001", AllowListAuthority::new(["tok-granted"]))
        .guardian(quorum)
        .publisher(publisher.clone())
        .build()
        .expect("session should start");

    session
        .store_entry("seed phrase: abandon ability able about")
        .expect("sealing should succeed");

    // ── 2. Submit proofs; every tier passes ─────────────────────────────────
    //
    // StaticProof stands in for an external prover. A real deployment
    // would implement `Verifiable` over its proof scheme.
    for (tier, passes) in [("biometric", true), ("device", true), ("consent", true)] {
        let accepted = session
            .submit_proof(tier, &StaticProof(passes))
            .expect("tier should be declared");
        println!("Tier {tier:<10} {}", if accepted { "verified" } else { "rejected" });
    }
    println!();

    // ── 3. Guardians sign the override challenge for the next attempt ───────
    let challenge = session.override_challenge();
    println!("Override challenge: {challenge}");
    let approvals: Vec<_> = guardians[..3].iter().map(|g| g.approve(&challenge)).collect();

    // ── 4. Attempt the unlock with a token the authority does not know ─────
    let report = session
        .attempt_unlock(&ConsentToken::new("tok-unknown"), &approvals)
        .expect("unlock attempt should complete");

    match report.outcome.denial() {
        None => println!("Unlock granted"),
        Some(reason) => println!("Unlock denied: {reason}"),
    }
    println!("Guardian override: {:?}", report.override_accepted);
    println!("Vault open:        {}", report.vault_open);
    println!();

    if let Ok(entries) = session.open_vault() {
        for entry in entries {
            println!("  entry: {entry}");
        }
        println!();
    }

    // ── 5. Inspect and verify what was published ────────────────────────────
    println!("Anchor chain for {}:", session.subject_id());
    for event in session.chain().events() {
        println!("  [{}] {} {}", event.sequence, event.timestamp, event.event_type);
    }
    println!();
    println!(
        "Published: {}",
        serde_json::to_string_pretty(&report.metadata).expect("metadata serializes")
    );

    let (_, snapshot) = publisher
        .published()
        .pop()
        .expect("one snapshot was published");
    let verification = verify_snapshot(&snapshot);
    println!("Replayed root matches: {}", verification.root_matches);
}
