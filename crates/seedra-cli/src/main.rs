//! SEEDRA CLI: the `seedra` command.
//!
//! Manages per-subject anchor chains on disk, verifies and publishes
//! snapshots, and runs the full tiered unlock flow with stand-in proofs.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use seedra_vault::anchor::{verify_snapshot, AnchorChain, AnchorSnapshot, HashMode};
use seedra_vault::gate::{AllowListAuthority, ConsentToken, StaticProof};
use seedra_vault::guardian::{GuardianKey, GuardianQuorum};
use seedra_vault::publish::{AnchorMetadata, AnchorPublisher, DirectoryPublisher};
use seedra_vault::session::VaultSession;
use seedra_vault::storage::SnapshotStore;
use seedra_vault::time::{system_clock, SystemClock};
use seedra_vault::VaultConfig;

// ── Directory helpers ─────────────────────────────────────────────────────────

fn default_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME not set; pass --home")?;
    Ok(PathBuf::from(home).join(".seedra"))
}

fn chain_dir(home: &Path) -> PathBuf {
    home.join("chains")
}

fn anchor_dir(home: &Path) -> PathBuf {
    home.join("anchors")
}

fn config_path(home: &Path) -> PathBuf {
    home.join("config.json")
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// SEEDRA CLI: anchor chains and consent-gated vault unlocks.
#[derive(Parser, Debug)]
#[command(
    name = "seedra",
    about = "SEEDRA vault CLI",
    version,
    long_about = "seedra: SEEDRA vault CLI\n\nRecord tamper-evident anchor chains, verify and publish snapshots,\nand simulate tiered, consent-gated vault unlocks."
)]
struct Cli {
    /// Data directory (default: ~/.seedra)
    #[arg(long, global = true, env = "SEEDRA_HOME")]
    home: Option<PathBuf>,

    /// Config file (default: <home>/config.json if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage anchor chains
    Anchor {
        #[command(subcommand)]
        subcommand: AnchorCommands,
    },

    /// Run the full unlock flow for a subject with stand-in proofs
    Simulate {
        /// Subject id
        subject: String,

        /// Tier whose proof should fail (repeatable)
        #[arg(long = "fail")]
        fail: Vec<String>,

        /// Tier to leave unsubmitted (repeatable)
        #[arg(long = "skip")]
        skip: Vec<String>,

        /// Consent token presented to the authority
        #[arg(long, default_value = "")]
        token: String,

        /// Guardians to enroll for overriding a consent rejection (0 disables)
        #[arg(long, default_value_t = 0)]
        guardians: usize,

        /// How many of those guardians approve the override
        #[arg(long, default_value_t = 0)]
        approvals: usize,
    },

    /// Inspect or create configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum AnchorCommands {
    /// Start a new chain for a subject
    Init {
        subject: String,

        /// Hash the sequence number into each event
        #[arg(long)]
        sequenced: bool,
    },
    /// Append an event to a subject's chain
    Append { subject: String, event_type: String },
    /// Show a subject's chain
    Show { subject: String },
    /// List subjects with a stored chain
    List,
    /// Replay a chain and check its root
    Verify {
        /// Subject id (stored chain)
        subject: Option<String>,

        /// Verify a snapshot JSON file instead
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Publish a subject's snapshot to the anchors directory
    Publish { subject: String },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write the default configuration to <home>/config.json
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ── Main entry point ──────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let home = match cli.home {
        Some(home) => home,
        None => default_home()?,
    };
    let verbose = cli.verbose;

    match cli.command {
        Commands::Anchor { subcommand } => match subcommand {
            AnchorCommands::Init { subject, sequenced } => {
                cmd_anchor_init(&home, &subject, sequenced)
            }
            AnchorCommands::Append {
                subject,
                event_type,
            } => cmd_anchor_append(&home, &subject, &event_type, verbose),
            AnchorCommands::Show { subject } => cmd_anchor_show(&home, &subject, verbose),
            AnchorCommands::List => cmd_anchor_list(&home),
            AnchorCommands::Verify { subject, file } => {
                cmd_anchor_verify(&home, subject.as_deref(), file.as_deref())
            }
            AnchorCommands::Publish { subject } => cmd_anchor_publish(&home, &subject),
        },
        Commands::Simulate {
            subject,
            fail,
            skip,
            token,
            guardians,
            approvals,
        } => {
            let config = load_config(&home, cli.config.as_deref())?;
            cmd_simulate(
                &home,
                &config,
                &SimulateArgs {
                    subject,
                    fail,
                    skip,
                    token,
                    guardians,
                    approvals,
                },
                verbose,
            )
        }
        Commands::Config { subcommand } => match subcommand {
            ConfigCommands::Show => cmd_config_show(&home, cli.config.as_deref()),
            ConfigCommands::Init { force } => cmd_config_init(&home, force),
        },
    }
}

fn load_config(home: &Path, explicit: Option<&Path>) -> Result<VaultConfig> {
    if let Some(path) = explicit {
        return VaultConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()));
    }
    let path = config_path(home);
    if path.exists() {
        log::info!("using config {}", path.display());
        VaultConfig::load(&path).with_context(|| format!("failed to load config {}", path.display()))
    } else {
        log::info!("no config at {}, using defaults", path.display());
        Ok(VaultConfig::default())
    }
}

fn open_store(home: &Path) -> Result<SnapshotStore> {
    SnapshotStore::new(chain_dir(home)).context("failed to open chain store")
}

fn load_chain(store: &SnapshotStore, subject: &str) -> Result<AnchorChain> {
    let snapshot = store
        .load(subject)
        .with_context(|| format!("no usable chain for '{subject}'; run `seedra anchor init` first"))?;
    AnchorChain::from_snapshot(snapshot, system_clock()).context("failed to restore chain")
}

fn print_snapshot_summary(snapshot: &AnchorSnapshot) {
    println!("Subject: {}", snapshot.subject_id);
    println!("  Root:   {}", snapshot.root);
    println!("  Mode:   {}", snapshot.hash_mode.as_tag());
    println!("  Events: {}", snapshot.events.len());
}

// ── Command implementations ───────────────────────────────────────────────────

/// `seedra anchor init SUBJECT [--sequenced]`
fn cmd_anchor_init(home: &Path, subject: &str, sequenced: bool) -> Result<()> {
    let store = open_store(home)?;
    if store.exists(subject) {
        bail!("chain for '{subject}' already exists");
    }

    let mode = if sequenced {
        HashMode::Sequenced
    } else {
        HashMode::Timestamped
    };
    let chain = AnchorChain::with_mode(subject, mode, system_clock())
        .context("failed to start chain")?;
    store.save(&chain.snapshot()).context("failed to save chain")?;

    println!("Chain created");
    print_snapshot_summary(&chain.snapshot());
    Ok(())
}

/// `seedra anchor append SUBJECT EVENT_TYPE`
fn cmd_anchor_append(home: &Path, subject: &str, event_type: &str, verbose: bool) -> Result<()> {
    let store = open_store(home)?;
    let mut chain = load_chain(&store, subject)?;

    let event = chain
        .append_event(event_type)
        .context("failed to append event")?
        .clone();
    store.save(&chain.snapshot()).context("failed to save chain")?;

    println!("Event appended");
    println!("  Sequence:  {}", event.sequence);
    println!("  Type:      {}", event.event_type);
    println!("  Timestamp: {}", event.timestamp);
    println!("  Root:      {}", chain.root());
    if verbose {
        println!("  Hash:      {}", event.event_hash);
    }
    Ok(())
}

/// `seedra anchor show SUBJECT`
fn cmd_anchor_show(home: &Path, subject: &str, verbose: bool) -> Result<()> {
    let store = open_store(home)?;
    let snapshot = store
        .load(subject)
        .with_context(|| format!("chain for '{subject}' not found"))?;

    print_snapshot_summary(&snapshot);
    println!();
    for event in &snapshot.events {
        if verbose {
            println!(
                "  [{:>4}] {}  {}  {}",
                event.sequence, event.timestamp, event.event_type, event.event_hash
            );
        } else {
            println!(
                "  [{:>4}] {}  {}",
                event.sequence, event.timestamp, event.event_type
            );
        }
    }
    Ok(())
}

/// `seedra anchor list`
fn cmd_anchor_list(home: &Path) -> Result<()> {
    let store = open_store(home)?;
    let subjects = store.list().context("failed to list chains")?;
    if subjects.is_empty() {
        println!("No chains found.");
        return Ok(());
    }
    for subject in subjects {
        println!("{subject}");
    }
    Ok(())
}

/// `seedra anchor verify [SUBJECT] [--file PATH]`
fn cmd_anchor_verify(home: &Path, subject: Option<&str>, file: Option<&Path>) -> Result<()> {
    let snapshot = match (subject, file) {
        (_, Some(path)) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            AnchorSnapshot::from_json(&json).context("not an anchor snapshot")?
        }
        (Some(subject), None) => open_store(home)?
            .load_unverified(subject)
            .with_context(|| format!("chain for '{subject}' not found"))?,
        (None, None) => bail!("give a SUBJECT or --file"),
    };

    let verification = verify_snapshot(&snapshot);
    print_snapshot_summary(&snapshot);
    println!();
    println!("Verification:");
    println!(
        "  Sequence: {}",
        if verification.sequence_valid { "VALID" } else { "INVALID" }
    );
    println!(
        "  Root:     {}",
        if verification.root_matches { "MATCHES" } else { "MISMATCH" }
    );
    if let Some(index) = verification.first_tampered_event() {
        println!("  First altered event: #{index}");
    }

    if verification.is_valid {
        println!();
        println!("Result: VALID");
        Ok(())
    } else {
        println!("  Replayed: {}", verification.computed_root);
        println!();
        println!("Result: INVALID");
        Err(anyhow!("snapshot for '{}' failed verification", snapshot.subject_id))
    }
}

/// `seedra anchor publish SUBJECT`
fn cmd_anchor_publish(home: &Path, subject: &str) -> Result<()> {
    let store = open_store(home)?;
    let snapshot = store
        .load(subject)
        .with_context(|| format!("chain for '{subject}' not found"))?;

    let publisher =
        DirectoryPublisher::new(anchor_dir(home)).context("failed to open anchors directory")?;
    let address = publisher.publish(&snapshot).context("failed to publish")?;
    let metadata = AnchorMetadata::new(address, &snapshot, &SystemClock);

    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}

struct SimulateArgs {
    subject: String,
    fail: Vec<String>,
    skip: Vec<String>,
    token: String,
    guardians: usize,
    approvals: usize,
}

/// `seedra simulate SUBJECT [--fail T]... [--skip T]... [--token TOK] [--guardians N --approvals K]`
fn cmd_simulate(home: &Path, config: &VaultConfig, args: &SimulateArgs, verbose: bool) -> Result<()> {
    for tier in args.fail.iter().chain(&args.skip) {
        if !config.tiers.contains(tier) {
            bail!("unknown tier '{tier}'; configured tiers: {}", config.tiers.join(", "));
        }
    }
    if args.approvals > args.guardians {
        bail!("--approvals cannot exceed --guardians");
    }

    let store = open_store(home)?;
    let publisher =
        DirectoryPublisher::new(anchor_dir(home)).context("failed to open anchors directory")?;

    let mut builder = VaultSession::builder(
        args.subject.clone(),
        AllowListAuthority::new(config.consent_tokens.iter().cloned()),
    )
    .config(config)
    .publisher(publisher);

    if store.exists(&args.subject) {
        let snapshot = store
            .load(&args.subject)
            .with_context(|| format!("stored chain for '{}' is unusable", args.subject))?;
        builder = builder.resume(snapshot);
    }

    let guardian_keys: Vec<GuardianKey> = (1..=args.guardians)
        .map(|i| GuardianKey::generate(format!("node_{i:02}")))
        .collect();
    if !guardian_keys.is_empty() {
        let threshold = config.guardian_threshold.min(guardian_keys.len());
        let quorum = GuardianQuorum::new(
            threshold,
            guardian_keys
                .iter()
                .map(|k| (k.guardian_id().to_string(), k.verifying_key())),
        )?;
        builder = builder.guardian(quorum);
    }

    let mut session = builder.build().context("failed to start session")?;

    for tier in &config.tiers {
        if args.skip.contains(tier) {
            continue;
        }
        let proof = StaticProof(!args.fail.contains(tier));
        let accepted = session.submit_proof(tier, &proof)?;
        println!(
            "  Tier {:<12} {}",
            tier,
            if accepted { "verified" } else { "rejected" }
        );
    }

    let challenge = session.override_challenge();
    let approvals: Vec<_> = guardian_keys[..args.approvals]
        .iter()
        .map(|k| k.approve(&challenge))
        .collect();

    let report = session.attempt_unlock(&ConsentToken::new(args.token.clone()), &approvals)?;
    store
        .save(&session.snapshot())
        .context("failed to save chain")?;

    println!();
    match report.outcome.denial() {
        None => println!("Result: GRANTED"),
        Some(reason) => println!("Result: DENIED ({reason})"),
    }
    if let Some(accepted) = report.override_accepted {
        println!(
            "  Guardian override: {}",
            if accepted { "ACCEPTED" } else { "REJECTED" }
        );
    }
    println!("  Vault open: {}", if report.vault_open { "yes" } else { "no" });
    println!("  Anchor:     {}", report.address);
    println!("  Root:       {}", report.metadata.root);

    if verbose {
        println!();
        println!("{}", serde_json::to_string_pretty(&report.metadata)?);
    }
    Ok(())
}

/// `seedra config show`
fn cmd_config_show(home: &Path, explicit: Option<&Path>) -> Result<()> {
    let config = load_config(home, explicit)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// `seedra config init [--force]`
fn cmd_config_init(home: &Path, force: bool) -> Result<()> {
    let path = config_path(home);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    std::fs::create_dir_all(home)
        .with_context(|| format!("failed to create {}", home.display()))?;
    VaultConfig::default()
        .save(&path)
        .context("failed to write config")?;
    println!("Config written to {}", path.display());
    Ok(())
}
