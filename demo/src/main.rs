//! callsim Contact-Center Reference Runtime: demo CLI
//!
//! Runs one or all of the four contact-center scenarios. Each scenario uses
//! the real callsim components (telephony engine, capability gate, event
//! publishers) wired to a mock vendor backend.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- inbound-call
//!   cargo run -p demo -- outbound-call
//!   cargo run -p demo -- warm-transfer
//!   cargo run -p demo -- capability-and-faults

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use callsim_ref_contact_center::{
    scenarios::{capability_and_faults, inbound_call, outbound_call, warm_transfer},
    ScenarioResult,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// callsim reference CCaaS telephony engine demo.
///
/// Each subcommand runs one or all of the scripted agent-desktop scenarios,
/// showing the call state machine, capability gating and host events.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "callsim contact-center reference runtime demo",
    long_about = "Runs callsim contact-center scenarios showing call lifecycle commands,\n\
                  capability gating, injected failures and the events sent to the host."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run all four scenarios in sequence.
    RunAll,
    /// Scenario 1: Inbound Call (accept, hold, hangup, wrap-up).
    InboundCall,
    /// Scenario 2: Outbound Call (outbound slot, callback, skipped wrap-up).
    OutboundCall,
    /// Scenario 3: Warm Transfer (consult, swap, conference, blind transfer).
    WarmTransfer,
    /// Scenario 4: Capabilities and Faults (gate, error injection, backend failures).
    CapabilityAndFaults,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    debug!(command = ?cli.command, "demo starting");

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all().await,
        Command::InboundCall => inbound_call::run_scenario().await,
        Command::OutboundCall => outbound_call::run_scenario().await,
        Command::WarmTransfer => warm_transfer::run_scenario().await,
        Command::CapabilityAndFaults => capability_and_faults::run_scenario().await,
    };

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

async fn run_all() -> ScenarioResult<()> {
    inbound_call::run_scenario().await?;
    outbound_call::run_scenario().await?;
    warm_transfer::run_scenario().await?;
    capability_and_faults::run_scenario().await?;
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("callsim — Reference CCaaS Telephony Engine");
    println!("Contact-Center Reference Demo");
    println!("==========================================");
    println!();
    println!("Per host command:");
    println!("  [1] Error injection check: every host command fails while enabled");
    println!("  [2] Capability gate: mute / merge / swap / record per AgentConfig");
    println!("  [3] Call registry mutation under one lock acquisition");
    println!("  [4] Events published to the host after the lock is released");
    println!("  [5] Last leg ended → after-call work starts once the wrap-up delay elapses");
    println!();
}
