//! Scenario 3: Warm Transfer
//!
//! A billing customer needs a supervisor. The agent consults, merges the
//! three parties, drops out of the consult and finally blind-transfers a
//! second caller to the escalations desk.
//!
//! Sub-case A (warm):
//!
//!   Step 1: customer connected          → VC-0001
//!   Step 2: look up the supervisor      → directory filtered to AGENT
//!   Step 3: add supervisor              → THIRD_PARTY leg RINGING, no event
//!   Step 4: second add                  → rejected, transfer slot taken
//!   Step 5: supervisor answers          → PARTICIPANT_CONNECTED
//!   Step 6: hold customer, swap, merge  → hold flags move, then all clear
//!   Step 7: drop the supervisor         → PARTICIPANT_REMOVED, no wrap-up
//!   Step 8: hangup                      → HANGUP, wrap-up for VC-0001
//!
//! Sub-case B (blind): the customer leg ends immediately and the third
//! party carries the interaction.

use callsim_contracts::{
    call::{CallAttributes, CallSelector, ParticipantType},
    contact::{ContactFilter, ContactType},
    error::{CallsimError, Unavailability},
    event::{EventType, TelephonyEvent},
};

use crate::{
    error::{ScenarioError, ScenarioResult},
    mock_data::{supervisor, MockBackend, BILLING_CALLER, SECOND_CUSTOMER},
};

use super::{expect_rejection, Desk};

pub async fn run_scenario() -> ScenarioResult<()> {
    println!("=== Scenario 3: Warm Transfer ===");
    println!();
    println!("  Caller:     {BILLING_CALLER}");
    println!("  Consult:    Supervisor (Rivera)");
    println!();

    println!("  ── Sub-case A: Warm transfer with conference ──");
    println!();
    run_warm_transfer().await?;

    println!("  ── Sub-case B: Blind transfer ──");
    println!();
    run_blind_transfer().await?;

    println!("Scenario 3 complete.");
    println!();
    Ok(())
}

async fn run_warm_transfer() -> ScenarioResult<()> {
    let desk = Desk::new("warm-transfer", MockBackend::default())?;
    let engine = &desk.engine;

    // Step 1
    let customer = engine.start_inbound_call(BILLING_CALLER, CallAttributes::default()).await?;
    engine.accept_call(None).await?;
    println!("  Step 1 — customer connected ({})", customer.call.call_id);

    // Step 2
    let filter = ContactFilter { contact_type: Some(ContactType::Agent), ..ContactFilter::default() };
    let agents = engine.get_phone_contacts(Some(filter)).await?;
    let label = agents
        .contacts
        .first()
        .and_then(|c| c.label.clone())
        .ok_or_else(|| ScenarioError::unexpected("directory", "no agent contact configured"))?;
    println!("  Step 2 — directory lookup: {label}");

    // Step 3
    let added = engine
        .add_participant(supervisor(), CallSelector::from(&customer.call), false)
        .await?;
    println!("  Step 3 — supervisor ringing ({})", added.call_id);
    println!("  Customer:   {}", added.phone_number.as_deref().unwrap_or("-"));

    // Step 4
    println!("  Step 4 — second consult attempt");
    let rejection = expect_rejection(
        "second consult",
        engine.add_participant(supervisor(), CallSelector::initial_caller(), false).await,
    )?;
    if !matches!(rejection, CallsimError::AgentUnavailable(Unavailability::Transfer)) {
        return Err(ScenarioError::unexpected("second consult", rejection.to_string()));
    }

    // Step 5
    let joined = engine.connect_participant()?;
    println!("  Step 5 — supervisor answered");
    println!("  Initial call ended: {}", joined.initial_call_has_ended);
    desk.expect_count("consult answered", EventType::ParticipantConnected, 1)?;

    // Step 6
    let held = engine.hold(None).await?;
    println!(
        "  Step 6 — hold customer:  customer={} third-party={}",
        held.is_customer_on_hold, held.is_third_party_on_hold
    );
    let swapped = engine
        .swap_calls(
            CallSelector::initial_caller(),
            CallSelector::ByParticipant(ParticipantType::ThirdParty),
        )
        .await?;
    println!(
        "           swap:           customer={} third-party={}",
        swapped.is_customer_on_hold, swapped.is_third_party_on_hold
    );
    let merged = engine.conference(Vec::new()).await?;
    println!(
        "           conference:     customer={} third-party={}",
        merged.is_customer_on_hold, merged.is_third_party_on_hold
    );
    if merged.is_customer_on_hold || merged.is_third_party_on_hold {
        return Err(ScenarioError::unexpected("conference", "a leg is still on hold"));
    }

    // Step 7
    let removed = engine.remove_participant(ParticipantType::ThirdParty).await?;
    println!("  Step 7 — supervisor dropped ({})", removed.call.call_id);
    println!(
        "  Wrap-up:    pending={}",
        engine.is_wrapup_pending(&customer.call.call_id)
    );
    desk.expect_count("consult dropped", EventType::ParticipantRemoved, 1)?;

    // Step 8
    engine.hangup().await?;
    desk.wait_for_wrapup().await;
    println!("  Step 8 — hangup");
    match desk.log.last() {
        Some(TelephonyEvent::AfterCallWorkStarted(acw)) if acw.call_id == customer.call.call_id => {
            println!("  After-call work started for {}", acw.call_id);
        }
        other => {
            return Err(ScenarioError::unexpected(
                "warm wrap-up",
                format!("unexpected last event {other:?}"),
            ))
        }
    }
    println!();
    desk.print_events();
    println!();
    Ok(())
}

async fn run_blind_transfer() -> ScenarioResult<()> {
    let desk = Desk::new("blind-transfer", MockBackend::default())?;
    let engine = &desk.engine;

    let customer = engine.start_inbound_call(SECOND_CUSTOMER, CallAttributes::default()).await?;
    engine.accept_call(None).await?;
    println!("  Customer connected ({})", customer.call.call_id);

    let desk_contact = engine
        .get_phone_contacts(Some(ContactFilter {
            contact_type: Some(ContactType::PhoneBook),
            ..ContactFilter::default()
        }))
        .await?
        .contacts
        .into_iter()
        .next()
        .ok_or_else(|| ScenarioError::unexpected("directory", "no phonebook contact configured"))?;

    let transferred = engine
        .add_participant(desk_contact, CallSelector::initial_caller(), true)
        .await?;
    println!("  Blind transfer to {}", transferred.call_id);
    println!("  Initial call ended: {}", transferred.initial_call_has_ended);

    let active = engine.get_active_calls().await?;
    println!("  Active legs: {}", active.active_calls.len());
    if active.active_calls.contains_key(&customer.call.call_id) {
        return Err(ScenarioError::unexpected("blind transfer", "customer leg still active"));
    }

    engine.connect_participant()?;
    engine.hangup().await?;
    desk.wait_for_wrapup().await;
    desk.expect_count("blind wrap-up", EventType::AfterCallWorkStarted, 1)?;
    println!("  Third party hung up, after-call work started");
    println!();
    desk.print_events();
    println!();
    Ok(())
}
