//! Scenario 2: Outbound Call
//!
//! The agent works a follow-up list, then takes a customer callback.
//!
//!   Step 1: dial customer          → CONNECTING, CALL_STARTED
//!   Step 2: dial a second customer → rejected, outbound slot taken
//!   Step 3: customer answers       → CALL_CONNECTED
//!   Step 4: agent ends the leg     → no HANGUP event, wrap-up pending
//!   Step 5: agent skips wrap-up    → pending wrap-up cancelled
//!   Step 6: desk-phone dial        → no CALL_STARTED for non-softphone calls
//!   Step 7: customer callback      → QUEUED_CALL_STARTED, accept, hangup,
//!                                    AFTER_CALL_WORK_STARTED

use callsim_contracts::{
    call::{CallSelector, CallType, DialOptions},
    contact::Contact,
    error::{CallsimError, Unavailability},
    event::EventType,
};

use crate::{
    error::{ScenarioError, ScenarioResult},
    mock_data::{MockBackend, CALLBACK_CUSTOMER, FOLLOW_UP_CUSTOMER, SECOND_CUSTOMER},
};

use super::{expect_rejection, Desk};

pub async fn run_scenario() -> ScenarioResult<()> {
    println!("=== Scenario 2: Outbound Call ===");
    println!();
    println!("  Follow-up:  {FOLLOW_UP_CUSTOMER}");
    println!("  Callback:   {CALLBACK_CUSTOMER}");
    println!();

    let desk = Desk::new("outbound-call", MockBackend::default())?;
    let engine = &desk.engine;

    // Step 1
    let dialed = engine
        .dial(Contact::with_number(FOLLOW_UP_CUSTOMER), DialOptions::default())
        .await?;
    let call_id = dialed.call.call_id.clone();
    println!("  Step 1 — dial {FOLLOW_UP_CUSTOMER}");
    println!("  Call id:    {call_id}");
    println!("  State:      {}", dialed.call.state);
    desk.expect_count("dial", EventType::CallStarted, 1)?;
    println!();

    // Step 2
    println!("  Step 2 — dial {SECOND_CUSTOMER} while the first call is live");
    let rejection = expect_rejection(
        "second dial",
        engine.dial(Contact::with_number(SECOND_CUSTOMER), DialOptions::default()).await,
    )?;
    if !matches!(rejection, CallsimError::AgentUnavailable(Unavailability::Outbound)) {
        return Err(ScenarioError::unexpected("second dial", rejection.to_string()));
    }
    println!();

    // Step 3
    let connected = engine.connect_call(None)?;
    println!("  Step 3 — customer answers");
    println!("  State:      {}", connected.call.state);
    desk.expect_count("connect", EventType::CallConnected, 1)?;
    println!();

    // Step 4
    let ended = engine.end_call(CallSelector::initial_caller()).await?;
    println!("  Step 4 — agent ends the leg");
    println!("  Ended:      {} ({})", ended.calls[0].call_id, ended.calls[0].state);
    desk.expect_count("end call", EventType::Hangup, 0)?;
    println!("  Wrap-up:    pending={}", engine.is_wrapup_pending(&call_id));
    println!();

    // Step 5
    engine.end_wrapup();
    println!("  Step 5 — agent skips wrap-up");
    println!("  Wrap-up:    pending={}", engine.is_wrapup_pending(&call_id));
    desk.wait_for_wrapup().await;
    desk.expect_count("skipped wrap-up", EventType::AfterCallWorkStarted, 0)?;
    println!();

    // Step 6
    let desk_dial = engine
        .dial(
            Contact::with_number(SECOND_CUSTOMER),
            DialOptions { is_softphone_call: false },
        )
        .await?;
    println!("  Step 6 — dial {SECOND_CUSTOMER} from the desk phone");
    println!("  Softphone:  {}", desk_dial.call.call_info.is_softphone_call);
    desk.expect_count("desk dial", EventType::CallStarted, 1)?;
    engine.hangup().await?;
    engine.end_wrapup();
    println!("  Hung up and skipped wrap-up");
    println!();

    // Step 7
    let callback = engine.request_callback(Contact::with_number(CALLBACK_CUSTOMER))?;
    println!("  Step 7 — customer callback");
    println!("  Call type:  {:?}", callback.call.call_type);
    if callback.call.call_type != CallType::Callback {
        return Err(ScenarioError::unexpected("callback", "leg is not a callback"));
    }
    engine.accept_call(None).await?;
    engine.hangup().await?;
    desk.wait_for_wrapup().await;
    desk.expect_count("callback wrap-up", EventType::AfterCallWorkStarted, 1)?;
    println!("  After-call work started for {}", callback.call.call_id);
    println!();

    desk.print_events();
    println!();
    println!("Scenario 2 complete.");
    println!();
    Ok(())
}
