//! Scenario 1: Inbound Call
//!
//! A customer calls the billing line and the agent handles the call end to
//! end on the soft phone.
//!
//!   Step 1: init                → tenant configured, no login page
//!   Step 2: customer rings      → backend mints VC-0001, CALL_STARTED
//!   Step 3: agent accepts       → RINGING → CONNECTED (no event)
//!   Step 4: hold / resume       → CONNECTED ↔ ON_HOLD
//!   Step 5: mute, recording, DTMF, supervisor whisper → MESSAGE
//!   Step 6: hangup              → HANGUP listing the one leg
//!   Step 7: wrap-up delay       → AFTER_CALL_WORK_STARTED for VC-0001
//!
//! The host subscription receives the same envelopes the log records.

use serde_json::json;

use callsim_contracts::{
    call::{CallAttributes, CallState},
    event::{EventType, TelephonyEvent},
};

use crate::{
    error::{ScenarioError, ScenarioResult},
    mock_data::{call_center_config, MockBackend, RegistrationMode, BILLING_CALLER},
};

use super::Desk;

pub async fn run_scenario() -> ScenarioResult<()> {
    println!("=== Scenario 1: Inbound Call ===");
    println!();
    println!("  Caller:     {BILLING_CALLER}");
    println!("  Phone:      soft phone");
    println!();

    let mut desk = Desk::new("inbound-call", MockBackend::new(RegistrationMode::Mint))?;
    let engine = &desk.engine;

    // Step 1
    let init = engine.init(&call_center_config()).await?;
    println!("  Step 1 — init");
    println!("  Login page: {}", if init.show_login { "shown" } else { "not required" });
    println!();

    // Step 2
    let started = engine.start_inbound_call(BILLING_CALLER, CallAttributes::default()).await?;
    let call_id = started.call.call_id.clone();
    println!("  Step 2 — customer rings");
    println!("  Call id:    {call_id} (minted by backend)");
    println!("  State:      {}", started.call.state);
    desk.expect_count("inbound ring", EventType::CallStarted, 1)?;
    println!();

    // Step 3
    let accepted = engine.accept_call(None).await?;
    println!("  Step 3 — agent accepts");
    println!("  State:      {}", accepted.call.state);
    if accepted.call.state != CallState::Connected {
        return Err(ScenarioError::unexpected("accept", "call did not connect"));
    }
    println!();

    // Step 4
    let held = engine.hold(None).await?;
    println!("  Step 4 — hold and resume");
    println!("  On hold:    customer={}", held.is_customer_on_hold);
    let resumed = engine.resume(None).await?;
    println!("  Resumed:    customer={}", resumed.is_customer_on_hold);
    println!();

    // Step 5
    let muted = engine.mute().await?;
    let unmuted = engine.unmute().await?;
    let paused = engine.pause_recording(None).await?;
    let recording = engine.resume_recording(None).await?;
    engine.send_digits("1234#").await?;
    println!("  Step 5 — mute, recording and DTMF");
    println!("  Mute:       {} → {}", muted.is_muted, unmuted.is_muted);
    println!(
        "  Recording:  paused={} → paused={}",
        paused.is_recording_paused, recording.is_recording_paused
    );
    println!("  Digits:     1234# sent");
    engine.publish_message(json!({
        "from": "supervisor",
        "text": "Offer the paperless billing credit",
    }))?;
    println!("  Message:    supervisor whisper forwarded to the host");
    println!();

    // Step 6
    let hangup = engine.hangup().await?;
    println!("  Step 6 — hangup");
    println!("  Ended legs: {}", hangup.calls.len());
    desk.expect_count("hangup", EventType::Hangup, 1)?;
    println!();

    // Step 7
    println!("  Step 7 — wrap-up");
    desk.wait_for_wrapup().await;
    match desk.log.last() {
        Some(TelephonyEvent::AfterCallWorkStarted(acw)) if acw.call_id == call_id => {
            println!("  After-call work started for {}", acw.call_id);
        }
        other => {
            return Err(ScenarioError::unexpected(
                "wrap-up",
                format!("expected AFTER_CALL_WORK_STARTED, last event was {other:?}"),
            ))
        }
    }
    println!();

    let mirrored = desk.drain_host();
    println!("  Host subscription received {} event(s)", mirrored.len());
    if mirrored != desk.log.events() {
        return Err(ScenarioError::unexpected("host", "subscription diverged from the log"));
    }
    desk.print_events();
    println!();
    println!("Scenario 1 complete.");
    println!();
    Ok(())
}
