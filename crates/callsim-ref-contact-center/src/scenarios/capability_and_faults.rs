//! Scenario 4: Capabilities and Faults
//!
//! Shows the engine refusing work, in four sub-cases:
//!
//! Sub-case A: the administrator disables mute; the gate rejects it until
//!             the capability is switched back on.
//! Sub-case B: error injection makes every host command fail with
//!             "demo error" while the call itself is left untouched.
//! Sub-case C: the agent queues OFFLINE during a call; presence flips only
//!             when the call ends, and the next inbound call is refused.
//! Sub-case D: the backend fails registration, declines to mint an id, and
//!             refuses tenant configuration.
//!
//! Sub-case B drives the engine through the typed `Command` surface, the
//! same path a message-based host would take.

use callsim_contracts::{
    agent::{AgentConfigUpdate, AgentStatus, AgentStatusInfo},
    call::CallAttributes,
    capability::Capability,
    error::CallsimError,
    event::EventType,
};
use callsim_core::{Command, CommandOutcome};

use crate::{
    error::{ScenarioError, ScenarioResult},
    mock_data::{call_center_config, MockBackend, RegistrationMode, BILLING_CALLER},
};

use super::{expect_rejection, Desk};

pub async fn run_scenario() -> ScenarioResult<()> {
    println!("=== Scenario 4: Capabilities and Faults ===");
    println!();

    println!("  ── Sub-case A: Mute disabled by configuration ──");
    run_capability_disabled().await?;
    println!();

    println!("  ── Sub-case B: Error injection ──");
    run_error_injection().await?;
    println!();

    println!("  ── Sub-case C: Queued status change ──");
    run_queued_status().await?;
    println!();

    println!("  ── Sub-case D: Backend failures ──");
    run_backend_failures().await?;
    println!();

    println!("Scenario 4 complete.");
    println!();
    Ok(())
}

async fn run_capability_disabled() -> ScenarioResult<()> {
    let desk = Desk::new("capability-disabled", MockBackend::default())?;
    let engine = &desk.engine;

    engine.start_inbound_call(BILLING_CALLER, CallAttributes::default()).await?;
    engine.accept_call(None).await?;

    engine
        .set_agent_config(AgentConfigUpdate { has_mute: Some(false), ..Default::default() })
        .await?;
    println!("  hasMute:    false");
    let rejection = expect_rejection("mute disabled", engine.mute().await)?;
    if !matches!(
        rejection,
        CallsimError::CapabilityNotSupported { capability: Capability::Mute }
    ) {
        return Err(ScenarioError::unexpected("mute disabled", rejection.to_string()));
    }
    println!("  Muted:      {}", engine.is_muted());

    engine.update_agent_config(AgentConfigUpdate { has_mute: Some(true), ..Default::default() });
    let muted = engine.mute().await?;
    println!("  hasMute:    true (re-enabled by the administrator)");
    println!("  Muted:      {}", muted.is_muted);

    engine.hangup().await?;
    engine.end_wrapup();
    Ok(())
}

async fn run_error_injection() -> ScenarioResult<()> {
    let desk = Desk::new("error-injection", MockBackend::default())?;
    let engine = &desk.engine;

    engine
        .execute(Command::StartInboundCall {
            phone_number: BILLING_CALLER.to_string(),
            attributes: CallAttributes::default(),
        })
        .await?;
    engine.execute(Command::AcceptCall { call: None }).await?;

    engine.set_error_injection(true);
    println!("  Error injection: on");
    for command in [Command::GetActiveCalls, Command::Hangup, Command::Mute] {
        let name = command.name();
        let rejection = expect_rejection(name, engine.execute(command).await)?;
        if !matches!(rejection, CallsimError::InjectedFailure) {
            return Err(ScenarioError::unexpected(name, rejection.to_string()));
        }
    }
    desk.expect_count("injected hangup", EventType::Hangup, 0)?;

    engine.set_error_injection(false);
    println!("  Error injection: off");
    match engine.execute(Command::Hangup).await? {
        CommandOutcome::Hangup(result) => {
            println!("  hangup:     ended {} leg(s)", result.calls.len());
        }
        other => return Err(ScenarioError::unexpected("hangup", format!("{other:?}"))),
    }
    engine.end_wrapup();
    Ok(())
}

async fn run_queued_status() -> ScenarioResult<()> {
    let desk = Desk::new("queued-status", MockBackend::default())?;
    let engine = &desk.engine;

    engine.start_inbound_call(BILLING_CALLER, CallAttributes::default()).await?;
    engine.accept_call(None).await?;

    let info = AgentStatusInfo {
        status_id: Some("status-lunch".to_string()),
        status_api_name: Some("Lunch".to_string()),
        status_name: Some("Lunch Break".to_string()),
    };
    engine.set_agent_status(AgentStatus::Offline, Some(info), true).await?;
    println!("  Queued:     OFFLINE (Lunch Break)");
    println!("  During call: {:?}", engine.agent_presence().status);

    engine.hangup().await?;
    let presence = engine.agent_presence();
    println!("  After call:  {:?}", presence.status);
    if presence.status != AgentStatus::Offline {
        return Err(ScenarioError::unexpected("queued status", "status was not applied"));
    }

    expect_rejection(
        "offline inbound",
        engine.start_inbound_call(BILLING_CALLER, CallAttributes::default()).await,
    )?;

    engine.set_agent_status(AgentStatus::Online, None, false).await?;
    println!("  Back online: available={}", engine.is_agent_available());
    engine.end_wrapup();
    Ok(())
}

async fn run_backend_failures() -> ScenarioResult<()> {
    let rejecting = Desk::new("backend-reject", MockBackend::new(RegistrationMode::Reject))?;
    println!("  Registration rejected:");
    let rejection = expect_rejection(
        "registration rejected",
        rejecting
            .engine
            .start_inbound_call(BILLING_CALLER, CallAttributes::default())
            .await,
    )?;
    if !matches!(rejection, CallsimError::ExternalServiceFailure { .. }) {
        return Err(ScenarioError::unexpected("registration rejected", rejection.to_string()));
    }
    let active = rejecting.engine.get_active_calls().await?;
    println!("  Active legs: {}", active.active_calls.len());

    let declining = Desk::new("backend-decline", MockBackend::new(RegistrationMode::Decline))?;
    let started = declining
        .engine
        .start_inbound_call(BILLING_CALLER, CallAttributes::default())
        .await?;
    println!("  Registration declined: local id {}", started.call.call_id);
    println!("  Requests seen by backend: {}", declining.backend.requests().len());
    declining.engine.hangup().await?;
    declining.engine.end_wrapup();

    let refusing = Desk::new("tenant-refused", MockBackend::default().refusing_tenant())?;
    println!("  Tenant configuration refused:");
    expect_rejection("tenant refused", refusing.engine.init(&call_center_config()).await)?;

    let login = Desk::new("login-page", MockBackend::default())?;
    login.engine.show_login_page(true);
    let init = login.engine.init(&call_center_config()).await?;
    println!(
        "  Login page requested: height {}",
        init.login_frame_height.unwrap_or_default()
    );
    login.engine.subsystem_login_result(true)?;
    println!("  Logged in:  {}", login.engine.is_logged_in());
    login.engine.logout().await?;
    println!("  Logged out: {}", !login.engine.is_logged_in());
    login.expect_count("login", EventType::LoginResult, 1)?;
    Ok(())
}
