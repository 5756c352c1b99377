//! Typed command surface.
//!
//! A host that speaks in messages rather than method calls sends a `Command`
//! and receives a `CommandOutcome`. Every variant maps onto exactly one
//! `TelephonyEngine` method, so error injection and capability gating apply
//! the same way on both paths.

use serde::{Deserialize, Serialize};
use tracing::debug;

use callsim_contracts::{
    agent::{AgentConfig, AgentConfigUpdate, AgentStatus, AgentStatusInfo},
    call::{CallAttributes, CallSelector, DialOptions, ParticipantType},
    config::CallCenterConfig,
    contact::{Contact, ContactFilter},
    error::CallsimResult,
    result::{
        ActiveCallsResult, CallResult, GenericResult, HangupResult, HoldToggleResult,
        InitResult, MuteToggleResult, ParticipantResult, PhoneContactsResult,
        RecordingToggleResult,
    },
};

use crate::engine::TelephonyEngine;

/// A host request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    Init { config: CallCenterConfig },
    GetActiveCalls,
    AcceptCall { call: Option<CallSelector> },
    DeclineCall { call: Option<CallSelector> },
    EndCall { call: CallSelector },
    Hangup,
    Mute,
    Unmute,
    Hold { call: Option<CallSelector> },
    Resume { call: Option<CallSelector> },
    PauseRecording { call: Option<CallSelector> },
    ResumeRecording { call: Option<CallSelector> },
    SwapCalls { call1: CallSelector, call2: CallSelector },
    Conference { calls: Vec<CallSelector> },
    SetAgentStatus {
        status: AgentStatus,
        info: Option<AgentStatusInfo>,
        #[serde(default)]
        enqueue_next_state: bool,
    },
    Dial {
        contact: Contact,
        #[serde(default)]
        options: DialOptions,
    },
    SendDigits { digits: String },
    GetPhoneContacts { filter: Option<ContactFilter> },
    AddParticipant {
        contact: Contact,
        call: CallSelector,
        #[serde(default)]
        is_blind_transfer: bool,
    },
    RemoveParticipant { participant_type: ParticipantType },
    Logout,
    GetAgentConfig,
    SetAgentConfig { update: AgentConfigUpdate },
    StartInboundCall {
        phone_number: String,
        #[serde(default)]
        attributes: CallAttributes,
    },
}

impl Command {
    /// The host-facing operation name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Init { .. } => "init",
            Command::GetActiveCalls => "getActiveCalls",
            Command::AcceptCall { .. } => "acceptCall",
            Command::DeclineCall { .. } => "declineCall",
            Command::EndCall { .. } => "endCall",
            Command::Hangup => "hangup",
            Command::Mute => "mute",
            Command::Unmute => "unmute",
            Command::Hold { .. } => "hold",
            Command::Resume { .. } => "resume",
            Command::PauseRecording { .. } => "pauseRecording",
            Command::ResumeRecording { .. } => "resumeRecording",
            Command::SwapCalls { .. } => "swapCalls",
            Command::Conference { .. } => "conference",
            Command::SetAgentStatus { .. } => "setAgentStatus",
            Command::Dial { .. } => "dial",
            Command::SendDigits { .. } => "sendDigits",
            Command::GetPhoneContacts { .. } => "getPhoneContacts",
            Command::AddParticipant { .. } => "addParticipant",
            Command::RemoveParticipant { .. } => "removeParticipant",
            Command::Logout => "logout",
            Command::GetAgentConfig => "getAgentConfig",
            Command::SetAgentConfig { .. } => "setAgentConfig",
            Command::StartInboundCall { .. } => "startInboundCall",
        }
    }
}

/// The typed result of a `Command`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandOutcome {
    Init(InitResult),
    ActiveCalls(ActiveCallsResult),
    Call(CallResult),
    Hangup(HangupResult),
    Mute(MuteToggleResult),
    Hold(HoldToggleResult),
    Recording(RecordingToggleResult),
    Participant(ParticipantResult),
    PhoneContacts(PhoneContactsResult),
    AgentConfig(AgentConfig),
    Generic(GenericResult),
}

impl TelephonyEngine {
    /// Run one host command.
    pub async fn execute(&self, command: Command) -> CallsimResult<CommandOutcome> {
        debug!(command = command.name(), "executing command");
        let outcome = match command {
            Command::Init { config } => CommandOutcome::Init(self.init(&config).await?),
            Command::GetActiveCalls => CommandOutcome::ActiveCalls(self.get_active_calls().await?),
            Command::AcceptCall { call } => CommandOutcome::Call(self.accept_call(call).await?),
            Command::DeclineCall { call } => CommandOutcome::Call(self.decline_call(call).await?),
            Command::EndCall { call } => CommandOutcome::Hangup(self.end_call(call).await?),
            Command::Hangup => CommandOutcome::Hangup(self.hangup().await?),
            Command::Mute => CommandOutcome::Mute(self.mute().await?),
            Command::Unmute => CommandOutcome::Mute(self.unmute().await?),
            Command::Hold { call } => CommandOutcome::Hold(self.hold(call).await?),
            Command::Resume { call } => CommandOutcome::Hold(self.resume(call).await?),
            Command::PauseRecording { call } => {
                CommandOutcome::Recording(self.pause_recording(call).await?)
            }
            Command::ResumeRecording { call } => {
                CommandOutcome::Recording(self.resume_recording(call).await?)
            }
            Command::SwapCalls { call1, call2 } => {
                CommandOutcome::Hold(self.swap_calls(call1, call2).await?)
            }
            Command::Conference { calls } => CommandOutcome::Hold(self.conference(calls).await?),
            Command::SetAgentStatus { status, info, enqueue_next_state } => CommandOutcome::Generic(
                self.set_agent_status(status, info, enqueue_next_state).await?,
            ),
            Command::Dial { contact, options } => {
                CommandOutcome::Call(self.dial(contact, options).await?)
            }
            Command::SendDigits { digits } => {
                self.send_digits(&digits).await?;
                CommandOutcome::Generic(GenericResult::ok())
            }
            Command::GetPhoneContacts { filter } => {
                CommandOutcome::PhoneContacts(self.get_phone_contacts(filter).await?)
            }
            Command::AddParticipant { contact, call, is_blind_transfer } => {
                CommandOutcome::Participant(
                    self.add_participant(contact, call, is_blind_transfer).await?,
                )
            }
            Command::RemoveParticipant { participant_type } => {
                CommandOutcome::Call(self.remove_participant(participant_type).await?)
            }
            Command::Logout => CommandOutcome::Generic(self.logout().await?),
            Command::GetAgentConfig => CommandOutcome::AgentConfig(self.get_agent_config().await?),
            Command::SetAgentConfig { update } => {
                CommandOutcome::Generic(self.set_agent_config(update).await?)
            }
            Command::StartInboundCall { phone_number, attributes } => {
                CommandOutcome::Call(self.start_inbound_call(phone_number, attributes).await?)
            }
        };
        Ok(outcome)
    }
}
