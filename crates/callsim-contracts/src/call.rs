//! Call leg types.
//!
//! A `Call` is one leg of a conversation: the customer, a transferred third
//! party, or the agent's own leg in a conference. The engine owns every
//! active `Call`; callers only ever see clones.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contact::Contact;

/// Opaque, session-unique identifier for one call leg.
///
/// Either returned by the backend registration call (`voiceCallId`) or
/// generated locally when the backend declines to mint one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(pub String);

impl CallId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh identifier for a leg the backend did not register.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the leg came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallType {
    Inbound,
    Outbound,
    Callback,
}

/// Lifecycle state of a single leg.
///
/// ```text
/// RINGING ──accept──▶ CONNECTED ◀──resume── ON_HOLD
///    │                    │  └────hold──────▶   │
///    └──decline──▶ ENDED ◀┴──────end/hangup─────┘
/// CONNECTING ──connect──▶ CONNECTED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallState {
    Ringing,
    Connecting,
    Connected,
    OnHold,
    Ended,
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallState::Ringing => "RINGING",
            CallState::Connecting => "CONNECTING",
            CallState::Connected => "CONNECTED",
            CallState::OnHold => "ON_HOLD",
            CallState::Ended => "ENDED",
        };
        f.write_str(name)
    }
}

/// The role a leg plays relative to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantType {
    InitialCaller,
    ThirdParty,
    Agent,
}

impl fmt::Display for ParticipantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParticipantType::InitialCaller => "INITIAL_CALLER",
            ParticipantType::ThirdParty => "THIRD_PARTY",
            ParticipantType::Agent => "AGENT",
        };
        f.write_str(name)
    }
}

/// Per-leg flags reported alongside the state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallInfo {
    pub is_on_hold: bool,
    pub is_softphone_call: bool,
    pub is_recording_paused: bool,
    /// Refreshed on every state change of the leg.
    pub call_state_timestamp: DateTime<Utc>,
}

impl CallInfo {
    pub fn new(is_softphone_call: bool) -> Self {
        Self {
            is_on_hold: false,
            is_softphone_call,
            is_recording_paused: false,
            call_state_timestamp: Utc::now(),
        }
    }
}

impl Default for CallInfo {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Attributes supplied by whoever starts an inbound leg.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallAttributes {
    /// Defaults to `INITIAL_CALLER` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_type: Option<ParticipantType>,
}

impl CallAttributes {
    pub fn participant(participant_type: ParticipantType) -> Self {
        Self { participant_type: Some(participant_type) }
    }
}

/// Options accepted by `dial`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialOptions {
    /// True when the call is placed from the browser softphone; false for a
    /// desk phone that signals on its own.
    pub is_softphone_call: bool,
}

impl Default for DialOptions {
    fn default() -> Self {
        Self { is_softphone_call: true }
    }
}

/// One call leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub call_id: CallId,
    pub call_type: CallType,
    pub state: CallState,
    pub participant_type: ParticipantType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    pub call_info: CallInfo,
}

impl Call {
    /// Build a fresh leg in `state`.
    pub fn new(
        call_id: CallId,
        call_type: CallType,
        state: CallState,
        participant_type: ParticipantType,
    ) -> Self {
        Self {
            call_id,
            call_type,
            state,
            participant_type,
            phone_number: None,
            contact: None,
            call_info: CallInfo::default(),
        }
    }

    /// Move to `state` and stamp the transition time.
    pub fn transition(&mut self, state: CallState) {
        self.state = state;
        self.call_info.call_state_timestamp = Utc::now();
    }

    pub fn is_active(&self) -> bool {
        self.state != CallState::Ended
    }
}

/// How a caller refers to an active leg.
///
/// A full `Call` converts into `ById`: the id always takes precedence over
/// the role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallSelector {
    ById(CallId),
    ByParticipant(ParticipantType),
}

impl CallSelector {
    /// The implicit target when the host supplies no call at all.
    pub fn initial_caller() -> Self {
        Self::ByParticipant(ParticipantType::InitialCaller)
    }
}

impl From<&Call> for CallSelector {
    fn from(call: &Call) -> Self {
        Self::ById(call.call_id.clone())
    }
}

impl From<CallId> for CallSelector {
    fn from(id: CallId) -> Self {
        Self::ById(id)
    }
}

impl From<ParticipantType> for CallSelector {
    fn from(participant_type: ParticipantType) -> Self {
        Self::ByParticipant(participant_type)
    }
}
