//! Outbound event envelopes.
//!
//! `TelephonyEvent` serializes to the host envelope
//! `{ "eventType": "...", "payload": { ... } }`. The set of event types is
//! closed and each type has exactly one payload shape.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    call::CallId,
    result::{CallResult, GenericResult, HangupResult, ParticipantResult},
};

/// Discriminant of a `TelephonyEvent`, usable without matching the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    CallStarted,
    QueuedCallStarted,
    CallConnected,
    ParticipantConnected,
    ParticipantRemoved,
    Hangup,
    AfterCallWorkStarted,
    LoginResult,
    LogoutResult,
    Message,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventType::CallStarted => "CALL_STARTED",
            EventType::QueuedCallStarted => "QUEUED_CALL_STARTED",
            EventType::CallConnected => "CALL_CONNECTED",
            EventType::ParticipantConnected => "PARTICIPANT_CONNECTED",
            EventType::ParticipantRemoved => "PARTICIPANT_REMOVED",
            EventType::Hangup => "HANGUP",
            EventType::AfterCallWorkStarted => "AFTER_CALL_WORK_STARTED",
            EventType::LoginResult => "LOGIN_RESULT",
            EventType::LogoutResult => "LOGOUT_RESULT",
            EventType::Message => "MESSAGE",
        };
        f.write_str(name)
    }
}

/// Payload of `AFTER_CALL_WORK_STARTED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AfterCallWork {
    pub call_id: CallId,
}

/// One event delivered to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "eventType",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum TelephonyEvent {
    CallStarted(CallResult),
    QueuedCallStarted(CallResult),
    CallConnected(CallResult),
    ParticipantConnected(ParticipantResult),
    ParticipantRemoved(CallResult),
    Hangup(HangupResult),
    AfterCallWorkStarted(AfterCallWork),
    LoginResult(GenericResult),
    LogoutResult(GenericResult),
    Message(serde_json::Value),
}

impl TelephonyEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            TelephonyEvent::CallStarted(_) => EventType::CallStarted,
            TelephonyEvent::QueuedCallStarted(_) => EventType::QueuedCallStarted,
            TelephonyEvent::CallConnected(_) => EventType::CallConnected,
            TelephonyEvent::ParticipantConnected(_) => EventType::ParticipantConnected,
            TelephonyEvent::ParticipantRemoved(_) => EventType::ParticipantRemoved,
            TelephonyEvent::Hangup(_) => EventType::Hangup,
            TelephonyEvent::AfterCallWorkStarted(_) => EventType::AfterCallWorkStarted,
            TelephonyEvent::LoginResult(_) => EventType::LoginResult,
            TelephonyEvent::LogoutResult(_) => EventType::LogoutResult,
            TelephonyEvent::Message(_) => EventType::Message,
        }
    }
}
