//! Typed results returned by engine operations.
//!
//! Several of these also travel as event payloads (`CallResult` for
//! `CALL_STARTED`, `HangupResult` for `HANGUP`, ...), so they serialize with
//! the host's camelCase field names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    call::{Call, CallId, CallInfo},
    contact::Contact,
};

/// Snapshot of the active call set, keyed by id.
pub type ActiveCalls = BTreeMap<CallId, Call>;

/// A single leg, as it looked right after the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResult {
    pub call: Call,
}

/// Every leg an end/hangup operation took down, in the order they were
/// created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HangupResult {
    pub calls: Vec<Call>,
}

/// Hold state of the customer and third-party legs after a hold, resume,
/// swap or conference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldToggleResult {
    pub is_customer_on_hold: bool,
    pub is_third_party_on_hold: bool,
    pub calls: ActiveCalls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MuteToggleResult {
    pub is_muted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingToggleResult {
    pub call_id: CallId,
    pub is_recording_paused: bool,
}

/// Outcome of adding (or connecting) a third-party leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantResult {
    /// The new third-party leg.
    pub call_id: CallId,
    /// The original caller's number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub call_info: CallInfo,
    pub initial_call_has_ended: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCallsResult {
    pub active_calls: ActiveCalls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericResult {
    pub success: bool,
}

impl GenericResult {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneContactsResult {
    pub contacts: Vec<Contact>,
}

/// Returned by `init`: whether the host must show the vendor login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitResult {
    pub show_login: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_frame_height: Option<u32>,
}
