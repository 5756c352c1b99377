//! Error types for the callsim engine.
//!
//! Every fallible operation returns `CallsimResult<T>`. Variants carry
//! structured context (participant type, call id, capability) and the
//! human-readable text is produced only by `Display`, so callers branch on
//! the variant rather than on message strings.

use std::fmt;

use thiserror::Error;

use crate::{
    call::{CallId, CallState, ParticipantType},
    capability::Capability,
};

/// What a failed call lookup was searching for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallLookup {
    /// There was no active call at all.
    Any,
    Participant(ParticipantType),
    CallId(CallId),
}

impl fmt::Display for CallLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallLookup::Any => f.write_str("couldn't find an active call"),
            CallLookup::Participant(participant) => {
                write!(f, "couldn't find an active call for participant {participant}")
            }
            CallLookup::CallId(id) => write!(f, "couldn't find an active call for callId {id}"),
        }
    }
}

/// Which kind of capacity the agent lacked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailability {
    Inbound { phone_number: String },
    Outbound,
    Transfer,
}

impl fmt::Display for Unavailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailability::Inbound { phone_number } => write!(
                f,
                "agent is not available for an inbound call from phoneNumber - {phone_number}"
            ),
            Unavailability::Outbound => {
                f.write_str("agent is not available for an outbound call: no outbound capacity")
            }
            Unavailability::Transfer => {
                f.write_str("agent is not available for a transfer call: no transfer capacity")
            }
        }
    }
}

/// The unified error type for the callsim engine.
#[derive(Debug, Error)]
pub enum CallsimError {
    /// No active leg matched the lookup.
    #[error("{0}")]
    CallNotFound(CallLookup),

    /// A leg with this id is already active.
    #[error("call id '{call_id}' is already active")]
    DuplicateCallId { call_id: CallId },

    /// The agent has no capacity for the requested call.
    #[error("{0}")]
    AgentUnavailable(Unavailability),

    /// The agent configuration disables the capability.
    #[error("capability '{capability}' is not supported")]
    CapabilityNotSupported { capability: Capability },

    /// The backend rejected a request. Never retried by the engine.
    #[error("external service failure: {reason}")]
    ExternalServiceFailure { reason: String },

    /// Error injection is enabled; every asynchronous operation fails.
    #[error("demo error")]
    InjectedFailure,

    /// The leg is not in a state the operation can start from.
    #[error("cannot {operation} call '{call_id}' in state {state}")]
    InvalidTransition {
        call_id: CallId,
        state: CallState,
        operation: &'static str,
    },

    /// Engine configuration is missing or malformed.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The event sink refused an event.
    #[error("event publish failed: {reason}")]
    PublishFailed { reason: String },
}

/// Convenience alias used throughout the callsim crates.
pub type CallsimResult<T> = Result<T, CallsimError>;
