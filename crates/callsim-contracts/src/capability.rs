//! Capability types checked before gated call-control operations.
//!
//! Capabilities come from the agent's `AgentConfig` flags. They are only ever
//! changed by an explicit config update, never as a side effect of a call
//! operation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A configurable call-control feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Mute,
    Merge,
    Swap,
    Record,
}

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Capability::Mute => "mute",
            Capability::Merge => "merge",
            Capability::Swap => "swap",
            Capability::Record => "record",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operations that must pass the capability gate before touching state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GatedOperation {
    Mute,
    Unmute,
    Conference,
    /// Warm transfer, which merges the new leg into the conversation.
    AddParticipant,
    SwapCalls,
    PauseRecording,
    ResumeRecording,
}

impl fmt::Display for GatedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GatedOperation::Mute => "mute",
            GatedOperation::Unmute => "unmute",
            GatedOperation::Conference => "conference",
            GatedOperation::AddParticipant => "addParticipant",
            GatedOperation::SwapCalls => "swapCalls",
            GatedOperation::PauseRecording => "pauseRecording",
            GatedOperation::ResumeRecording => "resumeRecording",
        };
        f.write_str(name)
    }
}
