//! `AgentConfigGate`: capability checks driven by the agent's configuration
//! flags.

use tracing::{debug, warn};

use callsim_contracts::{
    agent::AgentConfig,
    capability::{Capability, GatedOperation},
    error::{CallsimError, CallsimResult},
};
use callsim_core::traits::CapabilityGate;

/// The capability an operation depends on.
pub fn required_capability(operation: GatedOperation) -> Capability {
    match operation {
        GatedOperation::Mute | GatedOperation::Unmute => Capability::Mute,
        GatedOperation::Conference | GatedOperation::AddParticipant => Capability::Merge,
        GatedOperation::SwapCalls => Capability::Swap,
        GatedOperation::PauseRecording | GatedOperation::ResumeRecording => Capability::Record,
    }
}

/// Whether `config` enables `capability`.
pub fn is_enabled(capability: Capability, config: &AgentConfig) -> bool {
    match capability {
        Capability::Mute => config.has_mute,
        Capability::Merge => config.has_merge,
        Capability::Swap => config.has_swap,
        Capability::Record => config.has_record,
    }
}

/// Stateless gate reading the `has*` flags of the current `AgentConfig`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentConfigGate;

impl AgentConfigGate {
    pub fn new() -> Self {
        Self
    }
}

impl CapabilityGate for AgentConfigGate {
    /// Allow `operation` only if the capability it needs is switched on.
    ///
    /// Both directions of a toggle (mute and unmute, pause and resume
    /// recording) share one capability, so disabling it blocks both.
    fn check(&self, operation: GatedOperation, config: &AgentConfig) -> CallsimResult<()> {
        let capability = required_capability(operation);
        if is_enabled(capability, config) {
            debug!(operation = %operation, capability = %capability, "capability granted");
            Ok(())
        } else {
            warn!(operation = %operation, capability = %capability, "capability not supported");
            Err(CallsimError::CapabilityNotSupported { capability })
        }
    }
}
