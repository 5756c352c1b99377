//! Core trait definitions for the callsim engine.
//!
//! These three traits are the engine's only seams to the outside:
//!
//! - `CapabilityGate`: permission check run before gated call control
//! - `EventPublisher`: sink for every outbound `TelephonyEvent`
//! - `TelephonyBackend`: remote service that mints call ids and configures
//!   the tenant
//!
//! The engine calls the gate and the publisher synchronously. The backend is
//! the only asynchronous collaborator.

use async_trait::async_trait;
use thiserror::Error;

use callsim_contracts::{
    agent::AgentConfig,
    call::CallAttributes,
    capability::GatedOperation,
    config::CallCenterConfig,
    error::CallsimResult,
    event::TelephonyEvent,
};

/// Decides whether a gated operation is enabled for the agent.
///
/// Implementations must be stateless with respect to calls: they see only
/// the operation and the current `AgentConfig`. The engine runs the check
/// before resolving or mutating any call.
pub trait CapabilityGate: Send + Sync {
    /// Return `Ok(())` if `operation` is allowed under `config`, otherwise
    /// `CallsimError::CapabilityNotSupported` naming the missing capability.
    fn check(&self, operation: GatedOperation, config: &AgentConfig) -> CallsimResult<()>;
}

/// Delivers events to the host.
///
/// Called after the engine has released its state lock, in the order the
/// mutations happened. A failed publish is logged by the engine and the
/// operation still returns its result; the state change that produced the
/// event stands. Only `publish_message`, which changes nothing, reports the
/// failure to its caller.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: TelephonyEvent) -> CallsimResult<()>;
}

/// Request sent to the backend when an inbound leg starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub phone_number: String,
    pub attributes: CallAttributes,
}

/// What the backend answered to a registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationResponse {
    /// The backend minted an id for the leg.
    VoiceCallId(String),
    /// The backend answered but declined to mint an id (`success: false`).
    Unavailable,
}

/// A transport-level or server-side rejection from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct BackendError {
    pub reason: String,
}

impl BackendError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// The remote telephony service.
///
/// The engine never retries a failed request.
#[async_trait]
pub trait TelephonyBackend: Send + Sync {
    /// Register a new inbound leg and obtain its `voiceCallId`.
    async fn register_call(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationResponse, BackendError>;

    /// Push contact-center settings to the tenant. `Ok(false)` means the
    /// backend answered but refused the configuration.
    async fn configure_tenant(&self, config: &CallCenterConfig) -> Result<bool, BackendError>;
}
