//! Simulated contact-center data for the callsim reference runtime.
//!
//! All numbers and names in this module are fictional (555-01xx range). No
//! external systems are contacted: `MockBackend` stands in for the vendor's
//! call-registration and tenant-configuration service.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use tracing::debug;

use callsim_contracts::{config::CallCenterConfig, contact::Contact};
use callsim_core::traits::{
    BackendError, RegistrationRequest, RegistrationResponse, TelephonyBackend,
};

// ── Callers (mock) ────────────────────────────────────────────────────────────

/// A customer calling in about a billing question.
pub const BILLING_CALLER: &str = "555-0100";

/// A customer whose outbound follow-up is scheduled.
pub const FOLLOW_UP_CUSTOMER: &str = "555-0200";

/// A second customer, used to show the single outbound slot.
pub const SECOND_CUSTOMER: &str = "555-0201";

/// A customer who asked to be called back.
pub const CALLBACK_CUSTOMER: &str = "555-0400";

/// The supervisor a call is escalated to.
pub fn supervisor() -> Contact {
    Contact {
        id: Some("agent-rivera".to_string()),
        phone_number: Some("555-0142".to_string()),
        label: Some("Supervisor (Rivera)".to_string()),
        ..Contact::default()
    }
}

/// Tenant settings sent during `init`.
pub fn call_center_config() -> CallCenterConfig {
    CallCenterConfig::default()
        .with("tenantId", "demo-tenant-001")
        .with("region", "us-west")
        .with("reqHvcc", false)
}

// ── Backend (mock) ────────────────────────────────────────────────────────────

/// How the mock backend answers call registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationMode {
    /// Mint sequential `VC-0001`, `VC-0002`, ... ids.
    #[default]
    Mint,
    /// Answer `success: false`; the engine falls back to a local id.
    Decline,
    /// Fail the request outright.
    Reject,
}

/// In-process stand-in for the vendor backend.
///
/// Clones share the request log, so a scenario can keep one handle for
/// inspection after handing another to the engine.
#[derive(Clone, Default)]
pub struct MockBackend {
    mode: RegistrationMode,
    refuse_tenant: bool,
    next_id: Arc<AtomicU64>,
    requests: Arc<Mutex<Vec<RegistrationRequest>>>,
}

impl MockBackend {
    pub fn new(mode: RegistrationMode) -> Self {
        Self { mode, ..Self::default() }
    }

    /// Make `configure_tenant` answer `success: false`.
    pub fn refusing_tenant(mut self) -> Self {
        self.refuse_tenant = true;
        self
    }

    /// Every registration request received so far.
    pub fn requests(&self) -> Vec<RegistrationRequest> {
        self.requests.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl TelephonyBackend for MockBackend {
    async fn register_call(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationResponse, BackendError> {
        debug!(phone_number = %request.phone_number, mode = ?self.mode, "mock registration");
        self.requests.lock().unwrap_or_else(|p| p.into_inner()).push(request);
        match self.mode {
            RegistrationMode::Mint => {
                let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(RegistrationResponse::VoiceCallId(format!("VC-{n:04}")))
            }
            RegistrationMode::Decline => Ok(RegistrationResponse::Unavailable),
            RegistrationMode::Reject => Err(BackendError::new("voice call service unavailable")),
        }
    }

    async fn configure_tenant(&self, config: &CallCenterConfig) -> Result<bool, BackendError> {
        debug!(keys = config.0.len(), "mock tenant configuration");
        Ok(!self.refuse_tenant)
    }
}
