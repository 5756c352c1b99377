//! Contact-center reference runtime demo scenarios.
//!
//! Each scenario is a self-contained module that wires up the real callsim
//! components (engine, capability gate, event publishers) with the mock
//! backend and demonstrates a distinct part of the call lifecycle.

pub mod capability_and_faults;
pub mod inbound_call;
pub mod outbound_call;
pub mod warm_transfer;

use std::{sync::Arc, time::Duration};

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::warn;

use callsim_contracts::{
    config::EngineConfig,
    error::CallsimError,
    event::{EventType, TelephonyEvent},
};
use callsim_core::{EngineConfigExt, TelephonyEngine};
use callsim_events::{ChannelPublisher, FanoutPublisher, InMemoryEventLog};
use callsim_gate::AgentConfigGate;

use crate::{
    error::{ScenarioError, ScenarioResult},
    mock_data::MockBackend,
};

// ── Engine TOML ───────────────────────────────────────────────────────────────

pub const CONTACT_CENTER_CONFIG: &str = include_str!("../../config/contact-center.toml");

/// Slack added on top of the wrap-up delay before checking for the event.
const WRAPUP_SLACK: Duration = Duration::from_millis(50);

// ── Shared wiring ─────────────────────────────────────────────────────────────

/// One engine instance plus the handles a scenario inspects.
///
/// Events fan out to an in-memory log (for assertions) and a broadcast
/// channel standing in for the host's event subscription.
pub struct Desk {
    pub engine: TelephonyEngine,
    pub log: InMemoryEventLog,
    pub backend: MockBackend,
    host: broadcast::Receiver<TelephonyEvent>,
    wrapup_delay: Duration,
}

impl Desk {
    /// Wire an engine from the bundled contact-center configuration.
    pub fn new(session_id: &str, backend: MockBackend) -> ScenarioResult<Self> {
        let config = EngineConfig::from_toml_str(CONTACT_CENTER_CONFIG)?;
        Ok(Self::with_config(session_id, config, backend))
    }

    pub fn with_config(session_id: &str, config: EngineConfig, backend: MockBackend) -> Self {
        let log = InMemoryEventLog::new(session_id);
        let channel = ChannelPublisher::default();
        let host = channel.subscribe();
        let publisher = FanoutPublisher::new()
            .with(Arc::new(log.clone()))
            .with(Arc::new(channel));
        let wrapup_delay = config.wrapup_delay();

        let engine = TelephonyEngine::new(
            config,
            Arc::new(AgentConfigGate::new()),
            Arc::new(publisher),
            Arc::new(backend.clone()),
        );

        Self { engine, log, backend, host, wrapup_delay }
    }

    /// Sleep past the configured wrap-up delay.
    pub async fn wait_for_wrapup(&self) {
        tokio::time::sleep(self.wrapup_delay + WRAPUP_SLACK).await;
    }

    /// Everything the host subscription received since the last call.
    pub fn drain_host(&mut self) -> Vec<TelephonyEvent> {
        let mut received = Vec::new();
        loop {
            match self.host.try_recv() {
                Ok(event) => received.push(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "host subscription lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        received
    }

    /// Fail the step unless exactly `expected` events of `event_type` have
    /// been published.
    pub fn expect_count(
        &self,
        step: &'static str,
        event_type: EventType,
        expected: usize,
    ) -> ScenarioResult<()> {
        let actual = self.log.count_of(event_type);
        if actual != expected {
            return Err(ScenarioError::unexpected(
                step,
                format!("expected {expected} {event_type} event(s), saw {actual}"),
            ));
        }
        Ok(())
    }

    /// Print the event types published so far on one line.
    pub fn print_events(&self) {
        let types: Vec<String> = self.log.types().iter().map(|t| t.to_string()).collect();
        println!("  Events:     [{}]", types.join(", "));
    }
}

/// Unwrap an operation the script expects the engine to reject, printing
/// the rejection. A success is reported as a failed step.
pub fn expect_rejection<T: std::fmt::Debug>(
    step: &'static str,
    result: Result<T, CallsimError>,
) -> ScenarioResult<CallsimError> {
    match result {
        Err(err) => {
            println!("  Rejected:   {err}");
            Ok(err)
        }
        Ok(value) => Err(ScenarioError::unexpected(
            step,
            format!("expected a rejection, got {value:?}"),
        )),
    }
}
