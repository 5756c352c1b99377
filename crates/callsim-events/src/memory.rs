//! In-memory implementation of `EventPublisher`.
//!
//! `InMemoryEventLog` keeps every published event in a `Vec` behind a
//! `Mutex`. Clones share the same log, so one clone can be handed to the
//! engine while another inspects what was published.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info};

use callsim_contracts::{
    error::{CallsimError, CallsimResult},
    event::{EventType, TelephonyEvent},
};
use callsim_core::traits::EventPublisher;

use crate::record::{EventLog, RecordedEvent};

// ── Internal mutable state ────────────────────────────────────────────────────

struct LogState {
    events: Vec<RecordedEvent>,
    sequence: u64,
}

// ── Public log ────────────────────────────────────────────────────────────────

/// A sequenced, inspectable event sink.
#[derive(Clone)]
pub struct InMemoryEventLog {
    session_id: String,
    state: Arc<Mutex<LogState>>,
}

impl InMemoryEventLog {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            state: Arc::new(Mutex::new(LogState { events: Vec::new(), sequence: 0 })),
        }
    }

    /// All events published so far, in order.
    pub fn events(&self) -> Vec<TelephonyEvent> {
        self.with_state(|state| state.events.iter().map(|r| r.event.clone()).collect())
    }

    /// Events of one type, in order.
    pub fn of_type(&self, event_type: EventType) -> Vec<TelephonyEvent> {
        self.with_state(|state| {
            state
                .events
                .iter()
                .filter(|r| r.event.event_type() == event_type)
                .map(|r| r.event.clone())
                .collect()
        })
    }

    pub fn count_of(&self, event_type: EventType) -> usize {
        self.with_state(|state| {
            state.events.iter().filter(|r| r.event.event_type() == event_type).count()
        })
    }

    /// The type of every event, in order.
    pub fn types(&self) -> Vec<EventType> {
        self.with_state(|state| state.events.iter().map(|r| r.event.event_type()).collect())
    }

    pub fn last(&self) -> Option<TelephonyEvent> {
        self.with_state(|state| state.events.last().map(|r| r.event.clone()))
    }

    pub fn len(&self) -> usize {
        self.with_state(|state| state.events.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Export a snapshot of the log with sequence numbers and timestamps.
    pub fn export(&self) -> EventLog {
        let events = self.with_state(|state| state.events.clone());
        info!(session_id = %self.session_id, event_count = events.len(), "event log exported");
        EventLog {
            session_id: self.session_id.clone(),
            events,
            exported_at: Utc::now(),
        }
    }

    /// Drop everything recorded so far and restart numbering.
    pub fn clear(&self) {
        self.with_state(|state| {
            state.events.clear();
            state.sequence = 0;
        })
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut LogState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state)
    }
}

// ── EventPublisher impl ───────────────────────────────────────────────────────

impl EventPublisher for InMemoryEventLog {
    /// Append the event with the next sequence number.
    ///
    /// Fails only if the log's mutex is poisoned.
    fn publish(&self, event: TelephonyEvent) -> CallsimResult<()> {
        let mut state = self.state.lock().map_err(|e| CallsimError::PublishFailed {
            reason: format!("event log lock poisoned: {}", e),
        })?;

        let sequence = state.sequence;
        debug!(
            session_id = %self.session_id,
            sequence,
            event_type = %event.event_type(),
            "event recorded"
        );
        state.events.push(RecordedEvent { sequence, recorded_at: Utc::now(), event });
        state.sequence += 1;
        Ok(())
    }
}
