//! Recorded event and exported log types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use callsim_contracts::event::TelephonyEvent;

/// One published event with its position in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Position in publish order, starting at 0.
    pub sequence: u64,

    /// When the publisher received the event.
    pub recorded_at: DateTime<Utc>,

    /// The envelope exactly as the host would receive it.
    pub event: TelephonyEvent,
}

/// Snapshot of everything a session published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    pub session_id: String,

    /// All events in publish order (sequence 0 first).
    pub events: Vec<RecordedEvent>,

    pub exported_at: DateTime<Utc>,
}

impl EventLog {
    /// Render the log as one JSON envelope per line.
    pub fn to_json_lines(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        for recorded in &self.events {
            out.push_str(&serde_json::to_string(recorded)?);
            out.push('\n');
        }
        Ok(out)
    }
}
