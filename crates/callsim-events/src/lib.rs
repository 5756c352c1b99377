//! # callsim-events
//!
//! Event Publisher implementations for the callsim engine.
//!
//! ## Overview
//!
//! - [`InMemoryEventLog`]: sequenced, timestamped, inspectable record of
//!   every event a session published. Used by tests and the demo.
//! - [`ChannelPublisher`]: delivers events to live host subscribers over a
//!   tokio broadcast channel.
//! - [`FanoutPublisher`]: sends each event to several publishers.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use callsim_events::{ChannelPublisher, FanoutPublisher, InMemoryEventLog};
//!
//! let log = InMemoryEventLog::new("session-1");
//! let channel = ChannelPublisher::default();
//! let mut host = channel.subscribe();
//! let publisher = FanoutPublisher::new()
//!     .with(Arc::new(log.clone()))
//!     .with(Arc::new(channel));
//! // Pass `Arc::new(publisher)` to `TelephonyEngine::new(...)`.
//! ```

pub mod channel;
pub mod memory;
pub mod record;

pub use channel::{ChannelPublisher, FanoutPublisher};
pub use memory::InMemoryEventLog;
pub use record::{EventLog, RecordedEvent};

// ── Tests ─────────────────────────────────────────────────────────────────────
