//! # callsim-ref-contact-center
//!
//! Contact-center reference runtime for the callsim telephony engine.
//!
//! Demonstrates four agent-desktop scenarios using mock data:
//!
//! 1. **Inbound Call**: backend registration, accept, hold, mute, recording,
//!    hangup and the delayed after-call-work event.
//! 2. **Outbound Call**: the single outbound slot, remote answer, cancelled
//!    wrap-up, desk-phone dialing and a customer callback.
//! 3. **Warm Transfer**: consult a supervisor, swap, conference, drop the
//!    consult leg, then a blind transfer.
//! 4. **Capabilities and Faults**: disabled capabilities, injected errors,
//!    a queued status change and backend failures.
//!
//! All data is hardcoded and fictional. No external services are contacted.

pub mod error;
pub mod mock_data;
pub mod scenarios;

pub use error::{ScenarioError, ScenarioResult};
