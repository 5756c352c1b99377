//! # callsim-gate
//!
//! The Capability Gate for the callsim engine.
//!
//! [`AgentConfigGate`] implements
//! [`CapabilityGate`](callsim_core::traits::CapabilityGate). Each gated
//! operation maps to one capability, and each capability to one flag of the
//! agent's `AgentConfig`:
//!
//! | operation                          | capability | flag        |
//! |------------------------------------|------------|-------------|
//! | mute, unmute                       | `mute`     | `hasMute`   |
//! | conference, warm transfer          | `merge`    | `hasMerge`  |
//! | swapCalls                          | `swap`     | `hasSwap`   |
//! | pauseRecording, resumeRecording    | `record`   | `hasRecord` |
//!
//! The gate never looks at calls; it runs before the engine touches any.

pub mod gate;

pub use gate::AgentConfigGate;
