//! # callsim-contracts
//!
//! Shared types for the callsim telephony engine: call legs, agent
//! configuration, directory contacts, results, event envelopes and errors.
//!
//! All crates in the workspace import from here. No engine logic lives in
//! this crate, only data definitions and small helpers on them.

pub mod agent;
pub mod call;
pub mod capability;
pub mod config;
pub mod contact;
pub mod error;
pub mod event;
pub mod result;
