//! # callsim-core
//!
//! The call/participant state machine and event-emission engine.
//!
//! This crate provides:
//! - The seam traits (`CapabilityGate`, `EventPublisher`, `TelephonyBackend`)
//! - The `CallRegistry` of active legs and the `WrapupManager`
//! - The `TelephonyEngine` and its typed `Command` surface
//! - TOML loading for `EngineConfig`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use callsim_core::{TelephonyEngine, traits::{CapabilityGate, EventPublisher, TelephonyBackend}};
//! ```

pub mod command;
pub mod config;
pub mod engine;
pub mod registry;
pub mod traits;
pub mod wrapup;

pub use command::{Command, CommandOutcome};
pub use config::EngineConfigExt;
pub use engine::TelephonyEngine;
