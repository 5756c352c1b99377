//! Engine configuration types.
//!
//! `EngineConfig` is usually loaded from TOML by `callsim-core::config`;
//! every field has a default so an empty document is a valid configuration.
//!
//! Example:
//! ```toml
//! wrapup_delay_ms = 3000
//! initial_status = "ONLINE"
//! enqueued_status = "defer-until-idle"
//!
//! [agent_config]
//! has_mute = true
//! has_swap = false
//! selected_phone = { type = "DESK_PHONE", number = "555-0199" }
//!
//! [[phone_contacts]]
//! id = "queue-support"
//! type = "QUEUE"
//! label = "Support Queue"
//! ```

use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    agent::{AgentConfig, AgentStatus},
    contact::Contact,
};

/// How a status change queued with `enqueueNextState` behaves while calls
/// are still active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnqueuedStatusPolicy {
    /// Both the reported status and call availability change when the last
    /// active leg ends.
    #[default]
    DeferUntilIdle,
    /// Call availability changes immediately; the reported status still
    /// waits for the last active leg to end.
    GateImmediately,
}

/// Static configuration of one engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delay between the end of an interaction and `AFTER_CALL_WORK_STARTED`.
    pub wrapup_delay_ms: u64,
    /// Presence the agent starts with.
    pub initial_status: AgentStatus,
    /// Whether `init` asks the host to render the vendor login page.
    pub show_login_page: bool,
    /// Height reported to the host when the login page is shown.
    pub login_frame_height: u32,
    pub enqueued_status: EnqueuedStatusPolicy,
    pub agent_config: AgentConfig,
    /// Speed-dial directory, in display order.
    pub phone_contacts: Vec<Contact>,
}

impl EngineConfig {
    pub fn wrapup_delay(&self) -> Duration {
        Duration::from_millis(self.wrapup_delay_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            wrapup_delay_ms: 5_000,
            initial_status: AgentStatus::Online,
            show_login_page: false,
            login_frame_height: 350,
            enqueued_status: EnqueuedStatusPolicy::default(),
            agent_config: AgentConfig::default(),
            phone_contacts: Vec::new(),
        }
    }
}

/// Contact-center settings the host passes to `init`. Opaque to the engine;
/// forwarded to the backend for tenant configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallCenterConfig(pub BTreeMap<String, serde_json::Value>);

impl CallCenterConfig {
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }
}
