//! Agent presence and configuration types.

use serde::{Deserialize, Serialize};

/// Coarse presence reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    Online,
    Offline,
}

impl AgentStatus {
    /// Whether this presence lets new calls reach the agent.
    pub fn is_available(self) -> bool {
        matches!(self, AgentStatus::Online)
    }
}

/// Optional detail the host attaches to a status change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatusInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_api_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_name: Option<String>,
}

/// Status plus the optional detail that came with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPresence {
    pub status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<AgentStatusInfo>,
}

impl AgentPresence {
    pub fn new(status: AgentStatus) -> Self {
        Self { status, info: None }
    }
}

/// The device the agent answers on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhoneType {
    SoftPhone,
    DeskPhone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone {
    #[serde(rename = "type")]
    pub phone_type: PhoneType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
}

impl Phone {
    pub fn soft_phone() -> Self {
        Self { phone_type: PhoneType::SoftPhone, number: None }
    }

    pub fn desk_phone(number: impl Into<String>) -> Self {
        Self { phone_type: PhoneType::DeskPhone, number: Some(number.into()) }
    }
}

/// Per-agent feature switches read by the capability gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    #[serde(alias = "has_mute")]
    pub has_mute: bool,
    #[serde(alias = "has_merge")]
    pub has_merge: bool,
    #[serde(alias = "has_record")]
    pub has_record: bool,
    #[serde(alias = "has_swap")]
    pub has_swap: bool,
    #[serde(alias = "selected_phone")]
    pub selected_phone: Phone,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            has_mute: true,
            has_merge: true,
            has_record: true,
            has_swap: true,
            selected_phone: Phone::soft_phone(),
        }
    }
}

/// A partial phone change. An absent `phone_type` means "keep the current
/// type".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneUpdate {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub phone_type: Option<PhoneType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
}

impl From<Phone> for PhoneUpdate {
    fn from(phone: Phone) -> Self {
        Self { phone_type: Some(phone.phone_type), number: phone.number }
    }
}

/// A partial `AgentConfig`; only the fields present are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_mute: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_merge: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_record: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_swap: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_phone: Option<PhoneUpdate>,
}

impl AgentConfig {
    /// Merge `update` into this configuration.
    ///
    /// A phone update whose type is absent or equal to the current type keeps
    /// the type and replaces only the number; a different type replaces the
    /// whole phone, dropping the old number.
    pub fn apply(&mut self, update: AgentConfigUpdate) {
        if let Some(v) = update.has_mute {
            self.has_mute = v;
        }
        if let Some(v) = update.has_merge {
            self.has_merge = v;
        }
        if let Some(v) = update.has_record {
            self.has_record = v;
        }
        if let Some(v) = update.has_swap {
            self.has_swap = v;
        }
        if let Some(phone) = update.selected_phone {
            match phone.phone_type {
                Some(phone_type) if phone_type != self.selected_phone.phone_type => {
                    self.selected_phone = Phone { phone_type, number: phone.number };
                }
                _ => self.selected_phone.number = phone.number,
            }
        }
    }
}
