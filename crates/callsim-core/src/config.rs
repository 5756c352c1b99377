//! TOML loading for `EngineConfig`.
//!
//! `EngineConfig` lives in `callsim-contracts`; the loaders are provided
//! through the `EngineConfigExt` trait so callers can still write
//! `EngineConfig::from_toml_str(..)` with the trait in scope.

use std::path::Path;

use callsim_contracts::{
    config::EngineConfig,
    error::{CallsimError, CallsimResult},
};

pub trait EngineConfigExt: Sized {
    /// Parse `s` as TOML engine configuration.
    ///
    /// Returns `CallsimError::ConfigError` if the TOML is malformed, does
    /// not match the `EngineConfig` schema, or lists a directory entry with
    /// neither an id nor a phone number.
    fn from_toml_str(s: &str) -> CallsimResult<Self>;

    /// Read the file at `path` and parse it as TOML engine configuration.
    fn from_file(path: &Path) -> CallsimResult<Self>;
}

impl EngineConfigExt for EngineConfig {
    fn from_toml_str(s: &str) -> CallsimResult<Self> {
        let config: EngineConfig = toml::from_str(s).map_err(|e| CallsimError::ConfigError {
            reason: format!("failed to parse engine TOML: {}", e),
        })?;

        if let Some(index) = config
            .phone_contacts
            .iter()
            .position(|contact| contact.id.is_none() && contact.phone_number.is_none())
        {
            return Err(CallsimError::ConfigError {
                reason: format!("phone contact #{} has neither an id nor a phone number", index),
            });
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> CallsimResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| CallsimError::ConfigError {
            reason: format!("failed to read engine config '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }
}
