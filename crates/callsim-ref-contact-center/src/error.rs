//! Errors raised while running a scripted scenario.

use thiserror::Error;

use callsim_contracts::error::CallsimError;

#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The engine failed an operation the script expected to succeed.
    #[error(transparent)]
    Engine(#[from] CallsimError),

    /// The engine accepted or produced something the script did not expect.
    #[error("{step}: {detail}")]
    Unexpected { step: &'static str, detail: String },
}

impl ScenarioError {
    pub fn unexpected(step: &'static str, detail: impl Into<String>) -> Self {
        Self::Unexpected { step, detail: detail.into() }
    }
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;
