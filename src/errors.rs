//! Error types for the swarm gate.
//!
//! A denied validation decision is not an error; it is reported through
//! [`GateOutcome::Denied`](crate::gate::GateOutcome). Everything in here
//! stops the run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    /// Missing or invalid configuration. Raised before any network call.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport-level failure talking to MachineID or the agent backend.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote answered with a non-2xx status.
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// A 2xx response whose body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The delegated workload failed after the gate allowed it.
    #[error("workload failed: {0}")]
    Workload(String),
}

impl GateError {
    /// True for failures that happened before any request was sent.
    pub fn is_config(&self) -> bool {
        matches!(self, GateError::Config(_))
    }
}

impl From<config::ConfigError> for GateError {
    fn from(e: config::ConfigError) -> Self {
        GateError::Config(e.to_string())
    }
}

pub type GateResult<T> = Result<T, GateError>;
