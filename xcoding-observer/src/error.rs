//! Error types for job observation

use std::time::Duration;
use thiserror::Error;

/// Failures reported by an [`Orchestrator`](crate::Orchestrator) implementation
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with code {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse output of `{command}`: {reason}")]
    Parse { command: String, reason: String },

    #[error("log stream read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for orchestrator calls
pub type OrchestratorResult<T> = std::result::Result<T, OrchestratorError>;

/// Errors produced while observing a job
#[derive(Debug, Error)]
pub enum ObserveError {
    /// No unit matched within the discovery budget
    #[error("unit not found: nothing labelled '{label}' after {attempts} attempt(s)")]
    DiscoveryFailed { label: String, attempts: u32 },

    /// The container never looked ready; streaming is still attempted
    #[error("container '{container}' of {unit} not observed ready within {waited:?}")]
    ReadinessTimedOut {
        unit: String,
        container: String,
        waited: Duration,
    },

    /// The log connection dropped before the container finished
    #[error("log stream of {unit} interrupted: {reason}")]
    StreamInterrupted { unit: String, reason: String },

    /// Repeated hard orchestrator failures with fail-fast enabled
    #[error("orchestrator unavailable: {0}")]
    Orchestrator(#[from] OrchestratorError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ObserveError {
    /// Whether the observation cannot continue past this error
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::ReadinessTimedOut { .. } | Self::StreamInterrupted { .. }
        )
    }
}
