//! Error types for deployment operations

use thiserror::Error;

/// Result type alias for deployment operations
pub type Result<T> = std::result::Result<T, DeployError>;

#[derive(Debug, Error)]
pub enum DeployError {
    /// A mandatory external step exited unsuccessfully
    #[error("{step} failed (exit code {code})")]
    StepFailed { step: String, code: i32 },

    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest {path}: {reason}")]
    Manifest { path: String, reason: String },

    #[error("namespace '{0}' does not exist")]
    NamespaceNotFound(String),

    #[error("unknown service '{0}'")]
    UnknownService(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
