//! Orchestrator seam
//!
//! The observer never talks to the cluster directly. It goes through this
//! trait so the control plane can be swapped for a stub in tests.

use async_trait::async_trait;
use xcoding_core::domain::unit::UnitStatus;

use crate::error::OrchestratorResult;

/// Cluster operations used by the observer
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Lists unit names in a namespace, optionally filtered by a label selector
    async fn list_units(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> OrchestratorResult<Vec<String>>;

    /// Fetches the status document of a unit
    async fn describe_unit(&self, namespace: &str, unit: &str) -> OrchestratorResult<UnitStatus>;

    /// Opens a follow-mode log connection to one container of a unit
    async fn follow_logs(
        &self,
        namespace: &str,
        unit: &str,
        container: &str,
    ) -> OrchestratorResult<Box<dyn LogSource>>;
}

/// A live, append-only feed of log lines
///
/// Dropping the source closes the underlying connection.
#[async_trait]
pub trait LogSource: Send {
    /// Waits for the next line
    ///
    /// Returns `Ok(None)` once the connection closed because the container
    /// terminated, and an error when it dropped for any other reason.
    /// Must be cancel safe: a call abandoned mid-line loses no data.
    async fn next_line(&mut self) -> OrchestratorResult<Option<String>>;
}
