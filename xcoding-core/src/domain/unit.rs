//! Execution unit status
//!
//! A narrow view of the orchestrator's unit description. Only the container
//! statuses are read; everything else in the document is ignored.

use serde::{Deserialize, Serialize};

/// Status of an execution unit as reported by `describeUnit`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStatus {
    #[serde(default)]
    pub status: UnitStatusBody,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitStatusBody {
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub container_statuses: Vec<ContainerStatus>,
}

/// Status of one container inside a unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStatus {
    pub name: String,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub state: ContainerState,
}

/// Container state; at most one of the variants is normally present
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerState {
    #[serde(default)]
    pub running: Option<serde_json::Value>,
    #[serde(default)]
    pub waiting: Option<serde_json::Value>,
    #[serde(default)]
    pub terminated: Option<serde_json::Value>,
}

impl UnitStatus {
    /// Parses a unit description document
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Finds the status of a named container
    pub fn container(&self, name: &str) -> Option<&ContainerStatus> {
        self.status
            .container_statuses
            .iter()
            .find(|c| c.name == name)
    }

    /// Whether the named container's output can be read
    ///
    /// A container counts as readable as soon as it is running OR reports
    /// ready. Short-lived containers may exit before a readiness probe
    /// passes, so both signals are accepted.
    pub fn is_readable(&self, container: &str) -> bool {
        self.container(container)
            .map(ContainerStatus::is_readable)
            .unwrap_or(false)
    }
}

impl ContainerStatus {
    pub fn is_running(&self) -> bool {
        self.state.running.as_ref().is_some_and(|v| !v.is_null())
    }

    pub fn is_readable(&self) -> bool {
        self.is_running() || self.ready
    }
}
