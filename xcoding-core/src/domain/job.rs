//! Job domain types

use serde::{Deserialize, Serialize};

/// Opaque identifier of a scheduled unit of work (e.g. a build number)
///
/// Issued by the job submission API and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobIdentifier(String);

impl JobIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Label value the executor stamps on the unit backing this job
    ///
    /// Follows the `<job-prefix>-<job_id>-<task-name>` convention, e.g.
    /// `build-166-job-1`.
    pub fn unit_label(&self, job_prefix: &str, task_name: &str) -> String {
        format!("{}-{}-{}", job_prefix, self.0, task_name)
    }
}

impl std::fmt::Display for JobIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobIdentifier {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobIdentifier {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<i64> for JobIdentifier {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// Name of the runtime unit (pod) backing a job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionUnitRef(String);

impl ExecutionUnitRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExecutionUnitRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
