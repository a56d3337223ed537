use serde::{Deserialize, Serialize};

/// Body of `PUT /pipelines/{id}` when only the workflow is replaced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePipelineYaml {
    pub workflow_yaml: String,
}
