//! Pipeline and build endpoints

use serde_json::json;
use tracing::{debug, info};
use xcoding_core::dto::build::{Build, TriggerBuildResponse};
use xcoding_core::dto::pipeline::UpdatePipelineYaml;

use crate::CiClient;
use crate::error::{ClientError, Result};

impl CiClient {
    /// Trigger a new build of a pipeline
    ///
    /// # Arguments
    /// * `pipeline_id` - The pipeline to run
    ///
    /// # Returns
    /// The build record created by the CI service
    pub async fn trigger_build(&self, pipeline_id: i64) -> Result<Build> {
        let url = format!("{}/builds", self.pipelines_url(pipeline_id));
        info!("POST {}", url);

        let response = self
            .authorize(self.client.post(&url))
            .json(&json!({}))
            .send()
            .await?;

        let body: TriggerBuildResponse = self.handle_response(response).await?;
        debug!("trigger build response: {:?}", body);

        let build = body
            .build
            .ok_or_else(|| ClientError::InvalidResponse("response has no build".to_string()))?;

        if build.numeric_id().is_none() {
            return Err(ClientError::InvalidResponse(format!(
                "build id is missing or not positive: {}",
                build.id
            )));
        }

        Ok(build)
    }

    /// Replace the workflow YAML of a pipeline
    ///
    /// # Arguments
    /// * `pipeline_id` - The pipeline to update
    /// * `workflow_yaml` - The complete new workflow document
    pub async fn update_pipeline_yaml(
        &self,
        pipeline_id: i64,
        workflow_yaml: impl Into<String>,
    ) -> Result<serde_json::Value> {
        let url = self.pipelines_url(pipeline_id);
        info!("PUT {}", url);

        let response = self
            .authorize(self.client.put(&url))
            .json(&UpdatePipelineYaml {
                workflow_yaml: workflow_yaml.into(),
            })
            .send()
            .await?;

        self.handle_response(response).await
    }
}
