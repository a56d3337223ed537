//! XCoding CI Client
//!
//! A small, typed HTTP client for the CI pipeline service behind the API
//! gateway. It is the job submission side of the operator tooling: it can
//! replace a pipeline's workflow and trigger builds whose ids are then
//! handed to the log observer.
//!
//! # Example
//!
//! ```no_run
//! use xcoding_client::{CallerIdentity, CiClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = CiClient::new("http://localhost:31080", CallerIdentity::new(1067, "user2"));
//!
//!     let build = client.trigger_build(166).await?;
//!     println!("Triggered build: {:?}", build.numeric_id());
//!     Ok(())
//! }
//! ```

pub mod error;
mod pipelines;

pub use error::{ClientError, Result};
pub use xcoding_core::dto::build::Build;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use xcoding_core::domain::job::JobIdentifier;

/// Gateway address used when nothing else is configured
pub const DEFAULT_API_BASE: &str = "http://localhost:31080";

/// Caller identity forwarded to the CI service on every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: i64,
    pub username: String,
}

impl CallerIdentity {
    pub fn new(user_id: i64, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}

/// Anything that can submit a pipeline run and hand back its job id
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    /// Triggers a run of `pipeline_id` and returns the identifier of the new job
    async fn submit(&self, pipeline_id: i64) -> Result<JobIdentifier>;
}

/// HTTP client for the CI pipeline API
#[derive(Debug, Clone)]
pub struct CiClient {
    /// Base URL of the gateway (e.g., "http://localhost:31080")
    base_url: String,
    identity: CallerIdentity,
    /// HTTP client instance
    client: Client,
}

impl CiClient {
    /// Create a new CI client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the API gateway
    /// * `identity` - The user the requests are made on behalf of
    pub fn new(base_url: impl Into<String>, identity: CallerIdentity) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self::with_client(base_url, identity, client)
    }

    /// Create a new CI client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        identity: CallerIdentity,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            identity,
            client,
        }
    }

    /// Get the base URL of the gateway
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn identity(&self) -> &CallerIdentity {
        &self.identity
    }

    fn pipelines_url(&self, pipeline_id: i64) -> String {
        format!(
            "{}/ci_service/api/v1/pipelines/{}",
            self.base_url, pipeline_id
        )
    }

    /// Attach the caller identity headers
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-User-ID", self.identity.user_id.to_string())
            .header("X-Username", &self.identity.username)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

#[async_trait]
impl JobSubmitter for CiClient {
    async fn submit(&self, pipeline_id: i64) -> Result<JobIdentifier> {
        let build = self.trigger_build(pipeline_id).await?;
        build.job_identifier().ok_or_else(|| {
            ClientError::InvalidResponse(format!("build has no valid id: {}", build.id))
        })
    }
}
