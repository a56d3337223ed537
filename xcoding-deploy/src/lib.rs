//! XCoding Deploy
//!
//! Deployment routines for the XCoding services. Every service goes through
//! the same steps, parameterised by a [`ServiceSpec`] and one shared
//! [`DeployConfig`]:
//!
//! 1. Patch the service's manifest with the new image reference
//! 2. Build and push the container image
//! 3. Install or upgrade the Helm release
//! 4. Show pod/service status and recent logs
//!
//! Cluster housekeeping (job cleanup, port forwarding) lives here too.
//! All external tools are invoked through [`CommandRunner`].

pub mod cleanup;
pub mod config;
pub mod deployer;
pub mod error;
pub mod forward;
pub mod manifest;
pub mod runner;
pub mod service;

pub use cleanup::{CleanupReport, JobCleaner};
pub use config::DeployConfig;
pub use deployer::{DeploySummary, Deployer};
pub use error::{DeployError, Result};
pub use runner::{Cmd, CommandOutput, CommandRunner, SystemRunner};
pub use service::{ImageTag, ManifestPatch, ServiceSpec};
