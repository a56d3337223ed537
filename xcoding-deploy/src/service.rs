//! Deployable services
//!
//! Static description of every service the chart ships: where its
//! Dockerfile and manifest live and how the manifest carries the image.

use crate::config::DeployConfig;
use crate::error::{DeployError, Result};

/// How a service's manifest references its image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestPatch {
    /// `spec.template.spec.containers[name == container].image` in a Deployment
    ContainerImage { container: &'static str },
    /// Every `image:` line of the file, keeping the file otherwise untouched
    ImageLines,
    /// `<section>.image.{repository,tag}` in the chart values
    HelmValues { section: &'static str },
}

/// A deployable service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    /// Name used on the command line
    pub name: &'static str,
    /// Image repository name under the registry
    pub image: &'static str,
    /// Dockerfile path relative to the project root
    pub dockerfile: &'static str,
    /// Manifest path relative to the chart directory
    pub manifest: &'static str,
    /// Value of the `app.kubernetes.io/component` label
    pub component: &'static str,
    pub patch: ManifestPatch,
}

/// Services deployed by `deploy-all`, in order
pub const DEPLOY_ALL_ORDER: &[&str] = &[
    "user",
    "project",
    "code-repository",
    "artifact",
    "ci-pipeline",
];

pub const CATALOG: &[ServiceSpec] = &[
    ServiceSpec {
        name: "user",
        image: "user-service",
        dockerfile: "apps/user/Dockerfile",
        manifest: "templates/services/user/deployment.yaml",
        component: "user",
        patch: ManifestPatch::ContainerImage { container: "user" },
    },
    ServiceSpec {
        name: "project",
        image: "project-service",
        dockerfile: "apps/project/Dockerfile",
        manifest: "templates/services/project/deployment.yaml",
        component: "project",
        patch: ManifestPatch::ImageLines,
    },
    ServiceSpec {
        name: "code-repository",
        image: "code-repository-service",
        dockerfile: "apps/code_repository/Dockerfile",
        manifest: "templates/services/code_repository/deployment.yaml",
        component: "code-repository",
        patch: ManifestPatch::ContainerImage {
            container: "code-repository",
        },
    },
    ServiceSpec {
        name: "artifact",
        image: "artifact-service",
        dockerfile: "apps/artifact/Dockerfile",
        manifest: "templates/services/artifact/deployment.yaml",
        component: "artifact",
        patch: ManifestPatch::ContainerImage {
            container: "artifact",
        },
    },
    ServiceSpec {
        name: "ci-pipeline",
        image: "ci-pipeline-service",
        dockerfile: "apps/ci/pipeline_service/Dockerfile",
        manifest: "templates/services/ci/deployment.yaml",
        component: "ci-pipeline",
        patch: ManifestPatch::ContainerImage {
            container: "ci-pipeline",
        },
    },
    ServiceSpec {
        name: "ci-executor",
        image: "ci-executor-service",
        dockerfile: "apps/ci/executor_service/Dockerfile",
        manifest: "templates/services/executor_service/deployment.yaml",
        component: "ci-executor",
        patch: ManifestPatch::ImageLines,
    },
    ServiceSpec {
        name: "frontend",
        image: "frontend",
        dockerfile: "apps/frontend/Dockerfile",
        manifest: "values.yaml",
        component: "frontend",
        patch: ManifestPatch::HelmValues {
            section: "frontend",
        },
    },
];

impl ServiceSpec {
    /// Looks a service up by its command-line name
    pub fn find(name: &str) -> Result<&'static ServiceSpec> {
        CATALOG
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| DeployError::UnknownService(name.to_string()))
    }

    pub fn names() -> Vec<&'static str> {
        CATALOG.iter().map(|s| s.name).collect()
    }

    /// `<registry>/<image>` without a tag
    pub fn repository(&self, config: &DeployConfig) -> String {
        format!("{}/{}", config.registry, self.image)
    }

    /// Full image reference for a tag
    pub fn image_ref(&self, config: &DeployConfig, tag: &ImageTag) -> String {
        format!("{}:{}", self.repository(config), tag)
    }

    /// Label selector matching the service's pods
    pub fn selector(&self) -> String {
        format!("app.kubernetes.io/component={}", self.component)
    }
}

/// An image tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTag(String);

impl ImageTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Random 8-character lowercase alphanumeric tag
    pub fn generate() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        Self(hex[..8].to_string())
    }

    /// UTC timestamp tag (`YYYYmmddHHMMSS`)
    pub fn timestamp() -> Self {
        Self(chrono::Utc::now().format("%Y%m%d%H%M%S").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_service() {
        let spec = ServiceSpec::find("ci-pipeline").unwrap();
        assert_eq!(spec.image, "ci-pipeline-service");
        assert_eq!(spec.selector(), "app.kubernetes.io/component=ci-pipeline");

        assert!(matches!(
            ServiceSpec::find("billing"),
            Err(DeployError::UnknownService(_))
        ));
    }

    #[test]
    fn test_image_ref() {
        let config = DeployConfig::default();
        let spec = ServiceSpec::find("user").unwrap();
        assert_eq!(
            spec.image_ref(&config, &ImageTag::new("abc12345")),
            "localhost:31500/user-service:abc12345"
        );
    }

    #[test]
    fn test_generated_tag_shape() {
        let tag = ImageTag::generate();
        assert_eq!(tag.as_str().len(), 8);
        assert!(
            tag.as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
        assert_eq!(ImageTag::timestamp().as_str().len(), 14);
    }

    #[test]
    fn test_deploy_all_order_is_in_catalog() {
        for name in DEPLOY_ALL_ORDER {
            assert!(ServiceSpec::find(name).is_ok());
        }
    }
}
