//! Deployment configuration
//!
//! One record shared by every deploy routine instead of per-service literals.

use std::path::{Path, PathBuf};

use crate::error::{DeployError, Result};

/// Deployment configuration
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Repository root; docker builds run here
    pub project_root: PathBuf,

    /// Helm chart directory, relative to `project_root`
    pub chart_dir: PathBuf,

    /// Target namespace
    pub namespace: String,

    /// Helm release name
    pub release: String,

    /// Registry host images are tagged for (e.g. "localhost:31500")
    pub registry: String,

    /// Push images after building them
    pub push: bool,
}

impl DeployConfig {
    /// Creates a configuration rooted at `project_root` with defaults
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            chart_dir: PathBuf::from("deploy/xcoding"),
            namespace: "xcoding".to_string(),
            release: "xcoding".to_string(),
            registry: "localhost:31500".to_string(),
            push: true,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Recognised variables (all optional):
    /// - XCODING_ROOT (default: current directory)
    /// - REGISTRY (default: localhost:31500)
    /// - XCODING_NAMESPACE (default: xcoding)
    /// - XCODING_RELEASE (default: xcoding)
    pub fn from_env() -> Result<Self> {
        let root = match std::env::var("XCODING_ROOT") {
            Ok(root) => PathBuf::from(root),
            Err(_) => std::env::current_dir()?,
        };

        let mut config = Self::new(root);
        if let Ok(registry) = std::env::var("REGISTRY") {
            config.registry = registry;
        }
        if let Ok(namespace) = std::env::var("XCODING_NAMESPACE") {
            config.namespace = namespace;
        }
        if let Ok(release) = std::env::var("XCODING_RELEASE") {
            config.release = release;
        }

        Ok(config)
    }

    /// Absolute chart directory
    pub fn chart_path(&self) -> PathBuf {
        self.project_root.join(&self.chart_dir)
    }

    /// Resolves a path inside the chart
    pub fn chart_file(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.chart_path().join(relative)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(DeployError::InvalidConfig(
                "namespace cannot be empty".to_string(),
            ));
        }
        if self.release.is_empty() {
            return Err(DeployError::InvalidConfig(
                "release cannot be empty".to_string(),
            ));
        }
        if self.registry.is_empty() || self.registry.contains("://") {
            return Err(DeployError::InvalidConfig(
                "registry must be a bare host[:port]".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DeployConfig::new("/src/xcoding");
        assert_eq!(config.namespace, "xcoding");
        assert_eq!(config.registry, "localhost:31500");
        assert_eq!(config.chart_path(), PathBuf::from("/src/xcoding/deploy/xcoding"));
        assert!(config.push);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = DeployConfig::default();

        config.registry = "http://localhost:31500".to_string();
        assert!(config.validate().is_err());

        config.registry = "registry.local:5000".to_string();
        assert!(config.validate().is_ok());

        config.release = String::new();
        assert!(config.validate().is_err());
    }
}
