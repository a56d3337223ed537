//! Configuration module
//!
//! Settings shared by every subcommand. Values left unset here fall through
//! to the environment-driven defaults of the library configs.

use anyhow::Result;
use xcoding_deploy::DeployConfig;
use xcoding_observer::ObserverConfig;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Cluster namespace, when given by flag or `POD_NAMESPACE`
    pub namespace: Option<String>,

    /// Base URL of the API gateway
    pub api_base: String,
}

impl Config {
    /// Observer settings from the environment, scoped to the CLI namespace
    pub fn observer_config(&self) -> ObserverConfig {
        self.scope_observer(ObserverConfig::from_env())
    }

    /// Deploy settings from the environment, scoped to the CLI namespace
    pub fn deploy_config(&self) -> Result<DeployConfig> {
        let config = self.scope_deploy(DeployConfig::from_env()?);
        config.validate()?;
        Ok(config)
    }

    fn scope_observer(&self, mut config: ObserverConfig) -> ObserverConfig {
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        config
    }

    fn scope_deploy(&self, mut config: DeployConfig) -> DeployConfig {
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(namespace: Option<&str>) -> Config {
        Config {
            namespace: namespace.map(str::to_string),
            api_base: "http://gw".to_string(),
        }
    }

    #[test]
    fn test_unset_namespace_keeps_environment_value() {
        let mut deploy = DeployConfig::new("/src");
        deploy.namespace = "from-xcoding-namespace".to_string();

        let scoped = config(None).scope_deploy(deploy);
        assert_eq!(scoped.namespace, "from-xcoding-namespace");

        let observer = config(None).scope_observer(ObserverConfig::new("from-pod-namespace"));
        assert_eq!(observer.namespace, "from-pod-namespace");
    }

    #[test]
    fn test_explicit_namespace_wins() {
        let scoped = config(Some("ci")).scope_deploy(DeployConfig::new("/src"));
        assert_eq!(scoped.namespace, "ci");

        let observer = config(Some("ci")).scope_observer(ObserverConfig::new("xcoding"));
        assert_eq!(observer.namespace, "ci");
    }
}
