//! Service deployment
//!
//! Runs the build → push → release → status sequence for one service.
//! A failing mandatory step aborts the deployment; the status and log
//! display steps are informational and never fail it.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::DeployConfig;
use crate::error::{DeployError, Result};
use crate::manifest;
use crate::runner::{Cmd, CommandRunner};
use crate::service::{DEPLOY_ALL_ORDER, ImageTag, ServiceSpec};

/// How the Helm release was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseAction {
    Install,
    Upgrade,
}

/// Outcome of deploying several services
#[derive(Debug, Default)]
pub struct DeploySummary {
    pub succeeded: Vec<&'static str>,
    pub failed: Vec<(&'static str, DeployError)>,
}

impl DeploySummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Deploys services with one shared configuration
pub struct Deployer {
    config: DeployConfig,
    runner: Arc<dyn CommandRunner>,
}

impl Deployer {
    pub fn new(config: DeployConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// Full deployment of one service at `tag`
    pub async fn deploy(&self, spec: &ServiceSpec, tag: &ImageTag) -> Result<ReleaseAction> {
        let image = spec.image_ref(&self.config, tag);
        info!("Deploying {} as {}", spec.name, image);

        manifest::apply(
            &self.config.chart_file(spec.manifest),
            spec.patch,
            &spec.repository(&self.config),
            tag,
        )?;

        self.build_image(spec, &image).await?;

        if self.config.push {
            self.push_image(&image).await?;
        } else {
            info!("Skipping push of {}", image);
        }

        self.ensure_namespace().await?;
        let action = self.apply_release().await?;

        self.status(spec).await;
        self.logs(spec).await;

        info!("Deployment of {} finished", spec.name);
        Ok(action)
    }

    /// Deploys the backend services one after another
    ///
    /// A failure is recorded and the remaining services are still deployed.
    pub async fn deploy_all(&self) -> DeploySummary {
        let mut summary = DeploySummary::default();

        for name in DEPLOY_ALL_ORDER {
            let spec = match ServiceSpec::find(name) {
                Ok(spec) => spec,
                Err(e) => {
                    summary.failed.push((*name, e));
                    continue;
                }
            };

            match self.deploy(spec, &ImageTag::generate()).await {
                Ok(_) => summary.succeeded.push(spec.name),
                Err(e) => {
                    error!("Deployment of {} failed: {}", spec.name, e);
                    summary.failed.push((spec.name, e));
                }
            }
        }

        summary
    }

    async fn build_image(&self, spec: &ServiceSpec, image: &str) -> Result<()> {
        let cmd = Cmd::new("docker")
            .args(["build", "-t", image, "-f", spec.dockerfile, "."])
            .current_dir(&self.config.project_root);
        self.required("docker build", &cmd).await
    }

    async fn push_image(&self, image: &str) -> Result<()> {
        let cmd = Cmd::new("docker").args(["push", image]);
        self.required("docker push", &cmd).await
    }

    /// Creates the namespace when it does not exist yet
    async fn ensure_namespace(&self) -> Result<()> {
        let ns = &self.config.namespace;
        let probe = self
            .runner
            .capture(&Cmd::new("kubectl").args(["get", "namespace", ns.as_str()]))
            .await?;

        if probe.success() {
            return Ok(());
        }

        info!("Namespace {} does not exist, creating it", ns);
        let create = Cmd::new("kubectl").args(["create", "namespace", ns.as_str()]);
        self.required("kubectl create namespace", &create).await
    }

    /// Installs the release, or upgrades it when it already exists
    async fn apply_release(&self) -> Result<ReleaseAction> {
        let release = self.config.release.as_str();
        let ns = self.config.namespace.as_str();
        let chart = self.config.chart_path().display().to_string();

        let status = self
            .runner
            .capture(&Cmd::new("helm").args(["status", release, "-n", ns]))
            .await?;

        let (action, verb) = if status.success() {
            (ReleaseAction::Upgrade, "upgrade")
        } else {
            (ReleaseAction::Install, "install")
        };
        info!("Running helm {} for release {}", verb, release);

        let cmd = Cmd::new("helm").args([verb, release, chart.as_str(), "-n", ns]);
        self.required(&format!("helm {}", verb), &cmd).await?;
        Ok(action)
    }

    /// Shows the service's pods and the namespace's services
    pub async fn status(&self, spec: &ServiceSpec) {
        let ns = self.config.namespace.as_str();
        let selector = spec.selector();

        self.informational(
            &Cmd::new("kubectl").args(["get", "pods", "-n", ns, "-l", selector.as_str()]),
        )
        .await;
        self.informational(&Cmd::new("kubectl").args(["get", "services", "-n", ns]))
            .await;
    }

    /// Shows the last log lines of the service's pods
    pub async fn logs(&self, spec: &ServiceSpec) {
        let selector = spec.selector();
        self.informational(&Cmd::new("kubectl").args([
            "logs",
            "-n",
            self.config.namespace.as_str(),
            "-l",
            selector.as_str(),
            "--tail=20",
        ]))
        .await;
    }

    async fn required(&self, step: &str, cmd: &Cmd) -> Result<()> {
        let code = self.runner.run(cmd).await?;
        if code != 0 {
            error!("{} failed with exit code {}", step, code);
            return Err(DeployError::StepFailed {
                step: step.to_string(),
                code,
            });
        }
        Ok(())
    }

    async fn informational(&self, cmd: &Cmd) {
        match self.runner.run(cmd).await {
            Ok(0) => {}
            Ok(code) => warn!("`{}` exited with {}", cmd, code),
            Err(e) => warn!("{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::RecordingRunner;
    use std::path::PathBuf;

    /// A project root with every catalog manifest in place
    fn scratch_project() -> PathBuf {
        let root =
            std::env::temp_dir().join(format!("xcoding-deployer-{}", uuid::Uuid::new_v4()));
        let config = DeployConfig::new(&root);
        for spec in crate::service::CATALOG {
            let path = config.chart_file(spec.manifest);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            let body = format!(
                "spec:\n  template:\n    spec:\n      containers:\n        - name: {}\n          image: old:1\n",
                match spec.patch {
                    crate::service::ManifestPatch::ContainerImage { container } => container,
                    _ => spec.name,
                }
            );
            std::fs::write(path, body).unwrap();
        }
        root
    }

    #[tokio::test]
    async fn test_deploy_installs_fresh_release() {
        let root = scratch_project();
        let runner = Arc::new(RecordingRunner::new().on("helm status", 1, ""));
        let deployer = Deployer::new(DeployConfig::new(&root), runner.clone());
        let spec = ServiceSpec::find("user").unwrap();

        let action = deployer.deploy(spec, &ImageTag::new("t1")).await.unwrap();

        assert_eq!(action, ReleaseAction::Install);
        let calls = runner.calls();
        assert_eq!(
            calls[0],
            "docker build -t localhost:31500/user-service:t1 -f apps/user/Dockerfile ."
        );
        assert_eq!(calls[1], "docker push localhost:31500/user-service:t1");
        assert_eq!(calls[2], "kubectl get namespace xcoding");
        assert_eq!(calls[3], "helm status xcoding -n xcoding");
        assert!(calls[4].starts_with("helm install xcoding "));
        assert!(calls.iter().any(|c| c.contains("--tail=20")));

        let manifest = std::fs::read_to_string(
            DeployConfig::new(&root).chart_file(spec.manifest),
        )
        .unwrap();
        assert!(manifest.contains("localhost:31500/user-service:t1"));
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_deploy_upgrades_and_skips_push() {
        let root = scratch_project();
        let runner = Arc::new(RecordingRunner::new());
        let mut config = DeployConfig::new(&root);
        config.push = false;
        let deployer = Deployer::new(config, runner.clone());

        let action = deployer
            .deploy(ServiceSpec::find("ci-executor").unwrap(), &ImageTag::new("t2"))
            .await
            .unwrap();

        assert_eq!(action, ReleaseAction::Upgrade);
        let calls = runner.calls();
        assert!(!calls.iter().any(|c| c.starts_with("docker push")));
        assert!(calls.iter().any(|c| c.starts_with("helm upgrade xcoding ")));
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_failed_build_aborts() {
        let root = scratch_project();
        let runner = Arc::new(RecordingRunner::new().on("docker build", 2, ""));
        let deployer = Deployer::new(DeployConfig::new(&root), runner.clone());

        let err = deployer
            .deploy(ServiceSpec::find("artifact").unwrap(), &ImageTag::new("t3"))
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::StepFailed { code: 2, .. }));
        assert_eq!(runner.calls().len(), 1);
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_missing_namespace_is_created() {
        let root = scratch_project();
        let runner = Arc::new(RecordingRunner::new().on("kubectl get namespace", 1, ""));
        let deployer = Deployer::new(DeployConfig::new(&root), runner.clone());

        deployer
            .deploy(ServiceSpec::find("project").unwrap(), &ImageTag::new("t4"))
            .await
            .unwrap();

        assert!(
            runner
                .calls()
                .contains(&"kubectl create namespace xcoding".to_string())
        );
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_deploy_all_continues_past_failures() {
        let root = scratch_project();
        let runner = Arc::new(
            RecordingRunner::new().on("docker build -t localhost:31500/project-service", 1, ""),
        );
        let deployer = Deployer::new(DeployConfig::new(&root), runner);

        let summary = deployer.deploy_all().await;

        assert!(!summary.is_success());
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "project");
        assert_eq!(
            summary.succeeded,
            vec!["user", "code-repository", "artifact", "ci-pipeline"]
        );
        std::fs::remove_dir_all(&root).unwrap();
    }
}
