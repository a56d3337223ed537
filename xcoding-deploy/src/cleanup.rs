//! Job cleanup
//!
//! Removes leftover build Jobs, CronJobs and their pods from a namespace.

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{DeployError, Result};
use crate::runner::{Cmd, CommandRunner};

/// Tally of a cleanup run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Job,
    CronJob,
}

impl Kind {
    fn plural(self) -> &'static str {
        match self {
            Kind::Job => "jobs",
            Kind::CronJob => "cronjobs",
        }
    }

    fn singular(self) -> &'static str {
        match self {
            Kind::Job => "job",
            Kind::CronJob => "cronjob",
        }
    }
}

pub struct JobCleaner {
    namespace: String,
    dry_run: bool,
    runner: Arc<dyn CommandRunner>,
}

impl JobCleaner {
    pub fn new(namespace: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            namespace: namespace.into(),
            dry_run: false,
            runner,
        }
    }

    /// Only report what would be deleted
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Deletes every Job and CronJob, then the pods they left behind
    pub async fn clear_all(&self) -> Result<CleanupReport> {
        self.ensure_namespace().await?;

        let jobs = self.list(Kind::Job).await?;
        let cronjobs = self.list(Kind::CronJob).await?;
        info!(
            "Found {} jobs and {} cronjobs in {}",
            jobs.len(),
            cronjobs.len(),
            self.namespace
        );

        let mut report = CleanupReport {
            total: jobs.len() + cronjobs.len(),
            ..Default::default()
        };
        if report.total == 0 {
            return Ok(report);
        }

        let targets = jobs
            .iter()
            .map(|name| (Kind::Job, name))
            .chain(cronjobs.iter().map(|name| (Kind::CronJob, name)));
        for (kind, name) in targets {
            if self.delete(kind, name).await? {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
        }

        self.delete_job_pods().await?;
        Ok(report)
    }

    /// Prints the namespace's jobs, cronjobs and job pods
    pub async fn show(&self) -> Result<()> {
        self.ensure_namespace().await?;
        let ns = self.namespace.as_str();

        for cmd in [
            Cmd::new("kubectl").args(["get", "jobs", "-n", ns]),
            Cmd::new("kubectl").args(["get", "cronjobs", "-n", ns]),
            Cmd::new("kubectl").args(["get", "pods", "-n", ns, "-l", "job-name"]),
        ] {
            self.runner.run(&cmd).await?;
        }
        Ok(())
    }

    async fn ensure_namespace(&self) -> Result<()> {
        let probe = self
            .runner
            .capture(&Cmd::new("kubectl").args(["get", "namespace", self.namespace.as_str()]))
            .await?;
        if !probe.success() {
            return Err(DeployError::NamespaceNotFound(self.namespace.clone()));
        }
        Ok(())
    }

    async fn list(&self, kind: Kind) -> Result<Vec<String>> {
        let cmd = Cmd::new("kubectl").args([
            "get",
            kind.plural(),
            "-n",
            self.namespace.as_str(),
            "-o",
            "jsonpath={.items[*].metadata.name}",
        ]);
        let output = self.runner.capture(&cmd).await?;
        if !output.success() {
            warn!("Listing {} failed: {}", kind.plural(), output.stderr.trim());
            return Err(DeployError::StepFailed {
                step: format!("kubectl get {}", kind.plural()),
                code: output.code,
            });
        }
        Ok(output.stdout.split_whitespace().map(str::to_string).collect())
    }

    async fn delete(&self, kind: Kind, name: &str) -> Result<bool> {
        if self.dry_run {
            info!("[dry run] would delete {} {}", kind.singular(), name);
            return Ok(true);
        }

        let cmd = Cmd::new("kubectl").args([
            "delete",
            kind.singular(),
            name,
            "-n",
            self.namespace.as_str(),
        ]);
        let output = self.runner.capture(&cmd).await?;
        if output.success() {
            info!("Deleted {} {}", kind.singular(), name);
        } else {
            warn!(
                "Deleting {} {} failed: {}",
                kind.singular(),
                name,
                output.stderr.trim()
            );
        }
        Ok(output.success())
    }

    async fn delete_job_pods(&self) -> Result<()> {
        if self.dry_run {
            info!("[dry run] would delete pods labelled job-name");
            return Ok(());
        }

        let cmd = Cmd::new("kubectl").args([
            "delete",
            "pods",
            "-n",
            self.namespace.as_str(),
            "-l",
            "job-name",
        ]);
        let output = self.runner.capture(&cmd).await?;
        if !output.success() {
            warn!("Deleting job pods failed: {}", output.stderr.trim());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::RecordingRunner;

    const LIST_JOBS: &str = "kubectl get jobs -n xcoding -o";
    const LIST_CRONJOBS: &str = "kubectl get cronjobs -n xcoding -o";

    #[tokio::test]
    async fn test_clear_all_deletes_everything() {
        let runner = Arc::new(
            RecordingRunner::new()
                .on(LIST_JOBS, 0, "build-1-job-1 build-2-job-1")
                .on(LIST_CRONJOBS, 0, "nightly")
                .on("kubectl delete job build-2-job-1", 1, ""),
        );
        let cleaner = JobCleaner::new("xcoding", runner.clone());

        let report = cleaner.clear_all().await.unwrap();

        assert_eq!(
            report,
            CleanupReport {
                total: 3,
                succeeded: 2,
                failed: 1
            }
        );
        assert!(!report.is_clean());
        let calls = runner.calls();
        assert!(calls.contains(&"kubectl delete cronjob nightly -n xcoding".to_string()));
        assert_eq!(
            calls.last().unwrap(),
            "kubectl delete pods -n xcoding -l job-name"
        );
    }

    #[tokio::test]
    async fn test_dry_run_deletes_nothing() {
        let runner = Arc::new(RecordingRunner::new().on(LIST_JOBS, 0, "build-1-job-1"));
        let cleaner = JobCleaner::new("xcoding", runner.clone()).dry_run(true);

        let report = cleaner.clear_all().await.unwrap();

        assert_eq!(report.total, 1);
        assert!(report.is_clean());
        assert!(!runner.calls().iter().any(|c| c.contains("delete")));
    }

    #[tokio::test]
    async fn test_empty_namespace_is_clean() {
        let runner = Arc::new(RecordingRunner::new());
        let report = JobCleaner::new("xcoding", runner.clone())
            .clear_all()
            .await
            .unwrap();

        assert_eq!(report, CleanupReport::default());
        assert_eq!(runner.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_namespace() {
        let runner = Arc::new(RecordingRunner::new().on("kubectl get namespace", 1, ""));
        let err = JobCleaner::new("ghost", runner)
            .clear_all()
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::NamespaceNotFound(ns) if ns == "ghost"));
    }
}
