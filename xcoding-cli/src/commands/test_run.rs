//! Remote action diagnostics
//!
//! Redeploys the executor, optionally swaps the pipeline's workflow for the
//! diagnostic one, triggers a build and follows its first job.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use std::process::ExitCode;
use std::sync::Arc;
use xcoding_client::{CallerIdentity, CiClient, JobSubmitter};
use xcoding_core::workflow::{DIAGNOSTIC_TASK, remote_action_workflow};
use xcoding_deploy::{Deployer, ImageTag, ServiceSpec, SystemRunner};
use xcoding_observer::JobLogObserver;

use super::EXIT_SUBMIT_FAILED;
use super::observe::{kubectl_observer, run_observer};
use crate::config::Config;

/// Service redeployed before each run
const EXECUTOR_SERVICE: &str = "ci-executor";

#[derive(Args)]
pub struct TestRunArgs {
    /// Use the executor that is already deployed
    #[arg(long)]
    pub skip_deploy: bool,

    /// Replace the pipeline's workflow with the diagnostic one first
    #[arg(long)]
    pub update_yaml: bool,

    /// Action reference for the diagnostic step (owner/repo[/path]@ref)
    #[arg(long, default_value = "RuningBird/actions-test@v1")]
    pub uses_ref: String,

    #[arg(long, default_value_t = 166)]
    pub pipeline_id: i64,

    /// User the build is triggered as
    #[arg(long, default_value_t = 1067)]
    pub user_id: i64,

    #[arg(long, default_value = "user2")]
    pub username: String,
}

pub async fn handle_test_run(args: TestRunArgs, config: &Config) -> Result<ExitCode> {
    if !args.skip_deploy {
        deploy_executor(config)
            .await
            .context("failed to deploy the executor")?;
    }

    let client = CiClient::new(
        &config.api_base,
        CallerIdentity::new(args.user_id, args.username),
    );

    if args.update_yaml {
        let yaml = remote_action_workflow(&args.uses_ref);
        println!(
            "{} Updating workflow of pipeline {} (uses: {})",
            "▸".cyan(),
            args.pipeline_id,
            args.uses_ref
        );
        if let Err(e) = client.update_pipeline_yaml(args.pipeline_id, yaml).await {
            eprintln!("{} Failed to update workflow: {}", "✗".red(), e);
            return Ok(ExitCode::from(EXIT_SUBMIT_FAILED));
        }
    }

    let observer = kubectl_observer(config.observer_config().with_task(DIAGNOSTIC_TASK))?;
    trigger_and_observe(&client, &observer, args.pipeline_id).await
}

/// Submits a run of `pipeline_id` and follows the job it started
pub async fn trigger_and_observe(
    submitter: &dyn JobSubmitter,
    observer: &JobLogObserver,
    pipeline_id: i64,
) -> Result<ExitCode> {
    let job_id = match submitter.submit(pipeline_id).await {
        Ok(job_id) => job_id,
        Err(e) => {
            eprintln!("{} Failed to trigger build: {}", "✗".red(), e);
            return Ok(ExitCode::from(EXIT_SUBMIT_FAILED));
        }
    };
    println!("{} Triggered build {}", "✓".green(), job_id.to_string().bold());

    run_observer(observer, &job_id).await
}

async fn deploy_executor(config: &Config) -> Result<()> {
    let deploy_config = config.deploy_config()?;

    let spec = ServiceSpec::find(EXECUTOR_SERVICE)?;
    let tag = ImageTag::timestamp();
    println!("{} Deploying {} ({})", "▸".cyan(), spec.name, tag);

    Deployer::new(deploy_config, Arc::new(SystemRunner::new()))
        .deploy(spec, &tag)
        .await?;
    Ok(())
}
