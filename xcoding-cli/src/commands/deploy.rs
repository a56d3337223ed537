//! Deployment command handlers

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use colored::*;
use std::process::ExitCode;
use std::sync::Arc;
use xcoding_deploy::forward::{self, DEFAULT_FORWARDS};
use xcoding_deploy::{Deployer, ImageTag, ServiceSpec, SystemRunner};

use crate::config::Config;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DeployAction {
    Deploy,
    Status,
    Logs,
}

#[derive(Args)]
pub struct DeployArgs {
    /// Service name (user, project, code-repository, artifact, ci-pipeline, ci-executor, frontend)
    pub service: String,

    /// Image tag (random when omitted)
    #[arg(long)]
    pub tag: Option<String>,

    /// Build the image without pushing it
    #[arg(long)]
    pub no_push: bool,

    #[arg(long, value_enum, default_value_t = DeployAction::Deploy)]
    pub action: DeployAction,
}

fn deployer(config: &Config, push: bool) -> Result<Deployer> {
    let mut deploy_config = config.deploy_config()?;
    deploy_config.push = push;
    Ok(Deployer::new(deploy_config, Arc::new(SystemRunner::new())))
}

pub async fn handle_deploy(args: DeployArgs, config: &Config) -> Result<ExitCode> {
    let spec = match ServiceSpec::find(&args.service) {
        Ok(spec) => spec,
        Err(e) => bail!("{} (known: {})", e, ServiceSpec::names().join(", ")),
    };
    let deployer = deployer(config, !args.no_push)?;

    match args.action {
        DeployAction::Deploy => {
            let tag = args.tag.map(ImageTag::new).unwrap_or_else(ImageTag::generate);
            let action = deployer
                .deploy(spec, &tag)
                .await
                .with_context(|| format!("failed to deploy {}", spec.name))?;
            println!(
                "{} {} deployed with tag {} ({:?})",
                "✓".green(),
                spec.name.bold(),
                tag,
                action
            );
        }
        DeployAction::Status => deployer.status(spec).await,
        DeployAction::Logs => deployer.logs(spec).await,
    }

    Ok(ExitCode::SUCCESS)
}

pub async fn handle_deploy_all(config: &Config) -> Result<ExitCode> {
    let summary = deployer(config, true)?.deploy_all().await;

    println!("{}", "─".repeat(80).dimmed());
    for name in &summary.succeeded {
        println!("  {} {}", "✓".green(), name);
    }
    for (name, error) in &summary.failed {
        println!("  {} {}: {}", "✗".red(), name, error);
    }

    if summary.is_success() {
        println!("{}", "All services deployed.".green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "{}",
            format!("{} service(s) failed.", summary.failed.len()).red().bold()
        );
        Ok(ExitCode::FAILURE)
    }
}

pub fn handle_forward(config: &Config) -> Result<ExitCode> {
    let namespace = config.deploy_config()?.namespace;
    let pids = forward::start_all(&SystemRunner::new(), &namespace, DEFAULT_FORWARDS)?;

    for (forward, pid) in DEFAULT_FORWARDS.iter().zip(pids) {
        let pid = pid.map(|p| p.to_string()).unwrap_or_else(|| "?".to_string());
        println!(
            "  {} localhost:{} → service/{}:{} (pid {})",
            "▸".cyan(),
            forward.local,
            forward.service,
            forward.remote,
            pid.dimmed()
        );
    }
    Ok(ExitCode::SUCCESS)
}
