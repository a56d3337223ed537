//! Job housekeeping commands

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use std::process::ExitCode;
use std::sync::Arc;
use xcoding_deploy::{JobCleaner, SystemRunner};

use crate::config::Config;

/// Jobs subcommands
#[derive(Subcommand)]
pub enum JobsCommands {
    /// Delete every Job and CronJob in the namespace
    Clear {
        /// Only list what would be deleted
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the namespace's jobs
    Show,
}

pub async fn handle_jobs_command(command: JobsCommands, config: &Config) -> Result<ExitCode> {
    let namespace = config.deploy_config()?.namespace;
    let cleaner = JobCleaner::new(namespace.clone(), Arc::new(SystemRunner::new()));

    match command {
        JobsCommands::Show => {
            cleaner.show().await?;
            Ok(ExitCode::SUCCESS)
        }
        JobsCommands::Clear { dry_run } => {
            let report = cleaner
                .dry_run(dry_run)
                .clear_all()
                .await
                .with_context(|| format!("failed to clear jobs in {}", namespace))?;

            if report.total == 0 {
                println!("{}", "No jobs found.".yellow());
                return Ok(ExitCode::SUCCESS);
            }

            println!(
                "{} {}/{} deleted",
                if report.is_clean() { "✓".green() } else { "✗".red() },
                report.succeeded,
                report.total
            );
            if report.is_clean() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
