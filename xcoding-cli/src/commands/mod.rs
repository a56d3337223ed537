//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod deploy;
pub mod jobs;
mod observe;
mod test_run;

pub use deploy::DeployArgs;
pub use jobs::JobsCommands;
pub use observe::ObserveArgs;
pub use test_run::TestRunArgs;

use anyhow::Result;
use clap::Subcommand;
use std::process::ExitCode;

use crate::config::Config;

/// Exit code when the job's unit never showed up
pub const EXIT_NOT_FOUND: u8 = 3;

/// Exit code when the build could not be submitted
pub const EXIT_SUBMIT_FAILED: u8 = 2;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Follow the logs of a running CI job
    Observe(ObserveArgs),
    /// Deploy the executor, trigger a diagnostic build and follow it
    TestRun(TestRunArgs),
    /// Deploy a single service
    Deploy(DeployArgs),
    /// Deploy all backend services
    DeployAll,
    /// Job housekeeping
    Jobs {
        #[command(subcommand)]
        command: JobsCommands,
    },
    /// Forward local ports to in-cluster services
    Forward,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module and returns the
/// process exit code.
pub async fn handle_command(command: Commands, config: &Config) -> Result<ExitCode> {
    match command {
        Commands::Observe(args) => observe::handle_observe(args, config).await,
        Commands::TestRun(args) => test_run::handle_test_run(args, config).await,
        Commands::Deploy(args) => deploy::handle_deploy(args, config).await,
        Commands::DeployAll => deploy::handle_deploy_all(config).await,
        Commands::Jobs { command } => jobs::handle_jobs_command(command, config).await,
        Commands::Forward => deploy::handle_forward(config),
    }
}
