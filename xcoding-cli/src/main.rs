//! XCoding operator CLI
//!
//! Deploys the XCoding services, triggers CI builds and follows the logs
//! of the jobs they start.

mod commands;
mod config;

use clap::Parser;
use colored::*;
use commands::{Commands, handle_command};
use config::Config;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "xcoding")]
#[command(about = "XCoding deployment and CI diagnostics", long_about = None)]
struct Cli {
    /// Kubernetes namespace [default: xcoding; deploy commands fall back to XCODING_NAMESPACE]
    #[arg(long, global = true, env = "POD_NAMESPACE")]
    namespace: Option<String>,

    /// API gateway base URL
    #[arg(
        long,
        global = true,
        env = "XCODING_API_BASE",
        default_value = xcoding_client::DEFAULT_API_BASE
    )]
    api_base: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the relayed job output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "xcoding=info,xcoding_observer=info,xcoding_deploy=info,xcoding_client=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        namespace: cli.namespace,
        api_base: cli.api_base,
    };

    match handle_command(cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
