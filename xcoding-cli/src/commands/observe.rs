//! Job log observation
//!
//! Relays a job's log lines to stdout and prints a hint under every line
//! that carries a known failure marker.

use anyhow::Result;
use clap::Args;
use colored::*;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use xcoding_core::domain::job::JobIdentifier;
use xcoding_core::domain::log::LogLine;
use xcoding_observer::{
    JobLogObserver, KubectlOrchestrator, ObserveError, ObserveReport, ObserverConfig, Readiness,
    StreamEnd,
};

use super::EXIT_NOT_FOUND;
use crate::config::Config;

#[derive(Args)]
pub struct ObserveArgs {
    /// Job (build) id
    pub job_id: String,

    /// Task segment of the unit label
    #[arg(long, default_value = "job-1")]
    pub task: String,

    /// Container whose logs are followed [default: runner, or XCODING_CONTAINER]
    #[arg(long)]
    pub container: Option<String>,

    /// Streaming budget in seconds [default: 40, or XCODING_STREAM_BUDGET]
    #[arg(long)]
    pub budget: Option<u64>,

    /// Give up discovery after this many consecutive cluster errors
    #[arg(long)]
    pub fail_fast_errors: Option<u32>,
}

impl ObserveArgs {
    /// Layers the flags that were given over `base`
    fn apply(&self, mut base: ObserverConfig) -> ObserverConfig {
        base = base.with_task(self.task.clone());
        if let Some(container) = &self.container {
            base = base.with_container(container.clone());
        }
        if let Some(secs) = self.budget {
            base = base.with_stream_budget(Duration::from_secs(secs));
        }
        if let Some(n) = self.fail_fast_errors {
            base = base.with_fail_fast(n);
        }
        base
    }
}

pub async fn handle_observe(args: ObserveArgs, config: &Config) -> Result<ExitCode> {
    let observer = kubectl_observer(args.apply(config.observer_config()))?;
    run_observer(&observer, &JobIdentifier::new(args.job_id)).await
}

/// Validates `config` and wires it to the `kubectl` orchestrator
pub fn kubectl_observer(config: ObserverConfig) -> Result<JobLogObserver> {
    config.validate()?;
    Ok(JobLogObserver::new(Arc::new(KubectlOrchestrator::new()), config))
}

/// Observes `job_id` until the stream ends or Ctrl-C is pressed
pub async fn run_observer(observer: &JobLogObserver, job_id: &JobIdentifier) -> Result<ExitCode> {
    let outcome = tokio::select! {
        outcome = observer.observe(job_id, print_line) => outcome,
        _ = tokio::signal::ctrl_c() => {
            // dropping the observation kills the log follower
            println!("{}", "Interrupted.".yellow());
            return Ok(ExitCode::from(130));
        }
    };

    match outcome {
        Ok(report) => {
            print_summary(&report);
            Ok(ExitCode::SUCCESS)
        }
        Err(e @ ObserveError::DiscoveryFailed { .. }) => {
            eprintln!("{} {}", "✗".red(), e);
            Ok(ExitCode::from(EXIT_NOT_FOUND))
        }
        Err(e) => Err(e.into()),
    }
}

fn print_line(line: &LogLine) {
    println!("{}", line.text);
    if let Some(hint) = line.hint() {
        println!("{} {}", "[hint]".yellow().bold(), hint);
    }
}

fn print_summary(report: &ObserveReport) {
    println!("{}", "─".repeat(80).dimmed());

    if let Readiness::TimedOut { waited } = report.readiness {
        println!(
            "{} container not ready after {}s, streamed anyway",
            "⚠".yellow(),
            waited.as_secs()
        );
    }

    let end = match &report.end {
        StreamEnd::Closed => "stream closed".to_string(),
        StreamEnd::BudgetExhausted { elapsed } => {
            format!("budget exhausted after {}s", elapsed.as_secs())
        }
        StreamEnd::Interrupted { reason } => format!("interrupted: {}", reason),
    };
    println!(
        "{} {} line(s) from {} ({})",
        "▸".cyan(),
        report.lines,
        report.unit.to_string().bold(),
        end
    );

    for warning in &report.warnings {
        warn!("{}", warning);
    }
}
