//! Job log observer
//!
//! Drives one observation of a job:
//!
//! ```text
//! DISCOVERING --(match)--> READY_WAIT --(ready | timeout)--> STREAMING --(eof | budget)--> DONE
//! DISCOVERING --(attempts exhausted)--> NOT_FOUND
//! ```
//!
//! Each call owns its timers and opens its own orchestrator queries; nothing
//! is shared between observations of different jobs.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};
use xcoding_core::domain::job::{ExecutionUnitRef, JobIdentifier};
use xcoding_core::domain::log::LogLine;

use crate::config::ObserverConfig;
use crate::error::{ObserveError, OrchestratorError};
use crate::orchestrator::Orchestrator;
use crate::stream::{LogStream, StreamEnd};

/// Label key the executor puts on every job unit
pub const JOB_NAME_LABEL: &str = "job-name";

/// Phase of an observation, used for progress reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservePhase {
    Discovering,
    ReadyWait,
    Streaming,
    Done,
    NotFound,
}

impl std::fmt::Display for ObservePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Discovering => "DISCOVERING",
            Self::ReadyWait => "READY_WAIT",
            Self::Streaming => "STREAMING",
            Self::Done => "DONE",
            Self::NotFound => "NOT_FOUND",
        };
        f.write_str(name)
    }
}

/// Outcome of waiting for the target container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready { checks: u32 },
    TimedOut { waited: Duration },
}

/// Summary of a completed observation
#[derive(Debug)]
pub struct ObserveReport {
    pub unit: ExecutionUnitRef,
    pub readiness: Readiness,
    pub lines: usize,
    pub end: StreamEnd,
    /// Non-fatal problems met along the way
    pub warnings: Vec<ObserveError>,
}

/// Result of a single discovery attempt
#[derive(Debug)]
enum Lookup {
    Match(String),
    Miss,
    HardError(OrchestratorError),
}

/// Locates a job's unit and relays its container output
pub struct JobLogObserver {
    orchestrator: Arc<dyn Orchestrator>,
    config: ObserverConfig,
}

impl JobLogObserver {
    pub fn new(orchestrator: Arc<dyn Orchestrator>, config: ObserverConfig) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    /// Label value identifying the unit of `job_id`
    pub fn unit_label(&self, job_id: &JobIdentifier) -> String {
        job_id.unit_label(&self.config.job_prefix, &self.config.task_name)
    }

    /// Resolves a job to the unit running it
    ///
    /// Polls up to `max_attempts` times, sleeping `poll_interval` between
    /// attempts. Each attempt tries the label selector first and falls back
    /// to a name-prefix scan of the full listing.
    ///
    /// # Errors
    /// - `DiscoveryFailed` when no attempt produced a match
    /// - `Orchestrator` when fail-fast is configured and that many
    ///   consecutive attempts failed outright
    pub async fn discover(&self, job_id: &JobIdentifier) -> Result<ExecutionUnitRef, ObserveError> {
        let label = self.unit_label(job_id);
        let max_attempts = self.config.max_attempts;
        let mut consecutive_errors = 0u32;

        info!("Looking up unit with {}={}", JOB_NAME_LABEL, label);

        for attempt in 1..=max_attempts {
            match self.lookup_once(&label).await {
                Lookup::Match(name) => {
                    info!("Found unit {} (attempt {}/{})", name, attempt, max_attempts);
                    return Ok(ExecutionUnitRef::new(name));
                }
                Lookup::Miss => {
                    consecutive_errors = 0;
                    debug!("No unit yet for {} (attempt {}/{})", label, attempt, max_attempts);
                }
                Lookup::HardError(e) => {
                    consecutive_errors += 1;
                    warn!(
                        "Unit lookup failed (attempt {}/{}): {}",
                        attempt, max_attempts, e
                    );
                    if let Some(limit) = self.config.max_consecutive_errors {
                        if consecutive_errors >= limit {
                            return Err(ObserveError::Orchestrator(e));
                        }
                    }
                }
            }

            if attempt < max_attempts {
                time::sleep(self.config.poll_interval).await;
            }
        }

        Err(ObserveError::DiscoveryFailed {
            label,
            attempts: max_attempts,
        })
    }

    /// One discovery attempt: label selector, then prefix fallback
    async fn lookup_once(&self, label: &str) -> Lookup {
        let namespace = &self.config.namespace;
        let selector = format!("{}={}", JOB_NAME_LABEL, label);

        let selector_failed = match self.orchestrator.list_units(namespace, Some(&selector)).await {
            Ok(names) => {
                if let Some(name) = first_name(names.iter()) {
                    return Lookup::Match(name);
                }
                false
            }
            Err(e) => {
                debug!("Label lookup failed: {}", e);
                true
            }
        };

        match self.orchestrator.list_units(namespace, None).await {
            Ok(names) => {
                match first_name(names.iter().filter(|n| n.trim().starts_with(label))) {
                    Some(name) => {
                        debug!("Unit {} matched by name prefix", name);
                        Lookup::Match(name)
                    }
                    None => Lookup::Miss,
                }
            }
            // only a hard error when neither lookup got an answer
            Err(e) if selector_failed => Lookup::HardError(e),
            Err(e) => {
                debug!("Fallback listing failed: {}", e);
                Lookup::Miss
            }
        }
    }

    /// Waits until the target container is running or reports ready
    ///
    /// Checks every `readiness_interval` until `readiness_timeout`. Failed
    /// status queries count as "not ready yet".
    pub async fn await_readable(&self, unit: &ExecutionUnitRef) -> Readiness {
        let container = &self.config.container;
        let timeout = self.config.readiness_timeout;
        let started = Instant::now();
        let mut checks = 0u32;

        loop {
            checks += 1;
            match self
                .orchestrator
                .describe_unit(&self.config.namespace, unit.name())
                .await
            {
                Ok(status) if status.is_readable(container) => {
                    debug!("Container {} of {} is readable", container, unit);
                    return Readiness::Ready { checks };
                }
                Ok(_) => debug!("Container {} of {} not ready yet", container, unit),
                Err(e) => debug!("Status of {} unavailable: {}", unit, e),
            }

            let waited = started.elapsed();
            if waited >= timeout {
                return Readiness::TimedOut { waited };
            }
            time::sleep(self.config.readiness_interval.min(timeout - waited)).await;
        }
    }

    /// Opens the follow-mode log stream of the target container
    ///
    /// # Errors
    /// `StreamInterrupted` when the connection cannot be opened.
    pub async fn stream(&self, unit: &ExecutionUnitRef) -> Result<LogStream, ObserveError> {
        let source = self
            .orchestrator
            .follow_logs(&self.config.namespace, unit.name(), &self.config.container)
            .await
            .map_err(|e| ObserveError::StreamInterrupted {
                unit: unit.to_string(),
                reason: e.to_string(),
            })?;

        Ok(LogStream::new(
            unit.clone(),
            source,
            self.config.stream_budget,
            self.config.idle_slice,
        ))
    }

    /// Runs a full observation, handing every line to `sink`
    ///
    /// Only discovery failures are returned as errors; readiness timeouts
    /// and stream interruptions end up in [`ObserveReport::warnings`].
    pub async fn observe<F>(
        &self,
        job_id: &JobIdentifier,
        mut sink: F,
    ) -> Result<ObserveReport, ObserveError>
    where
        F: FnMut(&LogLine),
    {
        info!(job = %job_id, phase = %ObservePhase::Discovering, "Observing job");
        let unit = match self.discover(job_id).await {
            Ok(unit) => unit,
            Err(e) => {
                info!(job = %job_id, phase = %ObservePhase::NotFound, "{}", e);
                return Err(e);
            }
        };

        let mut warnings = Vec::new();

        info!(job = %job_id, unit = %unit, phase = %ObservePhase::ReadyWait, "Waiting for container");
        let readiness = self.await_readable(&unit).await;
        if let Readiness::TimedOut { waited } = readiness {
            let warning = ObserveError::ReadinessTimedOut {
                unit: unit.to_string(),
                container: self.config.container.clone(),
                waited,
            };
            warn!("{}; streaming anyway", warning);
            warnings.push(warning);
        }

        info!(job = %job_id, unit = %unit, phase = %ObservePhase::Streaming, "Following logs");
        let (lines, end) = match self.stream(&unit).await {
            Ok(mut stream) => {
                let end = stream.relay(&mut sink).await;
                if let Some(interruption) = stream.interruption() {
                    warnings.push(interruption);
                }
                (stream.relayed(), end)
            }
            Err(e) => {
                warn!("{}", e);
                let reason = e.to_string();
                warnings.push(e);
                (0, StreamEnd::Interrupted { reason })
            }
        };

        info!(job = %job_id, unit = %unit, phase = %ObservePhase::Done, lines, "Observation finished");
        Ok(ObserveReport {
            unit,
            readiness,
            lines,
            end,
            warnings,
        })
    }
}

fn first_name<'a>(mut names: impl Iterator<Item = &'a String>) -> Option<String> {
    names
        .find(|n| !n.trim().is_empty())
        .map(|n| n.trim().to_string())
}
