//! kubectl-backed orchestrator
//!
//! Implements [`Orchestrator`] by shelling out to `kubectl`:
//! - Unit listing via `get pods -o custom-columns`
//! - Unit status via `get pod -o json`
//! - Log following via `logs --follow --timestamps`
//!
//! Every query spawns its own process; only the log follower is long-lived,
//! and it is killed as soon as its [`LogSource`] is dropped.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use xcoding_core::domain::unit::UnitStatus;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::orchestrator::{LogSource, Orchestrator};

/// Orchestrator that drives the cluster through the `kubectl` CLI
#[derive(Debug, Clone)]
pub struct KubectlOrchestrator {
    binary: String,
}

impl KubectlOrchestrator {
    /// Uses `kubectl` from `PATH`
    pub fn new() -> Self {
        Self::with_binary("kubectl")
    }

    /// Uses a specific kubectl executable
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn render(&self, args: &[String]) -> String {
        format!("{} {}", self.binary, args.join(" "))
    }

    /// Runs kubectl to completion and returns its stdout
    async fn capture(&self, args: Vec<String>) -> OrchestratorResult<String> {
        let command = self.render(&args);
        debug!("$ {}", command);

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| OrchestratorError::Spawn {
                command: command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(OrchestratorError::CommandFailed {
                command,
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        if !stderr.trim().is_empty() {
            debug!("{} stderr: {}", command, stderr.trim());
        }

        Ok(stdout)
    }
}

impl Default for KubectlOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Arguments for listing unit names, one per line
pub fn list_units_args(namespace: &str, label_selector: Option<&str>) -> Vec<String> {
    let mut args = vec![
        "get".to_string(),
        "pods".to_string(),
        "-n".to_string(),
        namespace.to_string(),
    ];
    if let Some(selector) = label_selector {
        args.push("-l".to_string());
        args.push(selector.to_string());
    }
    args.extend([
        "-o".to_string(),
        "custom-columns=NAME:.metadata.name".to_string(),
        "--no-headers".to_string(),
    ]);
    args
}

/// Arguments for following one container's logs
pub fn follow_logs_args(namespace: &str, unit: &str, container: &str) -> Vec<String> {
    [
        "logs",
        unit,
        "-n",
        namespace,
        "-c",
        container,
        "--follow",
        "--timestamps",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Splits `custom-columns` output into names
pub fn parse_unit_names(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl Orchestrator for KubectlOrchestrator {
    async fn list_units(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> OrchestratorResult<Vec<String>> {
        let out = self
            .capture(list_units_args(namespace, label_selector))
            .await?;
        Ok(parse_unit_names(&out))
    }

    async fn describe_unit(&self, namespace: &str, unit: &str) -> OrchestratorResult<UnitStatus> {
        let args: Vec<String> = ["get", "pod", unit, "-n", namespace, "-o", "json"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let command = self.render(&args);
        let out = self.capture(args).await?;

        UnitStatus::from_json(&out).map_err(|e| OrchestratorError::Parse {
            command,
            reason: e.to_string(),
        })
    }

    async fn follow_logs(
        &self,
        namespace: &str,
        unit: &str,
        container: &str,
    ) -> OrchestratorResult<Box<dyn LogSource>> {
        let args = follow_logs_args(namespace, unit, container);
        let command = self.render(&args);
        debug!("$ {}", command);

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| OrchestratorError::Spawn {
                command: command.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| OrchestratorError::Spawn {
            command: command.clone(),
            source: std::io::Error::other("stdout not captured"),
        })?;

        // drain stderr concurrently so a chatty kubectl never blocks on a full pipe
        let stderr = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf).await;
                String::from_utf8_lossy(&buf).trim().to_string()
            })
        });

        Ok(Box::new(KubectlLogSource {
            command,
            child,
            stdout: BufReader::new(stdout),
            stderr,
            pending: Vec::new(),
        }))
    }
}

/// Line reader over a running `kubectl logs --follow`
struct KubectlLogSource {
    command: String,
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
    /// Bytes of a line not yet terminated; survives cancelled reads
    pending: Vec<u8>,
}

impl KubectlLogSource {
    /// Collects the exit status once stdout hit EOF
    async fn finish(&mut self) -> OrchestratorResult<Option<String>> {
        let status = self.child.wait().await?;
        // the slot is cleared only once the drain task resolved, so a
        // cancelled call leaves it in place for the retry
        let stderr = match self.stderr.as_mut() {
            Some(handle) => {
                let output = handle.await.unwrap_or_default();
                self.stderr = None;
                output
            }
            None => String::new(),
        };

        if status.success() {
            if !stderr.is_empty() {
                warn!("{} reported: {}", self.command, stderr);
            }
            return Ok(None);
        }

        Err(OrchestratorError::CommandFailed {
            command: self.command.clone(),
            code: status.code(),
            stderr,
        })
    }
}

#[async_trait]
impl LogSource for KubectlLogSource {
    async fn next_line(&mut self) -> OrchestratorResult<Option<String>> {
        let read = self.stdout.read_until(b'\n', &mut self.pending).await?;
        if read == 0 && self.pending.is_empty() {
            return self.finish().await;
        }

        let line = String::from_utf8_lossy(&self.pending)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        self.pending.clear();
        Ok(Some(line))
    }
}
