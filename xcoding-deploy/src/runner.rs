//! External command execution
//!
//! Deploy routines only describe commands; a [`CommandRunner`] executes them.
//! [`SystemRunner`] spawns real processes, tests swap in a recorder.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{DeployError, Result};

/// A command line to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmd {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }
        command
    }
}

impl std::fmt::Display for Cmd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Executes external commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs a command with inherited stdio and returns its exit code
    async fn run(&self, cmd: &Cmd) -> Result<i32>;

    /// Runs a command and captures its output
    async fn capture(&self, cmd: &Cmd) -> Result<CommandOutput>;

    /// Starts a command that outlives the caller; returns its pid if known
    fn spawn_detached(&self, cmd: &Cmd) -> Result<Option<u32>>;
}

/// Runs commands as real OS processes
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

fn spawn_error(cmd: &Cmd, source: std::io::Error) -> DeployError {
    DeployError::Spawn {
        command: cmd.to_string(),
        source,
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, cmd: &Cmd) -> Result<i32> {
        info!("$ {}", cmd);
        let status = cmd
            .to_command()
            .status()
            .await
            .map_err(|e| spawn_error(cmd, e))?;
        Ok(status.code().unwrap_or(-1))
    }

    async fn capture(&self, cmd: &Cmd) -> Result<CommandOutput> {
        debug!("$ {}", cmd);
        let output = cmd
            .to_command()
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| spawn_error(cmd, e))?;

        Ok(CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn spawn_detached(&self, cmd: &Cmd) -> Result<Option<u32>> {
        info!("$ {} &", cmd);
        let mut command = cmd.to_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        #[cfg(unix)]
        command.process_group(0);

        // the child keeps running after its handle is dropped
        let child = command.spawn().map_err(|e| spawn_error(cmd, e))?;
        Ok(child.id())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording runner for deploy tests

    use super::*;
    use std::sync::Mutex;

    /// Records every command and answers from a rule table
    #[derive(Default)]
    pub struct RecordingRunner {
        pub calls: Mutex<Vec<String>>,
        /// (command prefix, exit code, stdout) - first matching prefix wins
        rules: Vec<(String, i32, String)>,
    }

    impl RecordingRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn on(mut self, prefix: &str, code: i32, stdout: &str) -> Self {
            self.rules
                .push((prefix.to_string(), code, stdout.to_string()));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn answer(&self, cmd: &Cmd) -> CommandOutput {
            let line = cmd.to_string();
            self.calls.lock().unwrap().push(line.clone());
            self.rules
                .iter()
                .find(|(prefix, _, _)| line.starts_with(prefix.as_str()))
                .map(|(_, code, stdout)| CommandOutput {
                    code: *code,
                    stdout: stdout.clone(),
                    stderr: String::new(),
                })
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, cmd: &Cmd) -> Result<i32> {
            Ok(self.answer(cmd).code)
        }

        async fn capture(&self, cmd: &Cmd) -> Result<CommandOutput> {
            Ok(self.answer(cmd))
        }

        fn spawn_detached(&self, cmd: &Cmd) -> Result<Option<u32>> {
            self.answer(cmd);
            Ok(None)
        }
    }
}
