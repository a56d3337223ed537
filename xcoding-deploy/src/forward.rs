//! Local port forwards to in-cluster services

use tracing::info;

use crate::error::Result;
use crate::runner::{Cmd, CommandRunner};

/// One `kubectl port-forward` target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortForward {
    pub service: &'static str,
    pub local: u16,
    pub remote: u16,
}

impl PortForward {
    pub fn command(&self, namespace: &str) -> Cmd {
        Cmd::new("kubectl").args([
            "port-forward".to_string(),
            format!("service/{}", self.service),
            "--address=localhost".to_string(),
            format!("{}:{}", self.local, self.remote),
            format!("--namespace={}", namespace),
        ])
    }
}

pub const DEFAULT_FORWARDS: &[PortForward] = &[
    PortForward {
        service: "postgresql",
        local: 5432,
        remote: 5432,
    },
    PortForward {
        service: "docker-registry",
        local: 31500,
        remote: 5000,
    },
    PortForward {
        service: "apisix-gateway",
        local: 31080,
        remote: 80,
    },
    PortForward {
        service: "rabbitmq",
        local: 5672,
        remote: 5672,
    },
    PortForward {
        service: "rabbitmq",
        local: 15672,
        remote: 15672,
    },
];

/// Starts every forward in the background
///
/// The processes are detached and keep running after this returns.
pub fn start_all(
    runner: &dyn CommandRunner,
    namespace: &str,
    forwards: &[PortForward],
) -> Result<Vec<Option<u32>>> {
    forwards
        .iter()
        .map(|forward| {
            let pid = runner.spawn_detached(&forward.command(namespace))?;
            info!(
                "Forwarding localhost:{} -> service/{}:{}",
                forward.local, forward.service, forward.remote
            );
            Ok(pid)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::RecordingRunner;

    #[test]
    fn test_forward_command() {
        let cmd = DEFAULT_FORWARDS[1].command("xcoding");
        assert_eq!(
            cmd.to_string(),
            "kubectl port-forward service/docker-registry --address=localhost 31500:5000 --namespace=xcoding"
        );
    }

    #[test]
    fn test_start_all_spawns_each_forward() {
        let runner = RecordingRunner::new();
        let pids = start_all(&runner, "xcoding", DEFAULT_FORWARDS).unwrap();

        assert_eq!(pids.len(), 5);
        let calls = runner.calls();
        assert_eq!(calls.iter().filter(|c| c.contains("service/rabbitmq")).count(), 2);
    }
}
