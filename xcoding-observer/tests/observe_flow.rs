//! End-to-end observation against a scripted orchestrator

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use xcoding_core::domain::job::JobIdentifier;
use xcoding_core::domain::unit::UnitStatus;
use xcoding_observer::error::OrchestratorResult;
use xcoding_observer::{
    JobLogObserver, LogSource, ObserveError, Orchestrator, ObserverConfig, Readiness, StreamEnd,
};

const UNIT: &str = "build-166-job-1";

struct ScriptedCluster {
    appears_on_attempt: u32,
    lines: Vec<&'static str>,
    label_calls: AtomicU32,
    describe_calls: AtomicU32,
}

impl ScriptedCluster {
    fn new(appears_on_attempt: u32, lines: Vec<&'static str>) -> Self {
        Self {
            appears_on_attempt,
            lines,
            label_calls: AtomicU32::new(0),
            describe_calls: AtomicU32::new(0),
        }
    }
}

struct FiniteSource(VecDeque<String>);

#[async_trait]
impl LogSource for FiniteSource {
    async fn next_line(&mut self) -> OrchestratorResult<Option<String>> {
        Ok(self.0.pop_front())
    }
}

#[async_trait]
impl Orchestrator for ScriptedCluster {
    async fn list_units(
        &self,
        _namespace: &str,
        label_selector: Option<&str>,
    ) -> OrchestratorResult<Vec<String>> {
        match label_selector {
            Some(selector) => {
                assert_eq!(selector, "job-name=build-166-job-1");
                let n = self.label_calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n >= self.appears_on_attempt {
                    Ok(vec![UNIT.to_string()])
                } else {
                    Ok(Vec::new())
                }
            }
            None => Ok(vec!["ci-executor-5f7c9".to_string()]),
        }
    }

    async fn describe_unit(&self, _namespace: &str, unit: &str) -> OrchestratorResult<UnitStatus> {
        assert_eq!(unit, UNIT);
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        Ok(UnitStatus::from_json(
            r#"{"status": {"containerStatuses": [
                {"name": "runner", "ready": true, "state": {"running": {"startedAt": "now"}}}
            ]}}"#,
        )
        .unwrap())
    }

    async fn follow_logs(
        &self,
        _namespace: &str,
        unit: &str,
        container: &str,
    ) -> OrchestratorResult<Box<dyn LogSource>> {
        assert_eq!(unit, UNIT);
        assert_eq!(container, "runner");
        Ok(Box::new(FiniteSource(
            self.lines.iter().map(|s| s.to_string()).collect(),
        )))
    }
}

#[tokio::test(start_paused = true)]
async fn observes_build_from_discovery_to_eof() {
    let lines = vec![
        "2025-01-01T00:00:01Z step 1/2 github_action_demo",
        "2025-01-01T00:00:02Z action error: manifest not found",
        "2025-01-01T00:00:03Z step 2/2 echo hello",
        "2025-01-01T00:00:04Z Hello1234",
        "2025-01-01T00:00:05Z done",
    ];
    let cluster = Arc::new(ScriptedCluster::new(3, lines.clone()));
    let observer = JobLogObserver::new(cluster.clone(), ObserverConfig::new("xcoding"));

    let mut received = Vec::new();
    let mut hints = Vec::new();
    let report = observer
        .observe(&JobIdentifier::new("166"), |line| {
            received.push(line.text.clone());
            if let Some(hint) = line.hint() {
                hints.push(hint.to_string());
            }
        })
        .await
        .unwrap();

    assert_eq!(cluster.label_calls.load(Ordering::SeqCst), 3);
    assert_eq!(cluster.describe_calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.unit.name(), UNIT);
    assert_eq!(report.readiness, Readiness::Ready { checks: 1 });
    assert_eq!(received, lines);
    assert_eq!(report.lines, 5);
    assert_eq!(report.end, StreamEnd::Closed);
    assert!(report.warnings.is_empty());
    assert_eq!(hints.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn reports_not_found_when_unit_never_appears() {
    let cluster = Arc::new(ScriptedCluster::new(u32::MAX, Vec::new()));
    let mut config = ObserverConfig::new("xcoding");
    config.max_attempts = 60;
    let observer = JobLogObserver::new(cluster.clone(), config);

    let mut received = 0;
    let err = observer
        .observe(&JobIdentifier::new("166"), |_| received += 1)
        .await
        .unwrap_err();

    assert!(matches!(err, ObserveError::DiscoveryFailed { attempts: 60, .. }));
    assert!(err.is_fatal());
    assert_eq!(cluster.label_calls.load(Ordering::SeqCst), 60);
    assert_eq!(cluster.describe_calls.load(Ordering::SeqCst), 0);
    assert_eq!(received, 0);
}
