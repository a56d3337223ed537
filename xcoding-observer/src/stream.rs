//! Budgeted log relay
//!
//! Wraps a [`LogSource`] and ends the sequence when the source closes or
//! when the stream has gone quiet past its wall-clock budget.

use std::time::Duration;
use tokio::time::{Instant, timeout};
use tracing::{debug, warn};
use xcoding_core::domain::job::ExecutionUnitRef;
use xcoding_core::domain::log::LogLine;

use crate::error::ObserveError;
use crate::orchestrator::LogSource;

/// Why a log stream ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// The container terminated and the connection closed
    Closed,
    /// No line arrived within an idle slice after the budget ran out
    BudgetExhausted { elapsed: Duration },
    /// The connection dropped before the container finished
    Interrupted { reason: String },
}

/// A finite, non-restartable sequence of log lines from one container
pub struct LogStream {
    unit: ExecutionUnitRef,
    source: Option<Box<dyn LogSource>>,
    started: Instant,
    budget: Duration,
    idle_slice: Duration,
    relayed: usize,
    end: Option<StreamEnd>,
}

impl LogStream {
    /// Starts relaying from `source`; the budget clock starts now
    pub fn new(
        unit: ExecutionUnitRef,
        source: Box<dyn LogSource>,
        budget: Duration,
        idle_slice: Duration,
    ) -> Self {
        Self {
            unit,
            source: Some(source),
            started: Instant::now(),
            budget,
            idle_slice,
            relayed: 0,
            end: None,
        }
    }

    /// Returns the next line, or `None` once the stream has ended
    ///
    /// After `None` the reason is available from [`LogStream::end`].
    pub async fn next_line(&mut self) -> Option<LogLine> {
        loop {
            let source = self.source.as_mut()?;

            match timeout(self.idle_slice, source.next_line()).await {
                Ok(Ok(Some(text))) => {
                    self.relayed += 1;
                    return Some(LogLine::observed(text));
                }
                Ok(Ok(None)) => {
                    debug!("Log stream of {} closed", self.unit);
                    self.finish(StreamEnd::Closed);
                    return None;
                }
                Ok(Err(e)) => {
                    warn!("Log stream of {} interrupted: {}", self.unit, e);
                    self.finish(StreamEnd::Interrupted {
                        reason: e.to_string(),
                    });
                    return None;
                }
                Err(_) => {
                    let elapsed = self.started.elapsed();
                    if elapsed > self.budget {
                        debug!(
                            "Log stream of {} idle past budget ({:?}), closing",
                            self.unit, elapsed
                        );
                        self.finish(StreamEnd::BudgetExhausted { elapsed });
                        return None;
                    }
                }
            }
        }
    }

    /// Drains the stream into `sink`, returning how it ended
    pub async fn relay<F>(&mut self, mut sink: F) -> StreamEnd
    where
        F: FnMut(&LogLine),
    {
        while let Some(line) = self.next_line().await {
            sink(&line);
        }
        self.end.clone().unwrap_or(StreamEnd::Closed)
    }

    /// Closes the connection early; lines already relayed are unaffected
    pub fn cancel(&mut self) {
        if self.source.is_some() {
            self.finish(StreamEnd::Interrupted {
                reason: "cancelled by caller".to_string(),
            });
        }
    }

    pub fn unit(&self) -> &ExecutionUnitRef {
        &self.unit
    }

    /// Number of lines produced so far
    pub fn relayed(&self) -> usize {
        self.relayed
    }

    pub fn end(&self) -> Option<&StreamEnd> {
        self.end.as_ref()
    }

    /// The interruption as an error value, if the stream was interrupted
    pub fn interruption(&self) -> Option<ObserveError> {
        match &self.end {
            Some(StreamEnd::Interrupted { reason }) => Some(ObserveError::StreamInterrupted {
                unit: self.unit.to_string(),
                reason: reason.clone(),
            }),
            _ => None,
        }
    }

    fn finish(&mut self, end: StreamEnd) {
        // dropping the source closes the connection
        self.source = None;
        self.end = Some(end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OrchestratorError, OrchestratorResult};
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// Emits scripted lines, then either closes, errors or hangs forever
    struct ScriptedSource {
        lines: VecDeque<String>,
        tail: Tail,
    }

    enum Tail {
        Close,
        Fail,
        Hang,
    }

    impl ScriptedSource {
        fn boxed(lines: &[&str], tail: Tail) -> Box<dyn LogSource> {
            Box::new(Self {
                lines: lines.iter().map(|s| s.to_string()).collect(),
                tail,
            })
        }
    }

    #[async_trait]
    impl LogSource for ScriptedSource {
        async fn next_line(&mut self) -> OrchestratorResult<Option<String>> {
            if let Some(line) = self.lines.pop_front() {
                return Ok(Some(line));
            }
            match self.tail {
                Tail::Close => Ok(None),
                Tail::Fail => Err(OrchestratorError::CommandFailed {
                    command: "kubectl logs".into(),
                    code: Some(1),
                    stderr: "connection reset".into(),
                }),
                Tail::Hang => std::future::pending().await,
            }
        }
    }

    fn stream(source: Box<dyn LogSource>, budget: Duration) -> LogStream {
        LogStream::new(
            ExecutionUnitRef::new("build-1-job-1-x"),
            source,
            budget,
            Duration::from_millis(200),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_relays_lines_in_order_until_close() {
        let mut s = stream(
            ScriptedSource::boxed(&["a", "b", "c"], Tail::Close),
            Duration::from_secs(40),
        );

        let mut seen = Vec::new();
        let end = s.relay(|line| seen.push(line.text.clone())).await;

        assert_eq!(seen, vec!["a", "b", "c"]);
        assert_eq!(end, StreamEnd::Closed);
        assert_eq!(s.relayed(), 3);
        assert!(s.next_line().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_stream_stops_after_budget() {
        let budget = Duration::from_secs(40);
        let idle = Duration::from_millis(200);
        let start = Instant::now();

        let mut s = stream(ScriptedSource::boxed(&["only"], Tail::Hang), budget);
        let mut count = 0;
        let end = s.relay(|_| count += 1).await;

        let elapsed = start.elapsed();
        assert_eq!(count, 1);
        assert!(matches!(end, StreamEnd::BudgetExhausted { .. }));
        assert!(elapsed > budget);
        assert!(elapsed <= budget + idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interruption_keeps_relayed_lines() {
        let mut s = stream(
            ScriptedSource::boxed(&["one", "two"], Tail::Fail),
            Duration::from_secs(40),
        );

        let mut seen = Vec::new();
        let end = s.relay(|line| seen.push(line.text.clone())).await;

        assert_eq!(seen, vec!["one", "two"]);
        assert!(matches!(end, StreamEnd::Interrupted { .. }));
        assert!(matches!(
            s.interruption(),
            Some(ObserveError::StreamInterrupted { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_closes_stream() {
        let mut s = stream(
            ScriptedSource::boxed(&["one", "two"], Tail::Hang),
            Duration::from_secs(40),
        );

        assert_eq!(s.next_line().await.map(|l| l.text), Some("one".to_string()));
        s.cancel();
        assert!(s.next_line().await.is_none());
        assert_eq!(s.relayed(), 1);
    }
}
