//! XCoding Job Log Observer
//!
//! Follows a freshly triggered CI job on the cluster:
//! - Discovery: resolves the job id to the unit (pod) running it, polling a
//!   label query with a name-prefix fallback until it shows up
//! - Readiness: waits for the target container to run or report ready
//! - Streaming: relays the container's log lines within a time budget
//!
//! The cluster is reached through the [`Orchestrator`] trait;
//! [`KubectlOrchestrator`] implements it on top of the `kubectl` binary.

pub mod config;
pub mod error;
pub mod kubectl;
pub mod observer;
pub mod orchestrator;
pub mod stream;

pub use config::ObserverConfig;
pub use error::{ObserveError, OrchestratorError};
pub use kubectl::KubectlOrchestrator;
pub use observer::{JobLogObserver, ObservePhase, ObserveReport, Readiness};
pub use orchestrator::{LogSource, Orchestrator};
pub use stream::{LogStream, StreamEnd};
