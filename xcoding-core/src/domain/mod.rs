//! Core domain types
//!
//! These types describe the things the operator tooling observes on the
//! cluster: the job a build was scheduled as, the unit (pod) that runs it,
//! its container status and the log lines it produces.

pub mod job;
pub mod log;
pub mod unit;
