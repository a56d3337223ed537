//! XCoding Core
//!
//! Core types shared by the XCoding operator tooling.
//!
//! This crate contains:
//! - Domain types: job identifiers, execution units, log lines, unit status
//! - DTOs: payloads exchanged with the CI pipeline API
//! - Workflow rendering for diagnostic pipeline runs

pub mod domain;
pub mod dto;
pub mod workflow;
