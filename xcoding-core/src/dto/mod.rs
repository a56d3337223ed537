//! Data Transfer Objects
//!
//! Request and response payloads for the CI pipeline service API.

pub mod build;
pub mod pipeline;
