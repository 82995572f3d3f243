//! # ferrio-harness
//!
//! Conformance harness for the ferrio I/O runtime: a scenario set
//! exercising the statement contract end-to-end, a runner, and a
//! JSONL structured-log schema shared by test and CI workflows.

use thiserror::Error;

pub mod fixtures;
pub mod runner;
pub mod structured_log;

pub use fixtures::{Scenario, scenarios};
pub use runner::{Runner, VerificationResult};

/// Harness-level failures (scenario failures are data, not errors).
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("log I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("log serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("log schema violation: {0}")]
    Schema(String),
}
