//! Scenario harness for deadlock-core.
//!
//! This crate provides:
//! - Scenario files: JSON state descriptions with optional expected results
//! - Configuration: invariant policy and log level from the environment
//! - Structured JSONL logging of every analysis step
//! - Reports: markdown and JSON renderings of analysis results
//! - DOT export of the resource-allocation graph
//! - Verification: compare scenario expectations against actual results

#![forbid(unsafe_code)]

pub mod config;
pub mod render;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod structured_log;
pub mod verify;

pub use config::{HarnessConfig, InvariantPolicy};
pub use report::AnalysisReport;
pub use runner::ScenarioRunner;
pub use scenario::{Scenario, ScenarioError, ScenarioFile};
pub use verify::{VerificationResult, VerificationSummary};
