//! Resource-allocation analysis core.
//!
//! This crate provides:
//! - [`SystemState`]: allocation, maximum-demand, request and available-unit
//!   tables for a fixed number of processes and resource types.
//! - [`check_safety`]: Banker's Algorithm safety classification with a
//!   deterministic safe sequence.
//! - [`detect`]: simple-cycle search over the resource-allocation graph.
//! - [`recover`]: victim selection and resource reclamation after a
//!   detected deadlock.
//! - [`SharedState`]: a lock-guarded wrapper for callers that share one
//!   state between threads.
//!
//! Every analysis returns a structured result; formatting is left to the
//! caller.

#![deny(unsafe_code)]

pub mod detect;
pub mod error;
pub mod graph;
pub mod matrix;
pub mod recovery;
pub mod safety;
pub mod shared;
pub mod state;

pub use detect::{DeadlockReport, detect};
pub use error::{InvariantWarning, ToolkitError};
pub use graph::{Edge, EdgeKind, Node, ResourceGraph};
pub use matrix::{Matrix, Units};
pub use recovery::{RecoveryAction, RecoveryOutcome, recover, select_victim};
pub use safety::{SafetyReport, SafetyStep, check_safety};
pub use shared::SharedState;
pub use state::SystemState;
