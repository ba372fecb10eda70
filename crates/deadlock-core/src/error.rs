//! Error taxonomy for state construction and loading.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matrix::Units;

/// Errors reported synchronously by [`SystemState`](crate::SystemState)
/// constructors and mutators. A failed call never leaves state half-updated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolkitError {
    /// Non-positive process or resource count at construction.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// A supplied matrix or vector does not match the state's shape.
    #[error("dimension mismatch in {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        found: usize,
    },
    /// A process id outside `0..num_processes`.
    #[error("process {process} out of range (num_processes = {num_processes})")]
    ProcessOutOfRange { process: usize, num_processes: usize },
    /// `available[r] + Σ allocation[p][r]` does not fit in [`Units`].
    #[error("R{resource} totals {total} units, more than the supported {max}")]
    CapacityOverflow { resource: usize, total: u64, max: Units },
}

/// Non-fatal report of `allocation[p][r] > max_demand[p][r]`.
///
/// Safety results computed while any of these are present are not
/// meaningful; the values are kept as given and never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantWarning {
    pub process: usize,
    pub resource: usize,
    pub allocation: Units,
    pub max_demand: Units,
}

impl std::fmt::Display for InvariantWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "P{} holds {} units of R{} but declared a maximum of {}",
            self.process, self.allocation, self.resource, self.max_demand
        )
    }
}
