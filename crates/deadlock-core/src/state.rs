//! The allocation state every analysis reads.

use serde::Serialize;

use crate::error::{InvariantWarning, ToolkitError};
use crate::matrix::{Matrix, Units};

/// Allocation, maximum-demand, request and available tables for a fixed
/// number of processes and resource types.
///
/// The shape `(num_processes, num_resources)` is fixed at construction.
/// `available + Σ allocation` per resource always fits in [`Units`] and is
/// preserved by recovery; see [`SystemState::total_units`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemState {
    num_processes: usize,
    num_resources: usize,
    allocation: Matrix,
    max_demand: Matrix,
    request: Matrix,
    available: Vec<Units>,
}

impl SystemState {
    /// Create an all-zero state.
    ///
    /// Both counts must be positive.
    pub fn new(num_processes: usize, num_resources: usize) -> Result<Self, ToolkitError> {
        if num_processes == 0 {
            return Err(ToolkitError::Configuration(
                "num_processes must be positive".to_string(),
            ));
        }
        if num_resources == 0 {
            return Err(ToolkitError::Configuration(
                "num_resources must be positive".to_string(),
            ));
        }
        Ok(Self::zeroed(num_processes, num_resources))
    }

    pub(crate) fn zeroed(num_processes: usize, num_resources: usize) -> Self {
        Self {
            num_processes,
            num_resources,
            allocation: Matrix::zeros(num_processes, num_resources),
            max_demand: Matrix::zeros(num_processes, num_resources),
            request: Matrix::zeros(num_processes, num_resources),
            available: vec![0; num_resources],
        }
    }

    /// Overwrite allocation, max demand and available units; reset requests.
    ///
    /// All shapes, and each resource's total against [`Units::MAX`], are
    /// checked before anything is written. Returns the cells where allocation
    /// exceeds declared maximum demand; they are loaded unchanged.
    pub fn set_initial_state(
        &mut self,
        allocation: &[Vec<Units>],
        max_demand: &[Vec<Units>],
        available: &[Units],
    ) -> Result<Vec<InvariantWarning>, ToolkitError> {
        let (p, r) = (self.num_processes, self.num_resources);
        let allocation = Matrix::from_rows("allocation", allocation, p, r)?;
        let max_demand = Matrix::from_rows("max_demand", max_demand, p, r)?;
        if available.len() != r {
            return Err(ToolkitError::DimensionMismatch {
                what: "available".to_string(),
                expected: r,
                found: available.len(),
            });
        }
        for (resource, &free) in available.iter().enumerate() {
            let total = u64::from(free) + allocation.column_sum(resource);
            if total > u64::from(Units::MAX) {
                return Err(ToolkitError::CapacityOverflow {
                    resource,
                    total,
                    max: Units::MAX,
                });
            }
        }

        self.allocation = allocation;
        self.max_demand = max_demand;
        self.available = available.to_vec();
        self.request = Matrix::zeros(p, r);
        Ok(self.invariant_warnings())
    }

    /// Replace process `process`'s request row.
    ///
    /// Requests are not checked against remaining need.
    pub fn set_request(&mut self, process: usize, units: &[Units]) -> Result<(), ToolkitError> {
        if process >= self.num_processes {
            return Err(ToolkitError::ProcessOutOfRange {
                process,
                num_processes: self.num_processes,
            });
        }
        if units.len() != self.num_resources {
            return Err(ToolkitError::DimensionMismatch {
                what: format!("request for P{process}"),
                expected: self.num_resources,
                found: units.len(),
            });
        }
        self.request.row_mut(process).copy_from_slice(units);
        Ok(())
    }

    /// Zero every request row.
    pub fn clear_requests(&mut self) {
        self.request = Matrix::zeros(self.num_processes, self.num_resources);
    }

    #[must_use]
    pub fn num_processes(&self) -> usize {
        self.num_processes
    }

    #[must_use]
    pub fn num_resources(&self) -> usize {
        self.num_resources
    }

    #[must_use]
    pub fn allocation(&self) -> &Matrix {
        &self.allocation
    }

    #[must_use]
    pub fn max_demand(&self) -> &Matrix {
        &self.max_demand
    }

    #[must_use]
    pub fn request(&self) -> &Matrix {
        &self.request
    }

    #[must_use]
    pub fn available(&self) -> &[Units] {
        &self.available
    }

    /// `max_demand - allocation` per cell. Negative when the invariant is
    /// violated.
    #[must_use]
    pub fn need(&self) -> Vec<Vec<i64>> {
        self.allocation
            .iter_rows()
            .zip(self.max_demand.iter_rows())
            .map(|(alloc, max)| {
                alloc
                    .iter()
                    .zip(max)
                    .map(|(&a, &m)| i64::from(m) - i64::from(a))
                    .collect()
            })
            .collect()
    }

    /// `available[r] + Σ_p allocation[p][r]` for every resource.
    #[must_use]
    pub fn total_units(&self) -> Vec<u64> {
        (0..self.num_resources)
            .map(|r| u64::from(self.available[r]) + self.allocation.column_sum(r))
            .collect()
    }

    /// Every cell where allocation exceeds declared maximum demand.
    #[must_use]
    pub fn invariant_warnings(&self) -> Vec<InvariantWarning> {
        let mut warnings = Vec::new();
        for p in 0..self.num_processes {
            for r in 0..self.num_resources {
                let allocation = self.allocation.get(p, r);
                let max_demand = self.max_demand.get(p, r);
                if allocation > max_demand {
                    warnings.push(InvariantWarning {
                        process: p,
                        resource: r,
                        allocation,
                        max_demand,
                    });
                }
            }
        }
        warnings
    }

    /// Credit `process`'s allocation back to `available` and zero its row.
    /// Returns the released row.
    ///
    /// Cannot overflow: the load caps each resource's total at `Units::MAX`.
    pub(crate) fn release_allocation(&mut self, process: usize) -> Vec<Units> {
        let released = self.allocation.row(process).to_vec();
        for (slot, &units) in self.available.iter_mut().zip(&released) {
            *slot += units;
        }
        self.allocation.row_mut(process).fill(0);
        released
    }
}
